//! Response payloads and envelope normalisation.
//!
//! Backend endpoints are inconsistent about wrapping: some answer
//! `{"data": X}`, some `{"data": {"data": X}}`, some return `X` bare.
//! [`unwrap_envelope`] is the one place that knowledge lives; feature
//! wrappers never unwrap by hand.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::ApiError;

const DATA_KEY: &str = "data";

/// Successful response body as returned by [`crate::domain::ApiClient::request`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiPayload {
    /// Body of a response whose content type announced JSON.
    Json(Value),
    /// Raw body of any other response.
    Text(String),
}

impl ApiPayload {
    /// Borrow the JSON value, if this payload is JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// Borrow the text body, if this payload is not JSON.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Normalise the envelope and deserialise its contents.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Decode`] for text payloads or when the unwrapped
    /// value does not match `T`.
    ///
    /// # Examples
    /// ```
    /// use client::domain::ApiPayload;
    /// use serde_json::json;
    ///
    /// let payload = ApiPayload::Json(json!({ "data": { "data": [1, 2, 3] } }));
    /// let numbers: Vec<u32> = payload.into_data().expect("decodes");
    /// assert_eq!(numbers, vec![1, 2, 3]);
    /// ```
    pub fn into_data<T>(self) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        match self {
            Self::Json(value) => serde_json::from_value(unwrap_envelope(value))
                .map_err(|error| ApiError::decode(format!("unexpected payload shape: {error}"))),
            Self::Text(text) => Err(ApiError::decode(format!(
                "expected a JSON payload, received text ({} bytes)",
                text.len()
            ))),
        }
    }
}

/// Strip up to two levels of `data` wrapping.
///
/// Only objects whose `data` member is present are unwrapped; any other value
/// is returned unchanged.
pub fn unwrap_envelope(value: Value) -> Value {
    let once = unwrap_once(value);
    match once {
        Ok(inner) => unwrap_once(inner).unwrap_or_else(|unchanged| unchanged),
        Err(unchanged) => unchanged,
    }
}

fn unwrap_once(value: Value) -> Result<Value, Value> {
    match value {
        Value::Object(mut map) if map.contains_key(DATA_KEY) => {
            Ok(map.remove(DATA_KEY).unwrap_or(Value::Null))
        }
        other => Err(other),
    }
}
