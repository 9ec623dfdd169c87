//! Authentication inputs: login credentials and registration details.
//!
//! Constructors validate raw strings before any request is built, so the
//! auth wrapper never sends a payload the backend would reject on shape
//! alone. Passwords are zeroised on drop.

use std::fmt;

use zeroize::Zeroizing;

/// Domain error returned when login or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Email did not look like `local@domain`.
    InvalidEmail,
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must look like name@domain"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

fn normalise_email(raw: &str) -> Result<String, LoginValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(LoginValidationError::EmptyEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_owned()),
        _ => Err(LoginValidationError::InvalidEmail),
    }
}

fn require_password(raw: &str) -> Result<Zeroizing<String>, LoginValidationError> {
    if raw.is_empty() {
        return Err(LoginValidationError::EmptyPassword);
    }
    Ok(Zeroizing::new(raw.to_owned()))
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and has a non-empty local part and domain.
/// - `password` is non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.com ", "pw").expect("valid");
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "pw");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        Ok(Self {
            email: normalise_email(email)?,
            password: require_password(password)?,
        })
    }

    /// Normalised email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated account registration details.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    credentials: LoginCredentials,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Registration {
    /// Construct registration details from raw inputs.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, LoginValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        Ok(Self {
            username: username.to_owned(),
            credentials: LoginCredentials::try_from_parts(email, password)?,
        })
    }

    /// Trimmed display username.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Credentials the account will log in with.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("ada", "pw", LoginValidationError::InvalidEmail)]
    #[case("@example.com", "pw", LoginValidationError::InvalidEmail)]
    #[case("ada@", "pw", LoginValidationError::InvalidEmail)]
    #[case("ada@example.com", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  ada@example.com  ", "secret")]
    #[case("bob@stride.app", " correct horse battery staple ")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[test]
    fn debug_output_redacts_password() {
        let creds = LoginCredentials::try_from_parts("ada@example.com", "hunter2").expect("valid");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"), "debug leaked: {rendered}");
    }

    #[rstest]
    #[case("", "ada@example.com", "pw", LoginValidationError::EmptyUsername)]
    #[case("ada", "not-an-email", "pw", LoginValidationError::InvalidEmail)]
    fn invalid_registration(
        #[case] username: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        assert_eq!(
            Registration::try_from_parts(username, email, password).expect_err("invalid"),
            expected
        );
    }

    #[test]
    fn registration_trims_username() {
        let registration =
            Registration::try_from_parts("  ada ", "ada@example.com", "pw").expect("valid");
        assert_eq!(registration.username(), "ada");
        assert_eq!(registration.credentials().email(), "ada@example.com");
    }
}
