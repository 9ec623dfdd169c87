//! Authenticated client library for the Stride backend.
//!
//! - [`domain`]: credentials, the request pipeline with 401 recovery, and
//!   optimistic interaction state, all behind ports.
//! - [`outbound`]: reqwest transport and token storage adapters.
//! - [`api`]: typed wrappers per backend resource.
//! - [`config`]: OrthoConfig-backed settings.

pub mod api;
pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;
