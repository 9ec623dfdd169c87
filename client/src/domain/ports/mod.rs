//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports ([`HttpTransport`], [`TokenStorage`], [`SessionStore`]) are
//! implemented by outbound adapters. Driving ports ([`InteractionCommand`],
//! [`InteractionQuery`]) are implemented by the feature API wrappers and
//! consumed by the optimistic interaction service.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod interaction_command;
mod interaction_query;
mod session_store;
mod token_storage;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    HttpMethod, HttpTransport, HttpTransportError, TransportRequest, TransportResponse,
};
#[cfg(test)]
pub use interaction_command::MockInteractionCommand;
pub use interaction_command::InteractionCommand;
#[cfg(test)]
pub use interaction_query::MockInteractionQuery;
pub use interaction_query::InteractionQuery;
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::SessionStore;
#[cfg(test)]
pub use token_storage::MockTokenStorage;
pub use token_storage::{TokenStorage, TokenStorageError};
