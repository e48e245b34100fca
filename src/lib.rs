//! Rust and Python-facing client library for the Qubic Lite ql-node API.
//!
//! Public API layers:
//! - [`BlockingQliteClient`]/[`QliteClient`]: one method per ql-node command.
//! - [`CommandKind`]/[`Request`]: the command catalog and the validating
//!   request builder shared by both clients.
//! - [`ClientError`]: validation, remote and transport failures.
//!
//! Every call validates its parameters locally, posts a single JSON request
//! with the `X-QLITE-API-Version` header and fails when the node answers
//! with `success: false`.

mod blocking_client;
mod client;
mod command;
mod error;
mod response;
mod transport;
pub mod validate;

/// Blocking ql-node client.
pub use blocking_client::BlockingQliteClient;
/// Async ql-node client.
pub use client::QliteClient;
/// Command catalog and request builder.
pub use command::{
    CommandKind, DEFAULT_MWM, DefaultValue, ID_LENGTH, INT_MAX, KEYWORD_MAX_LENGTH, ParamSpec,
    Request, Rule,
};
/// Error types returned by all client operations.
pub use error::{ClientError, RemoteError, TransportError, ValidationError};
/// Decoded ql-node response.
pub use response::Response;
pub use transport::{API_VERSION, API_VERSION_HEADER};

#[cfg(feature = "python")]
mod python;
