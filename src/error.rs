use thiserror::Error;

/// Errors returned by ql-node client operations.
///
/// Every failure aborts the single call it belongs to; nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An argument failed a local constraint. No request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The ql-node answered with `success: false`.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The request did not produce a decodable ql-node envelope.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// Returns `true` when the call failed before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` when the ql-node rejected the request.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Returns `true` for connection, HTTP and decoding failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(TransportError::Request(error))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(error: serde_json::Error) -> Self {
        Self::Transport(TransportError::Json(error))
    }
}

/// A caller-supplied parameter violated its declared constraint.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("parameter '{parameter}' is not a string")]
    NotAString { parameter: String },

    #[error("parameter '{parameter}' is not a number")]
    NotANumber { parameter: String },

    #[error("parameter '{parameter}' (= {value}) is less than allowed minimum: {min}")]
    BelowMinimum {
        parameter: String,
        /// The offending number as the caller supplied it (after truncation
        /// when it fits an `i64`).
        value: String,
        min: i64,
    },

    #[error("parameter '{parameter}' (= {value}) is greater than allowed maximum: {max}")]
    AboveMaximum {
        parameter: String,
        value: String,
        max: i64,
    },

    #[error(
        "parameter '{parameter}' contains illegal characters, only trytes (A-Z,9) are allowed"
    )]
    IllegalTrytes { parameter: String },

    #[error("length of parameter '{parameter}' ({length}) is less than allowed minimum ({min})")]
    TooShort {
        parameter: String,
        length: usize,
        min: usize,
    },

    #[error("length of parameter '{parameter}' ({length}) is greater than allowed maximum ({max})")]
    TooLong {
        parameter: String,
        length: usize,
        max: usize,
    },

    #[error("parameter '{parameter}' is not an array")]
    NotAnArray { parameter: String },

    #[error("parameter '{parameter}' is not an object")]
    NotAnObject { parameter: String },

    #[error(
        "parameter '{parameter}' contains illegal characters, only alphanumeric characters (a-z, 0-9) are allowed"
    )]
    NotAlphanumeric { parameter: String },

    /// The command name is not part of the ql-node catalog.
    #[error("unknown ql-node command '{0}'")]
    UnknownCommand(String),

    /// A parameter without a default was not supplied.
    #[error("missing required parameter '{parameter}' for command '{command}'")]
    MissingParameter { command: String, parameter: String },

    /// A parameter name that the command does not accept.
    #[error("command '{command}' does not accept parameter '{parameter}'")]
    UnexpectedParameter { command: String, parameter: String },
}

impl ValidationError {
    /// Name of the offending parameter, when the failure concerns one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::NotAString { parameter }
            | Self::NotANumber { parameter }
            | Self::BelowMinimum { parameter, .. }
            | Self::AboveMaximum { parameter, .. }
            | Self::IllegalTrytes { parameter }
            | Self::TooShort { parameter, .. }
            | Self::TooLong { parameter, .. }
            | Self::NotAnArray { parameter }
            | Self::NotAnObject { parameter }
            | Self::NotAlphanumeric { parameter }
            | Self::MissingParameter { parameter, .. }
            | Self::UnexpectedParameter { parameter, .. } => Some(parameter),
            Self::UnknownCommand(_) => None,
        }
    }
}

/// The ql-node processed the request and reported a failure.
///
/// Displays the server-supplied `error` string verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
}

/// Failures below the ql-node envelope: URL, connection, HTTP and decoding.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Node URL is not a valid absolute URL.
    #[error("invalid ql-node URL '{0}'")]
    InvalidNodeUrl(String),

    /// HTTP transport-layer request failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body could not be parsed as JSON.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success HTTP status whose body is not a ql-node envelope.
    #[error("server returned status {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    /// JSON body that is not an object carrying a boolean `success` field.
    #[error("malformed ql-node response: {0}")]
    MalformedResponse(String),
}
