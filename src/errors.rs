//! Errors for this crate.

use reqwest::StatusCode;

/// Client-side validation failure, always naming the operation that was
/// being called so the message can be traced back to a mapping.
#[derive(thiserror::Error, Debug)]
pub enum ArgumentError {
    #[error("argument error in {operation}: the key {key} is not allowed in this request's body")]
    BodyKeyNotAllowed { operation: String, key: String },

    #[error("argument error in {operation}: the key {key} is not allowed in this request's GET parameters")]
    QueryKeyNotAllowed { operation: String, key: String },

    #[error("argument error in {operation}: this operation does not accept a body")]
    UnexpectedBody { operation: String },

    #[error("argument error in {operation}: this operation does not accept GET parameters")]
    UnexpectedParams { operation: String },

    #[error("argument error in {operation}: the body must be a JSON object")]
    BodyNotAnObject { operation: String },

    #[error("argument error in {operation}: the GET parameters must be a JSON object")]
    ParamsNotAnObject { operation: String },

    #[error("argument error in {operation}: the id must be a valid MongoDB ObjectId")]
    InvalidId { operation: String },

    #[error("argument error in {operation}: an identifier is required")]
    MissingIdentifier { operation: String },
}

/// Errors representing failed interactions with the AnyFetch API.
#[derive(thiserror::Error, Debug)]
pub enum AnyfetchError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error(transparent)]
    InvalidUrl(#[from] crate::types::InvalidApiUrl),

    /// Network-level failure, forwarded verbatim from the transport.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The server answered with a body that is not JSON.
    #[error("non-JSON response body (status {status})")]
    Decode {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    /// The manager refused the OAuth code exchange.
    #[error("token exchange returned status {status}: {body}")]
    TokenExchange { status: StatusCode, body: String },

    #[error("failed to read upload file")]
    Io(#[from] std::io::Error),
}

/// Errors raised when registering a mock-server override.
#[derive(thiserror::Error, Debug)]
pub enum OverrideError {
    /// `GET /batch` is synthesized from the other endpoints, so its
    /// response is not storable.
    #[error("cannot override /batch, override each aggregated endpoint individually")]
    BatchNotOverridable,

    #[error("failed to load override content from {path}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("override file {path} does not contain valid JSON")]
    FileFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
