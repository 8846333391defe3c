//! Client library for the [AnyFetch](https://anyfetch.com) document API.
//!
//! Every endpoint the API exposes is described once, in a descriptor
//! table. The same table drives three things:
//!
//! - [`AnyfetchClient`], whose named methods validate their arguments
//!   against the descriptors before any request goes out;
//! - [`DocumentScope`], calls pinned onto one document by id or
//!   identifier;
//! - [`mock_server::MockServer`], an in-process API double serving
//!   fixtures for every endpoint, with per-endpoint overrides for tests.

mod client;
mod config;
mod descriptors;
mod errors;
mod oauth;
mod requests;
mod scope;
mod types;

pub mod mock_server;

pub use client::{AnyfetchClient, ApiResponse, Credentials};
pub use config::{api_url, manager_url, DEFAULT_API_URL, DEFAULT_MANAGER_URL, OAUTH_ENDPOINT};
pub use descriptors::{endpoint_filename, registry, Descriptor, Operation, Registry, Verb};
pub use errors::{AnyfetchError, ArgumentError, OverrideError};
pub use oauth::get_access_token;
pub use requests::{CallArgs, ResolvedRequest};
pub use scope::{DocumentScope, FileUpload};
pub use types::{encode_identifier, is_mongo_id, ApiUrl, ApiUrlRef, InvalidApiUrl};
