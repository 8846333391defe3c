//! An in-process stand-in for the AnyFetch API.
//!
//! The server mounts one route per descriptor in the registry and answers
//! each from an embedded fixture. Responses can be replaced per endpoint,
//! before or after the server is started:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use anyfetch::mock_server::MockServer;
//! use anyfetch::Verb;
//!
//! let server = MockServer::new();
//! let handle = server.spawn().await?;
//! server.override_json(Verb::Get, "/status", serde_json::json!({"status": "down"}))?;
//! // requests against handle.url() now see the overridden status
//! server.restore_all();
//! # Ok(())
//! # }
//! ```

mod content;
mod overrides;
mod routes;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::descriptors::Verb;
use crate::errors::OverrideError;

use overrides::{Override, OverrideRegistry};
pub use overrides::OverrideHandler;

/// The request handed to a handler override.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: axum::http::Method,
    pub uri: axum::http::Uri,
    pub headers: axum::http::HeaderMap,
    pub body: axum::body::Bytes,
}

/// The mock API server. Cheap to construct; nothing listens until
/// [`MockServer::spawn`].
pub struct MockServer {
    overrides: Arc<OverrideRegistry>,
}

impl MockServer {
    pub fn new() -> Self {
        Self {
            overrides: Arc::new(OverrideRegistry::new()),
        }
    }

    /// Replace the stored response for `verb endpoint` with `content`.
    /// Any querystring in `endpoint` is ignored. Overriding `/batch` is
    /// refused, its answer is assembled from the other endpoints.
    pub fn override_json(
        &self,
        verb: Verb,
        endpoint: &str,
        content: Value,
    ) -> Result<(), OverrideError> {
        self.overrides
            .insert(verb, endpoint, Override::Content(content))
    }

    /// Like [`MockServer::override_json`], reading the content from a
    /// JSON file. The file is read once, at registration.
    pub fn override_file(
        &self,
        verb: Verb,
        endpoint: &str,
        file: impl AsRef<Path>,
    ) -> Result<(), OverrideError> {
        let file = file.as_ref();
        let raw = fs_err::read_to_string(file).map_err(|source| OverrideError::File {
            path: file.display().to_string(),
            source,
        })?;
        let content = serde_json::from_str(&raw).map_err(|source| OverrideError::FileFormat {
            path: file.display().to_string(),
            source,
        })?;
        self.override_json(verb, endpoint, content)
    }

    /// Give `handler` full control over `verb endpoint`: it receives the
    /// request and produces the entire response, no validation applied.
    pub fn override_handler<F>(
        &self,
        verb: Verb,
        endpoint: &str,
        handler: F,
    ) -> Result<(), OverrideError>
    where
        F: Fn(MockRequest) -> Response + Send + Sync + 'static,
    {
        self.overrides
            .insert(verb, endpoint, Override::Handler(Arc::new(handler)))
    }

    /// Put one endpoint back on its default fixture. Restoring an
    /// endpoint that was never overridden does nothing.
    pub fn restore(&self, verb: Verb, endpoint: &str) {
        self.overrides.remove(verb, endpoint);
    }

    /// Drop every override at once.
    pub fn restore_all(&self) {
        self.overrides.clear();
    }

    /// The axum router, for embedding into an existing server.
    pub fn router(&self) -> axum::Router {
        routes::build_router(Arc::clone(&self.overrides))
    }

    /// Start listening on an ephemeral localhost port. Overrides
    /// registered on `self` afterwards still apply to the running server.
    pub async fn spawn(&self) -> Result<MockServerHandle, std::io::Error> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("mock server stopped: {e}");
            }
        });
        tracing::info!(%addr, "mock server listening");
        Ok(MockServerHandle { addr, task })
    }
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

/// A running mock server. Dropping the handle stops it.
pub struct MockServerHandle {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL of the running server, e.g. `http://127.0.0.1:49152`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
