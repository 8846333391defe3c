//! The AnyFetch API client.

use std::time::Duration;

use serde_json::{json, Value};

use crate::config;
use crate::descriptors::{registry, Descriptor};
use crate::errors::{AnyfetchError, ArgumentError};
use crate::requests::{resolve, CallArgs, ResolvedRequest};
use crate::scope::{DocumentScope, ScopeKey};
use crate::types::{is_mongo_id, ApiUrl};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How the client authenticates against the API.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// OAuth bearer token.
    Bearer(String),
    /// Login and password, for the endpoints which accept Basic auth.
    Basic { login: String, password: String },
}

/// Status and parsed JSON body of an API response.
///
/// The status is returned as-is. A descriptor's expected status is
/// documentation of the happy path, not something the client enforces.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: reqwest::StatusCode,
    pub body: Value,
}

/// A client for one AnyFetch API server.
pub struct AnyfetchClient {
    http: reqwest::Client,
    api_url: ApiUrl,
    credentials: Credentials,
}

impl AnyfetchClient {
    pub fn new(api_url: ApiUrl, credentials: Credentials) -> Result<Self, AnyfetchError> {
        let http = reqwest::ClientBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_url,
            credentials,
        })
    }

    /// Client pointed at `ANYFETCH_API_URL`, or the production API when
    /// the variable is unset.
    pub fn from_env(credentials: Credentials) -> Result<Self, AnyfetchError> {
        Self::new(config::api_url()?, credentials)
    }

    pub fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }

    /// Perform `operation` by name. Named methods below all come through
    /// here; the name is also how aliases are reached.
    pub async fn call(&self, operation: &str, args: CallArgs) -> Result<ApiResponse, AnyfetchError> {
        let op = registry()
            .get(operation)
            .ok_or_else(|| AnyfetchError::UnknownOperation(operation.to_string()))?;
        self.call_descriptor(op.name, &op.descriptor, args).await
    }

    pub(crate) async fn call_descriptor(
        &self,
        name: &str,
        descriptor: &Descriptor,
        args: CallArgs,
    ) -> Result<ApiResponse, AnyfetchError> {
        let request = resolve(name, descriptor, &args)?;
        self.send(request).await
    }

    async fn send(&self, request: ResolvedRequest) -> Result<ApiResponse, AnyfetchError> {
        tracing::debug!(verb = %request.verb, path = %request.path, "dispatching request");
        let url = format!("{}{}", self.api_url, request.path);
        let mut builder = self.http.request(request.verb.to_reqwest(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = self.authorize(builder).send().await?;
        Self::read_response(response).await
    }

    pub(crate) async fn send_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<ApiResponse, AnyfetchError> {
        tracing::debug!(path, "dispatching multipart upload");
        let url = format!("{}{}", self.api_url, path);
        let builder = self.http.post(url).multipart(form);
        let response = self.authorize(builder).send().await?;
        Self::read_response(response).await
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Basic { login, password } => builder.basic_auth(login, Some(password)),
        }
    }

    async fn read_response(response: reqwest::Response) -> Result<ApiResponse, AnyfetchError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .map_err(|source| AnyfetchError::Decode { status, source })?
        };
        Ok(ApiResponse { status, body })
    }

    // ========== index and account ==========

    pub async fn get_index(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_index", CallArgs::new()).await
    }

    pub async fn get_status(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_status", CallArgs::new()).await
    }

    /// Revoke the token used by this client. Answers 204 on success.
    pub async fn delete_token(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("delete_token", CallArgs::new()).await
    }

    pub async fn get_user(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_user", CallArgs::new()).await
    }

    // ========== company and subcompanies ==========

    pub async fn get_company(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_company", CallArgs::new()).await
    }

    /// Ask for a refresh of every provider of the company. Answers 202,
    /// the update happens asynchronously.
    pub async fn post_company_update(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("post_company_update", CallArgs::new()).await
    }

    pub async fn get_subcompanies(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_subcompanies", CallArgs::new()).await
    }

    pub async fn post_subcompany(&self, body: Value) -> Result<ApiResponse, AnyfetchError> {
        self.call("post_subcompanies", CallArgs::new().body(body))
            .await
    }

    pub async fn get_subcompany_by_id(&self, id: &str) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_subcompany_by_id", CallArgs::new().id(id))
            .await
    }

    pub async fn delete_subcompany_by_id(&self, id: &str) -> Result<ApiResponse, AnyfetchError> {
        self.call("delete_subcompany_by_id", CallArgs::new().id(id))
            .await
    }

    // ========== documents ==========

    pub async fn get_documents(&self, params: Option<Value>) -> Result<ApiResponse, AnyfetchError> {
        let mut args = CallArgs::new();
        if let Some(params) = params {
            args = args.params(params);
        }
        self.call("get_documents", args).await
    }

    pub async fn post_document(&self, body: Value) -> Result<ApiResponse, AnyfetchError> {
        self.call("post_documents", CallArgs::new().body(body)).await
    }

    pub async fn patch_document_by_id(
        &self,
        id: &str,
        body: Value,
    ) -> Result<ApiResponse, AnyfetchError> {
        self.call("patch_document_by_id", CallArgs::new().id(id).body(body))
            .await
    }

    pub async fn delete_document_by_id(&self, id: &str) -> Result<ApiResponse, AnyfetchError> {
        self.call("delete_document_by_id", CallArgs::new().id(id))
            .await
    }

    pub async fn delete_document_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<ApiResponse, AnyfetchError> {
        self.call(
            "delete_document_by_identifier",
            CallArgs::new().identifier(identifier),
        )
        .await
    }

    /// Scope further calls onto one document, addressed by id. The id's
    /// shape is checked here, before any request is made.
    pub fn document_by_id(&self, id: &str) -> Result<DocumentScope<'_>, AnyfetchError> {
        if !is_mongo_id(id) {
            return Err(ArgumentError::InvalidId {
                operation: "document_by_id".to_string(),
            }
            .into());
        }
        Ok(DocumentScope::new(self, ScopeKey::Id(id.to_string())))
    }

    /// Scope further calls onto one document, addressed by identifier.
    pub fn document_by_identifier(&self, identifier: &str) -> DocumentScope<'_> {
        DocumentScope::new(self, ScopeKey::Identifier(identifier.to_string()))
    }

    // ========== users ==========

    pub async fn get_users(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_users", CallArgs::new()).await
    }

    pub async fn post_user(&self, body: Value) -> Result<ApiResponse, AnyfetchError> {
        self.call("post_users", CallArgs::new().body(body)).await
    }

    pub async fn delete_user_by_id(&self, id: &str) -> Result<ApiResponse, AnyfetchError> {
        self.call("delete_user_by_id", CallArgs::new().id(id)).await
    }

    // ========== misc collections ==========

    pub async fn get_document_types(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_document_types", CallArgs::new()).await
    }

    pub async fn get_providers(&self) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_providers", CallArgs::new()).await
    }

    /// Fetch several GET endpoints in one round trip.
    pub async fn get_batch(&self, pages: &[&str]) -> Result<ApiResponse, AnyfetchError> {
        self.call("get_batch", CallArgs::new().params(json!({ "pages": pages })))
            .await
    }
}
