//! Calls scoped onto a single document.
//!
//! `client.document_by_id(id)?.get_raw().await` and
//! `client.call("get_documents_by_id", ...)` with a `get_raw` sub-call go
//! through the same descriptors; the scope only pins the id or identifier
//! once so chained calls stay terse.

use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{AnyfetchClient, ApiResponse};
use crate::descriptors::{registry, Operation};
use crate::errors::AnyfetchError;
use crate::requests::{resolve, CallArgs};

#[derive(Debug, Clone)]
pub(crate) enum ScopeKey {
    Id(String),
    Identifier(String),
}

/// A handle on one document, by id or by identifier.
pub struct DocumentScope<'a> {
    client: &'a AnyfetchClient,
    operation: &'static Arc<Operation>,
    key: ScopeKey,
}

impl<'a> DocumentScope<'a> {
    pub(crate) fn new(client: &'a AnyfetchClient, key: ScopeKey) -> Self {
        let name = match key {
            ScopeKey::Id(_) => "get_documents_by_id",
            ScopeKey::Identifier(_) => "get_documents_by_identifier",
        };
        let operation = registry()
            .get(name)
            .expect("document operations are always registered");
        Self {
            client,
            operation,
            key,
        }
    }

    fn apply_key(&self, args: CallArgs) -> CallArgs {
        match &self.key {
            ScopeKey::Id(id) => args.id(id.clone()),
            ScopeKey::Identifier(identifier) => args.identifier(identifier.clone()),
        }
    }

    /// Fetch the document itself.
    pub async fn get(&self) -> Result<ApiResponse, AnyfetchError> {
        self.client
            .call_descriptor(
                self.operation.name,
                &self.operation.descriptor,
                self.apply_key(CallArgs::new()),
            )
            .await
    }

    /// Perform a sub-operation by name (`get_raw`, `get_similar`, ...).
    pub async fn sub(&self, name: &str) -> Result<ApiResponse, AnyfetchError> {
        self.sub_with(name, CallArgs::new()).await
    }

    /// Like [`DocumentScope::sub`] with extra call arguments.
    pub async fn sub_with(
        &self,
        name: &str,
        args: CallArgs,
    ) -> Result<ApiResponse, AnyfetchError> {
        let descriptor = self.operation.sub(name).ok_or_else(|| {
            AnyfetchError::UnknownOperation(format!("{}.{}", self.operation.name, name))
        })?;
        self.client
            .call_descriptor(name, descriptor, self.apply_key(args))
            .await
    }

    pub async fn get_similar(&self) -> Result<ApiResponse, AnyfetchError> {
        self.sub("get_similar").await
    }

    pub async fn get_related(&self) -> Result<ApiResponse, AnyfetchError> {
        self.sub("get_related").await
    }

    pub async fn get_raw(&self) -> Result<ApiResponse, AnyfetchError> {
        self.sub("get_raw").await
    }

    pub async fn get_file(&self) -> Result<ApiResponse, AnyfetchError> {
        self.sub("get_file").await
    }

    /// Attach a file to the document. The server answers 204.
    pub async fn post_file(&self, upload: FileUpload) -> Result<ApiResponse, AnyfetchError> {
        let base = resolve(
            self.operation.name,
            &self.operation.descriptor,
            &self.apply_key(CallArgs::new()),
        )?
        .path;
        let part = upload.into_part().await?;
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .send_multipart(&format!("{base}/file"), form)
            .await
    }

    /// [`DocumentScope::post_file`] with the upload built lazily, so an
    /// expensive read only happens once the request is about to go out.
    pub async fn post_file_with<F>(&self, factory: F) -> Result<ApiResponse, AnyfetchError>
    where
        F: FnOnce() -> Result<FileUpload, AnyfetchError>,
    {
        self.post_file(factory()?).await
    }
}

/// A file to attach to a document.
#[derive(Debug)]
pub struct FileUpload {
    file: FileSource,
    filename: Option<String>,
    content_type: Option<String>,
}

#[derive(Debug)]
enum FileSource {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

impl FileUpload {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            file: FileSource::Bytes(bytes),
            filename: None,
            content_type: None,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file: FileSource::Path(path.into()),
            filename: None,
            content_type: None,
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    async fn into_part(self) -> Result<reqwest::multipart::Part, AnyfetchError> {
        let (bytes, default_name) = match self.file {
            FileSource::Bytes(bytes) => (bytes, "file".to_string()),
            FileSource::Path(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                let bytes = fs_err::tokio::read(&path).await?;
                (bytes, name)
            }
        };
        let mut part = reqwest::multipart::Part::bytes(bytes)
            .file_name(self.filename.unwrap_or(default_name));
        if let Some(content_type) = &self.content_type {
            part = part.mime_str(content_type)?;
        }
        Ok(part)
    }
}
