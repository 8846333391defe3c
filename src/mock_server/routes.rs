//! Route handlers generated from the descriptor table, plus the few
//! endpoints too irregular for it (batch, file upload, token exchange).

use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, on, post, MethodFilter};
use axum::Router;
use serde_json::{json, Value};

use crate::descriptors::{registry, Descriptor, Verb};

use super::content::fixture;
use super::overrides::{Override, OverrideRegistry};
use super::MockRequest;

const BODY_LIMIT: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub(crate) struct ServerState {
    overrides: Arc<OverrideRegistry>,
}

pub(crate) fn build_router(overrides: Arc<OverrideRegistry>) -> Router {
    let mut router = Router::new();
    for operation in registry().canonical() {
        // /batch is synthesized below, not served from a fixture
        if operation.descriptor.endpoint == "/batch" {
            continue;
        }
        router = add_descriptor_route(router, operation.name, &operation.descriptor);
        for (name, descriptor) in &operation.sub_operations {
            router = add_descriptor_route(router, name, descriptor);
        }
    }
    router
        .route("/batch", get(serve_batch))
        .route("/documents/:id/file", post(serve_post_file))
        .route(
            "/documents/identifier/:identifier/file",
            post(serve_post_file),
        )
        .route("/oauth/access_token", post(serve_oauth))
        .fallback(serve_fallback)
        .with_state(ServerState { overrides })
}

fn add_descriptor_route(
    router: Router<ServerState>,
    name: &'static str,
    descriptor: &Descriptor,
) -> Router<ServerState> {
    let path = route_path(&descriptor.endpoint);
    let filter = method_filter(descriptor.verb);
    let descriptor = descriptor.clone();
    router.route(
        &path,
        on(filter, move |state: State<ServerState>, request: Request| {
            let descriptor = descriptor.clone();
            async move { serve_descriptor(state.0, name, descriptor, request).await }
        }),
    )
}

/// Turn a descriptor endpoint template into axum route syntax.
fn route_path(endpoint: &str) -> String {
    endpoint
        .replace("{id}", ":id")
        .replace("{identifier}", ":identifier")
}

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::Get => MethodFilter::GET,
        Verb::Post => MethodFilter::POST,
        Verb::Put => MethodFilter::PUT,
        Verb::Patch => MethodFilter::PATCH,
        Verb::Delete => MethodFilter::DELETE,
    }
}

async fn serve_descriptor(
    state: ServerState,
    name: &'static str,
    descriptor: Descriptor,
    request: Request,
) -> Response {
    let path = request.uri().path().to_string();
    tracing::debug!(operation = name, path = %path, "serving descriptor route");

    let content_override = match state.overrides.get(descriptor.verb, &path) {
        Some(Override::Handler(handler)) => {
            return match into_mock_request(request).await {
                Ok(mock) => handler(mock),
                Err(response) => response,
            }
        }
        Some(Override::Content(value)) => Some(value),
        None => None,
    };

    let query = request.uri().query().map(str::to_string);
    let (_parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                "could not read the request body",
            )
        }
    };

    // an overridden response is served as-is, skipping validation
    if content_override.is_none() {
        if let Some(response) = validate(&descriptor, query.as_deref(), &bytes) {
            return response;
        }
    }

    // 204 and 202 answers carry no body, overridden or not
    if descriptor.expected_status == 204 || descriptor.expected_status == 202 {
        return status_only(descriptor.expected_status);
    }

    match content_override.or_else(|| fixture(descriptor.verb, &descriptor.endpoint)) {
        Some(value) => (status(descriptor.expected_status), Json(value)).into_response(),
        None => not_found(&path),
    }
}

/// Whitelist checks mirroring what the real API enforces. Answers `None`
/// when the request is acceptable.
fn validate(descriptor: &Descriptor, query: Option<&str>, body: &[u8]) -> Option<Response> {
    if !body.is_empty() && !descriptor.body.is_empty() {
        let parsed: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(_) => return Some(invalid_argument("the body is not valid JSON")),
        };
        if let Some(object) = parsed.as_object() {
            for key in object.keys() {
                if !descriptor.body.contains(&key.as_str()) {
                    return Some(invalid_argument(&format!(
                        "the key {key} is not allowed in this request's body"
                    )));
                }
            }
        }
    }
    if !descriptor.no_check_params {
        if let Some(query) = query {
            for (key, _) in url::form_urlencoded::parse(query.as_bytes()) {
                if !descriptor.params.contains(&key.as_ref()) {
                    return Some(invalid_argument(&format!(
                        "the key {key} is not allowed in this request's GET parameters"
                    )));
                }
            }
        }
    }
    None
}

/// `GET /batch`: fan a list of pages out onto their stored content and
/// fold the answers into one object keyed by page.
async fn serve_batch(State(state): State<ServerState>, request: Request) -> Response {
    let query = request.uri().query().unwrap_or("");
    let mut pages = Vec::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        if key.as_ref() == "pages" {
            pages.push(value.into_owned());
        } else {
            return invalid_argument(&format!(
                "the key {key} is not allowed in this request's GET parameters"
            ));
        }
    }
    if pages.is_empty() {
        return invalid_argument("the pages parameter is required");
    }

    let mut result = serde_json::Map::new();
    let mut errored: Option<String> = None;
    for page in pages {
        let path = page
            .split_once('?')
            .map(|(path, _)| path)
            .unwrap_or(&page)
            .to_string();
        let content = state
            .overrides
            .content(Verb::Get, &path)
            .or_else(|| fixture(Verb::Get, &path));
        match content {
            Some(value) => {
                result.insert(page, value);
            }
            None => {
                result.insert(
                    page.clone(),
                    json!({"code": "NotFound", "message": format!("{path} does not exist")}),
                );
                errored.get_or_insert(page);
            }
        }
    }

    if let Some(page) = errored {
        result.insert("errored".to_string(), Value::String(page));
        (StatusCode::NOT_FOUND, Json(Value::Object(result))).into_response()
    } else {
        Json(Value::Object(result)).into_response()
    }
}

/// `POST /documents/.../file`: accept a multipart upload carrying a
/// `file` part and answer 204.
async fn serve_post_file(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    match state.overrides.get(Verb::Post, &path) {
        Some(Override::Handler(handler)) => {
            return match into_mock_request(request).await {
                Ok(mock) => handler(mock),
                Err(response) => response,
            }
        }
        // the endpoint answers 204 either way, so stored content only
        // suppresses the multipart check
        Some(Override::Content(_)) => return status_only(204),
        None => {}
    }
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(_) => return invalid_argument("expected multipart form data"),
    };
    let mut has_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            has_file = true;
        }
        let _ = field.bytes().await;
    }
    if !has_file {
        return invalid_argument("missing file in request");
    }
    status_only(204)
}

/// `POST /oauth/access_token`: the manager's code exchange.
async fn serve_oauth(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let content_override = match state.overrides.get(Verb::Post, &path) {
        Some(Override::Handler(handler)) => {
            return match into_mock_request(request).await {
                Ok(mock) => handler(mock),
                Err(response) => response,
            }
        }
        Some(Override::Content(value)) => Some(value),
        None => None,
    };

    let (_parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, BODY_LIMIT).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "BadRequest",
                "could not read the request body",
            )
        }
    };

    if content_override.is_none() {
        let form: Vec<(String, String)> =
            url::form_urlencoded::parse(&bytes).into_owned().collect();
        let field = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value.as_str())
        };
        for key in ["client_id", "client_secret", "code", "grant_type"] {
            if field(key).is_none() {
                return invalid_argument(&format!("the key {key} is missing"));
            }
        }
        if field("grant_type") != Some("authorization_code") {
            return invalid_argument("grant_type must be authorization_code");
        }
    }

    match content_override.or_else(|| fixture(Verb::Post, "/oauth/access_token")) {
        Some(value) => Json(value).into_response(),
        None => not_found(&path),
    }
}

/// Requests for paths with no descriptor still honor overrides, so a test
/// can stand up endpoints the real API does not have.
async fn serve_fallback(State(state): State<ServerState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let verb = match Verb::parse(request.method().as_str()) {
        Some(verb) => verb,
        None => return not_found(&path),
    };
    match state.overrides.get(verb, &path) {
        Some(Override::Handler(handler)) => match into_mock_request(request).await {
            Ok(mock) => handler(mock),
            Err(response) => response,
        },
        Some(Override::Content(value)) => Json(value).into_response(),
        None => not_found(&path),
    }
}

async fn into_mock_request(request: Request) -> Result<MockRequest, Response> {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT).await.map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            "could not read the request body",
        )
    })?;
    Ok(MockRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body: bytes,
    })
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::OK)
}

fn status_only(code: u16) -> Response {
    status(code).into_response()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({"code": code, "message": message}))).into_response()
}

fn invalid_argument(message: &str) -> Response {
    error_response(StatusCode::CONFLICT, "InvalidArgument", message)
}

fn not_found(path: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "NotFound",
        &format!("{path} does not exist"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_descriptor() -> Descriptor {
        Descriptor {
            verb: Verb::Get,
            endpoint: "/things".to_string(),
            expected_status: 200,
            requires_id: false,
            requires_identifier: false,
            params: &["known"],
            no_check_params: false,
            body: &["title"],
        }
    }

    #[test]
    fn test_validate_rejects_unknown_query_key() {
        let response = validate(&plain_descriptor(), Some("surprise=1"), b"").unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validate_rejects_unknown_body_key() {
        let response =
            validate(&plain_descriptor(), None, br#"{"other": 1}"#).unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validate_accepts_whitelisted() {
        assert!(validate(&plain_descriptor(), Some("known=1"), br#"{"title": "x"}"#).is_none());
    }

    #[test]
    fn test_route_path_syntax() {
        assert_eq!(route_path("/documents/{id}/raw"), "/documents/:id/raw");
        assert_eq!(
            route_path("/documents/identifier/{identifier}"),
            "/documents/identifier/:identifier"
        );
        assert_eq!(route_path("/"), "/");
    }
}
