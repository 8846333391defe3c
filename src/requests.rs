//! Turning a descriptor plus caller arguments into a concrete request.
//!
//! [`CallArgs`] carries everything a call site may provide. All fields are
//! explicit and optional, so "was an id given" is a plain `Option` check
//! rather than an inspection of what the caller happened to pass.

use serde_json::Value;

use crate::descriptors::{Descriptor, Verb};
use crate::errors::ArgumentError;
use crate::types::{encode_identifier, is_mongo_id};

/// Arguments for a single API call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    id: Option<String>,
    identifier: Option<String>,
    params: Option<Value>,
    body: Option<Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Document (or user, subcompany) id filling the `{id}` path segment.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Document identifier filling the `{identifier}` path segment.
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// GET parameters, as a JSON object.
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }

    /// Request body, as a JSON object.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A request ready to hand to the HTTP client.
#[derive(Debug)]
pub struct ResolvedRequest {
    pub verb: Verb,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Validate `args` against `descriptor` and produce the request to send.
///
/// Checks run in a fixed order: body keys, then GET parameter keys, then
/// the id, then the identifier. The first failure is returned, naming
/// `operation` so the message points back at the call site.
pub(crate) fn resolve(
    operation: &str,
    descriptor: &Descriptor,
    args: &CallArgs,
) -> Result<ResolvedRequest, ArgumentError> {
    let body = match &args.body {
        Some(body) => {
            if descriptor.body.is_empty() {
                return Err(ArgumentError::UnexpectedBody {
                    operation: operation.to_string(),
                });
            }
            let object = body.as_object().ok_or_else(|| ArgumentError::BodyNotAnObject {
                operation: operation.to_string(),
            })?;
            for key in object.keys() {
                if !descriptor.body.contains(&key.as_str()) {
                    return Err(ArgumentError::BodyKeyNotAllowed {
                        operation: operation.to_string(),
                        key: key.clone(),
                    });
                }
            }
            Some(body.clone())
        }
        None => None,
    };

    let query = match &args.params {
        Some(params) => {
            if descriptor.params.is_empty() && !descriptor.no_check_params {
                return Err(ArgumentError::UnexpectedParams {
                    operation: operation.to_string(),
                });
            }
            let object = params
                .as_object()
                .ok_or_else(|| ArgumentError::ParamsNotAnObject {
                    operation: operation.to_string(),
                })?;
            if !descriptor.no_check_params {
                for key in object.keys() {
                    if !descriptor.params.contains(&key.as_str()) {
                        return Err(ArgumentError::QueryKeyNotAllowed {
                            operation: operation.to_string(),
                            key: key.clone(),
                        });
                    }
                }
            }
            query_pairs(object)
        }
        None => Vec::new(),
    };

    let mut path = descriptor.endpoint.clone();
    if descriptor.requires_id {
        let id = args.id.as_deref().filter(|id| is_mongo_id(id)).ok_or_else(|| {
            ArgumentError::InvalidId {
                operation: operation.to_string(),
            }
        })?;
        path = path.replace("{id}", id);
    }
    if descriptor.requires_identifier {
        let identifier =
            args.identifier
                .as_deref()
                .ok_or_else(|| ArgumentError::MissingIdentifier {
                    operation: operation.to_string(),
                })?;
        path = path.replace("{identifier}", &encode_identifier(identifier));
    }

    Ok(ResolvedRequest {
        verb: descriptor.verb,
        path,
        query,
        body,
    })
}

/// Flatten a JSON object into query pairs. Arrays become repeated keys,
/// nulls are dropped, everything else is stringified.
fn query_pairs(object: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in object {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    pairs.push((key.clone(), scalar_to_string(item)));
                }
            }
            other => pairs.push((key.clone(), scalar_to_string(other))),
        }
    }
    pairs
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::registry;
    use serde_json::json;

    fn descriptor(name: &str) -> &'static Descriptor {
        &registry().get(name).unwrap().descriptor
    }

    #[test]
    fn test_plain_get_resolves() {
        let request = resolve("get_status", descriptor("get_status"), &CallArgs::new()).unwrap();
        assert_eq!(request.verb, Verb::Get);
        assert_eq!(request.path, "/status");
        assert!(request.query.is_empty());
        assert!(request.body.is_none());
    }

    #[test]
    fn test_body_key_whitelist() {
        let args = CallArgs::new().body(json!({"identifier": "doc", "random_key": 1}));
        let err = resolve("post_documents", descriptor("post_documents"), &args).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("argument error in post_documents"));
        assert!(message.contains("random_key"));
        assert!(message.contains("body"));
    }

    #[test]
    fn test_query_key_whitelist() {
        let args = CallArgs::new().params(json!({"pages": ["/status"], "nope": true}));
        let err = resolve("get_batch", descriptor("get_batch"), &args).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("GET parameters"));
    }

    #[test]
    fn test_no_check_params_accepts_anything() {
        let args = CallArgs::new().params(json!({"meta.some_custom_key": "value"}));
        let request = resolve("get_documents", descriptor("get_documents"), &args).unwrap();
        assert_eq!(
            request.query,
            vec![("meta.some_custom_key".to_string(), "value".to_string())]
        );
    }

    #[test]
    fn test_unexpected_body_rejected() {
        let args = CallArgs::new().body(json!({"anything": 1}));
        let err = resolve("get_status", descriptor("get_status"), &args).unwrap_err();
        assert!(matches!(err, ArgumentError::UnexpectedBody { .. }));
    }

    #[test]
    fn test_id_shape_checked() {
        let args = CallArgs::new().id("aze");
        let err = resolve(
            "get_documents_by_id",
            descriptor("get_documents_by_id"),
            &args,
        )
        .unwrap_err();
        assert!(err.to_string().contains("valid MongoDB ObjectId"));
    }

    #[test]
    fn test_missing_id_checked() {
        let err = resolve(
            "get_documents_by_id",
            descriptor("get_documents_by_id"),
            &CallArgs::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ArgumentError::InvalidId { .. }));
    }

    #[test]
    fn test_id_substituted_in_path() {
        let args = CallArgs::new().id("53a7ef7b3b28ab0c7c46863c");
        let request = resolve(
            "get_documents_by_id",
            descriptor("get_documents_by_id"),
            &args,
        )
        .unwrap();
        assert_eq!(request.path, "/documents/53a7ef7b3b28ab0c7c46863c");
    }

    #[test]
    fn test_identifier_encoded_in_path() {
        let args = CallArgs::new().identifier("the doc (1)");
        let request = resolve(
            "get_documents_by_identifier",
            descriptor("get_documents_by_identifier"),
            &args,
        )
        .unwrap();
        assert_eq!(request.path, "/documents/identifier/the%20doc%20%281%29");
    }

    #[test]
    fn test_array_param_repeats_key() {
        let args = CallArgs::new().params(json!({"pages": ["/status", "/company"]}));
        let request = resolve("get_batch", descriptor("get_batch"), &args).unwrap();
        assert_eq!(
            request.query,
            vec![
                ("pages".to_string(), "/status".to_string()),
                ("pages".to_string(), "/company".to_string()),
            ]
        );
    }

    #[test]
    fn test_body_checked_before_id() {
        // validation order: a bad body key wins over a bad id
        let args = CallArgs::new()
            .id("aze")
            .body(json!({"random_key": 1}));
        let err = resolve(
            "patch_document_by_id",
            descriptor("patch_document_by_id"),
            &args,
        )
        .unwrap_err();
        assert!(matches!(err, ArgumentError::BodyKeyNotAllowed { .. }));
    }
}
