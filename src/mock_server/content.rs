//! Fixture content embedded at compile time.
//!
//! Files under `mocks/` are named after [`endpoint_filename`], one per
//! endpoint that answers with a body. Endpoints answering 204 or 202 have
//! no fixture.

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::Value;

use crate::descriptors::{endpoint_filename, Verb};

const RAW_FIXTURES: &[(&str, &str)] = &[
    ("get-index", include_str!("../../mocks/get-index.json")),
    ("get-status", include_str!("../../mocks/get-status.json")),
    ("get-company", include_str!("../../mocks/get-company.json")),
    ("get-subcompanies", include_str!("../../mocks/get-subcompanies.json")),
    ("post-subcompanies", include_str!("../../mocks/post-subcompanies.json")),
    ("get-subcompanies-id", include_str!("../../mocks/get-subcompanies-id.json")),
    ("get-documents", include_str!("../../mocks/get-documents.json")),
    ("post-documents", include_str!("../../mocks/post-documents.json")),
    ("get-documents-id", include_str!("../../mocks/get-documents-id.json")),
    (
        "get-documents-id-similar",
        include_str!("../../mocks/get-documents-id-similar.json"),
    ),
    (
        "get-documents-id-related",
        include_str!("../../mocks/get-documents-id-related.json"),
    ),
    (
        "get-documents-id-raw",
        include_str!("../../mocks/get-documents-id-raw.json"),
    ),
    (
        "get-documents-id-file",
        include_str!("../../mocks/get-documents-id-file.json"),
    ),
    (
        "get-documents-identifier-identifier",
        include_str!("../../mocks/get-documents-identifier-identifier.json"),
    ),
    (
        "get-documents-identifier-identifier-similar",
        include_str!("../../mocks/get-documents-identifier-identifier-similar.json"),
    ),
    (
        "get-documents-identifier-identifier-related",
        include_str!("../../mocks/get-documents-identifier-identifier-related.json"),
    ),
    (
        "get-documents-identifier-identifier-raw",
        include_str!("../../mocks/get-documents-identifier-identifier-raw.json"),
    ),
    (
        "get-documents-identifier-identifier-file",
        include_str!("../../mocks/get-documents-identifier-identifier-file.json"),
    ),
    ("patch-documents-id", include_str!("../../mocks/patch-documents-id.json")),
    ("get-users", include_str!("../../mocks/get-users.json")),
    ("post-users", include_str!("../../mocks/post-users.json")),
    ("get-user", include_str!("../../mocks/get-user.json")),
    ("get-document_types", include_str!("../../mocks/get-document_types.json")),
    ("get-providers", include_str!("../../mocks/get-providers.json")),
    (
        "post-oauth-access_token",
        include_str!("../../mocks/post-oauth-access_token.json"),
    ),
];

lazy_static! {
    static ref FIXTURES: HashMap<&'static str, Value> = {
        let mut fixtures = HashMap::new();
        for (name, raw) in RAW_FIXTURES {
            let value = serde_json::from_str(raw)
                .unwrap_or_else(|e| panic!("fixture {name} is not valid JSON: {e}"));
            fixtures.insert(*name, value);
        }
        fixtures
    };
}

/// Default content answering `verb path`, if any. `path` may be either a
/// descriptor's endpoint template or a concrete request path; the naming
/// convention is applied verbatim either way, which is what lets batch
/// pages find their fixture.
pub(crate) fn fixture(verb: Verb, path: &str) -> Option<Value> {
    FIXTURES.get(endpoint_filename(verb, path).as_str()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_fixtures_parse() {
        assert_eq!(FIXTURES.len(), RAW_FIXTURES.len());
    }

    #[test]
    fn test_lookup_by_concrete_path() {
        assert!(fixture(Verb::Get, "/status").is_some());
        assert!(fixture(Verb::Get, "/nowhere").is_none());
    }

    #[test]
    fn test_lookup_by_template() {
        assert!(fixture(Verb::Get, "/documents/{id}/raw").is_some());
    }
}
