//! The endpoint descriptor table and the registry built from it.
//!
//! Every operation the client can perform, and every route the mock server
//! serves, comes from this one table. Raw entries only state what differs
//! from the defaults (GET, status 200); [`Registry::build`] merges the
//! defaults in, expands sub-operations against their parent, and installs
//! the aliases as shared handles onto their target operation.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;

/// HTTP verbs used by the API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
        }
    }

    /// Short lowercase form used in fixture file names.
    pub(crate) fn short(&self) -> &'static str {
        match self {
            Verb::Get => "get",
            Verb::Post => "post",
            Verb::Put => "put",
            Verb::Patch => "patch",
            Verb::Delete => "del",
        }
    }

    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Put => reqwest::Method::PUT,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Delete => reqwest::Method::DELETE,
        }
    }

    pub(crate) fn parse(s: &str) -> Option<Verb> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Verb::Get),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the raw table, before defaults are merged in.
#[derive(Default)]
struct RawDescriptor {
    name: &'static str,
    verb: Option<Verb>,
    endpoint: &'static str,
    expected_status: Option<u16>,
    requires_id: bool,
    requires_identifier: bool,
    params: &'static [&'static str],
    no_check_params: bool,
    body: &'static [&'static str],
    subs: &'static [RawSub],
}

/// A sub-operation only names itself and the path fragment it appends;
/// everything else is inherited from the parent.
struct RawSub {
    name: &'static str,
    endpoint: &'static str,
}

const DOCUMENT_SUBS: &[RawSub] = &[
    RawSub {
        name: "get_similar",
        endpoint: "/similar",
    },
    RawSub {
        name: "get_related",
        endpoint: "/related",
    },
    RawSub {
        name: "get_raw",
        endpoint: "/raw",
    },
    RawSub {
        name: "get_file",
        endpoint: "/file",
    },
];

const DOCUMENT_BODY: &[&str] = &[
    "identifier",
    "document_type",
    "data",
    "metadata",
    "related",
    "user_access",
];

fn raw_table() -> Vec<RawDescriptor> {
    vec![
        RawDescriptor {
            name: "get_index",
            endpoint: "/",
            ..Default::default()
        },
        RawDescriptor {
            name: "get_status",
            endpoint: "/status",
            ..Default::default()
        },
        RawDescriptor {
            name: "delete_token",
            verb: Some(Verb::Delete),
            endpoint: "/token",
            expected_status: Some(204),
            ..Default::default()
        },
        RawDescriptor {
            name: "get_company",
            endpoint: "/company",
            ..Default::default()
        },
        RawDescriptor {
            name: "post_company_update",
            verb: Some(Verb::Post),
            endpoint: "/company/update",
            expected_status: Some(202),
            ..Default::default()
        },
        RawDescriptor {
            name: "get_subcompanies",
            endpoint: "/subcompanies",
            ..Default::default()
        },
        RawDescriptor {
            name: "post_subcompanies",
            verb: Some(Verb::Post),
            endpoint: "/subcompanies",
            body: &["name", "user"],
            ..Default::default()
        },
        RawDescriptor {
            name: "get_subcompany_by_id",
            endpoint: "/subcompanies/{id}",
            requires_id: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "delete_subcompany_by_id",
            verb: Some(Verb::Delete),
            endpoint: "/subcompanies/{id}",
            expected_status: Some(204),
            requires_id: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "get_documents",
            endpoint: "/documents",
            params: &[
                "search",
                "before",
                "after",
                "document_type",
                "token",
                "_meta",
                "has_meta",
                "snippet_size",
                "start",
                "limit",
                "strict",
            ],
            // free-form `meta.*` filters make a closed whitelist impossible
            no_check_params: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "post_documents",
            verb: Some(Verb::Post),
            endpoint: "/documents",
            body: DOCUMENT_BODY,
            ..Default::default()
        },
        RawDescriptor {
            name: "get_documents_by_id",
            endpoint: "/documents/{id}",
            requires_id: true,
            subs: DOCUMENT_SUBS,
            ..Default::default()
        },
        RawDescriptor {
            name: "patch_document_by_id",
            verb: Some(Verb::Patch),
            endpoint: "/documents/{id}",
            requires_id: true,
            body: DOCUMENT_BODY,
            ..Default::default()
        },
        RawDescriptor {
            name: "delete_document_by_id",
            verb: Some(Verb::Delete),
            endpoint: "/documents/{id}",
            expected_status: Some(204),
            requires_id: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "get_documents_by_identifier",
            endpoint: "/documents/identifier/{identifier}",
            requires_identifier: true,
            subs: DOCUMENT_SUBS,
            ..Default::default()
        },
        RawDescriptor {
            name: "delete_document_by_identifier",
            verb: Some(Verb::Delete),
            endpoint: "/documents/identifier/{identifier}",
            expected_status: Some(204),
            requires_identifier: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "get_users",
            endpoint: "/users",
            ..Default::default()
        },
        RawDescriptor {
            name: "post_users",
            verb: Some(Verb::Post),
            endpoint: "/users",
            body: &["email", "name", "password", "is_admin"],
            ..Default::default()
        },
        RawDescriptor {
            name: "get_user",
            endpoint: "/user",
            ..Default::default()
        },
        RawDescriptor {
            name: "delete_user_by_id",
            verb: Some(Verb::Delete),
            endpoint: "/users/{id}",
            expected_status: Some(204),
            requires_id: true,
            ..Default::default()
        },
        RawDescriptor {
            name: "get_document_types",
            endpoint: "/document_types",
            ..Default::default()
        },
        RawDescriptor {
            name: "get_providers",
            endpoint: "/providers",
            ..Default::default()
        },
        RawDescriptor {
            name: "get_batch",
            endpoint: "/batch",
            params: &["pages"],
            ..Default::default()
        },
    ]
}

/// Alternate names resolving to the same operation.
pub(crate) const ALIASES: &[(&str, &str)] = &[
    ("get_document_by_id", "get_documents_by_id"),
    ("get_document_by_identifier", "get_documents_by_identifier"),
    ("post_document", "post_documents"),
    ("post_user", "post_users"),
    ("post_subcompany", "post_subcompanies"),
];

/// A fully resolved endpoint description.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub verb: Verb,
    pub endpoint: String,
    pub expected_status: u16,
    pub requires_id: bool,
    pub requires_identifier: bool,
    pub params: &'static [&'static str],
    pub no_check_params: bool,
    pub body: &'static [&'static str],
}

/// A named operation plus its resolved sub-operations.
#[derive(Debug)]
pub struct Operation {
    pub name: &'static str,
    pub descriptor: Descriptor,
    pub sub_operations: Vec<(&'static str, Descriptor)>,
}

impl Operation {
    pub fn sub(&self, name: &str) -> Option<&Descriptor> {
        self.sub_operations
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, d)| d)
    }
}

/// All operations by name, aliases included.
pub struct Registry {
    operations: HashMap<&'static str, Arc<Operation>>,
    canonical: Vec<Arc<Operation>>,
}

impl Registry {
    fn build() -> Self {
        let mut operations = HashMap::new();
        let mut canonical = Vec::new();
        for raw in raw_table() {
            let descriptor = Descriptor {
                verb: raw.verb.unwrap_or(Verb::Get),
                endpoint: raw.endpoint.to_string(),
                expected_status: raw.expected_status.unwrap_or(200),
                requires_id: raw.requires_id,
                requires_identifier: raw.requires_identifier,
                params: raw.params,
                no_check_params: raw.no_check_params,
                body: raw.body,
            };
            let sub_operations = raw
                .subs
                .iter()
                .map(|sub| {
                    let mut inherited = descriptor.clone();
                    inherited.endpoint = format!("{}{}", descriptor.endpoint, sub.endpoint);
                    (sub.name, inherited)
                })
                .collect();
            let operation = Arc::new(Operation {
                name: raw.name,
                descriptor,
                sub_operations,
            });
            canonical.push(Arc::clone(&operation));
            operations.insert(raw.name, operation);
        }
        for (alias, target) in ALIASES {
            let target_op = operations
                .get(target)
                .unwrap_or_else(|| panic!("alias {alias} points at unknown operation {target}"))
                .clone();
            operations.insert(*alias, target_op);
        }
        Registry {
            operations,
            canonical,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Operation>> {
        self.operations.get(name)
    }

    /// Every operation exactly once, aliases excluded. This is what the
    /// mock server iterates when mounting routes, so an alias never
    /// registers its endpoint twice.
    pub fn canonical(&self) -> &[Arc<Operation>] {
        &self.canonical
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }
}

lazy_static! {
    static ref REGISTRY: Registry = Registry::build();
}

pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Name of the fixture file answering `verb endpoint`, without extension.
///
/// The verb's short form, then the endpoint with slashes turned into
/// dashes and placeholder braces stripped. The root endpoint maps to
/// `index`.
pub fn endpoint_filename(verb: Verb, endpoint: &str) -> String {
    let trimmed = endpoint.trim_start_matches('/');
    if trimmed.is_empty() {
        return format!("{}-index", verb.short());
    }
    let flat: String = trimmed
        .chars()
        .filter(|c| *c != '{' && *c != '}')
        .map(|c| if c == '/' { '-' } else { c })
        .collect();
    format!("{}-{}", verb.short(), flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[test]
    fn test_defaults_merged() {
        let op = registry().get("get_index").unwrap();
        assert_eq!(op.descriptor.verb, Verb::Get);
        assert_eq!(op.descriptor.expected_status, 200);
        assert_eq!(op.descriptor.endpoint, "/");
    }

    #[test]
    fn test_explicit_fields_win_over_defaults() {
        let op = registry().get("delete_token").unwrap();
        assert_eq!(op.descriptor.verb, Verb::Delete);
        assert_eq!(op.descriptor.expected_status, 204);
    }

    #[test]
    fn test_sub_descriptor_inherits_and_appends() {
        let op = registry().get("get_documents_by_id").unwrap();
        let similar = op.sub("get_similar").unwrap();
        assert_eq!(similar.endpoint, "/documents/{id}/similar");
        assert_eq!(similar.verb, Verb::Get);
        assert_eq!(similar.expected_status, 200);
        assert!(similar.requires_id);
    }

    #[test]
    fn test_identifier_subs_present() {
        let op = registry().get("get_documents_by_identifier").unwrap();
        let raw = op.sub("get_raw").unwrap();
        assert_eq!(raw.endpoint, "/documents/identifier/{identifier}/raw");
        assert!(raw.requires_identifier);
    }

    #[rstest]
    #[case("get_document_by_id", "get_documents_by_id")]
    #[case("get_document_by_identifier", "get_documents_by_identifier")]
    #[case("post_document", "post_documents")]
    #[case("post_user", "post_users")]
    #[case("post_subcompany", "post_subcompanies")]
    fn test_alias_is_same_operation(#[case] alias: &str, #[case] target: &str) {
        let a = registry().get(alias).unwrap();
        let t = registry().get(target).unwrap();
        assert!(Arc::ptr_eq(a, t));
    }

    #[test]
    fn test_canonical_excludes_aliases() {
        let registry = registry();
        assert_eq!(
            registry.canonical().len() + ALIASES.len(),
            registry.names().count()
        );
    }

    #[rstest]
    #[case(Verb::Get, "/", "get-index")]
    #[case(Verb::Get, "/status", "get-status")]
    #[case(Verb::Delete, "/token", "del-token")]
    #[case(Verb::Get, "/documents/{id}", "get-documents-id")]
    #[case(Verb::Get, "/documents/{id}/raw", "get-documents-id-raw")]
    #[case(
        Verb::Get,
        "/documents/identifier/{identifier}",
        "get-documents-identifier-identifier"
    )]
    #[case(Verb::Post, "/oauth/access_token", "post-oauth-access_token")]
    fn test_endpoint_filename(#[case] verb: Verb, #[case] endpoint: &str, #[case] expected: &str) {
        assert_eq!(endpoint_filename(verb, endpoint), expected);
    }
}
