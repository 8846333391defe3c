//! Storage for response overrides.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::descriptors::Verb;
use crate::errors::OverrideError;

use super::MockRequest;

/// A handler override takes the whole request and produces the whole
/// response, bypassing descriptor validation and fixtures.
pub type OverrideHandler = Arc<dyn Fn(MockRequest) -> axum::response::Response + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Override {
    Content(Value),
    Handler(OverrideHandler),
}

/// Overrides keyed by verb and path. The querystring part of a key is
/// ignored, both at registration and at lookup.
pub(crate) struct OverrideRegistry {
    entries: Mutex<HashMap<(Verb, String), Override>>,
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(Verb, String), Override>> {
        // a panicked handler must not wedge every later request
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, verb: Verb, endpoint: &str, entry: Override) -> Result<(), OverrideError> {
        let path = strip_query(endpoint);
        if path == "/batch" {
            return Err(OverrideError::BatchNotOverridable);
        }
        self.lock().insert((verb, path.to_string()), entry);
        Ok(())
    }

    pub fn get(&self, verb: Verb, path: &str) -> Option<Override> {
        self.lock()
            .get(&(verb, strip_query(path).to_string()))
            .cloned()
    }

    pub fn content(&self, verb: Verb, path: &str) -> Option<Value> {
        match self.get(verb, path) {
            Some(Override::Content(value)) => Some(value),
            _ => None,
        }
    }

    /// Remove one override. Removing an endpoint that was never
    /// overridden is a no-op.
    pub fn remove(&self, verb: Verb, endpoint: &str) {
        self.lock().remove(&(verb, strip_query(endpoint).to_string()));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

fn strip_query(endpoint: &str) -> &str {
    endpoint.split_once('?').map(|(path, _)| path).unwrap_or(endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_querystring_stripped_on_both_sides() {
        let registry = OverrideRegistry::new();
        registry
            .insert(
                Verb::Get,
                "/documents?search=kittens",
                Override::Content(json!({"count": 1})),
            )
            .unwrap();
        assert!(registry.content(Verb::Get, "/documents").is_some());
        assert!(registry.content(Verb::Get, "/documents?other=1").is_some());
    }

    #[test]
    fn test_batch_rejected() {
        let registry = OverrideRegistry::new();
        let err = registry
            .insert(Verb::Get, "/batch?pages=/status", Override::Content(json!({})))
            .unwrap_err();
        assert!(matches!(err, OverrideError::BatchNotOverridable));
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let registry = OverrideRegistry::new();
        registry.remove(Verb::Get, "/never-registered");
    }
}
