//! Default server locations.
//!
//! Both URLs can be redirected through the environment, which is how the
//! integration tests point the client at a local mock server.

use crate::types::{ApiUrl, InvalidApiUrl};

pub const DEFAULT_API_URL: &str = "https://api.anyfetch.com";
pub const DEFAULT_MANAGER_URL: &str = "https://manager.anyfetch.com";

/// Path of the token exchange endpoint on the manager service.
pub const OAUTH_ENDPOINT: &str = "/oauth/access_token";

/// Base URL of the AnyFetch API, from `ANYFETCH_API_URL` when set.
pub fn api_url() -> Result<ApiUrl, InvalidApiUrl> {
    match std::env::var("ANYFETCH_API_URL") {
        Ok(url) => ApiUrl::new(url),
        Err(_) => ApiUrl::new(DEFAULT_API_URL.to_string()),
    }
}

/// Base URL of the AnyFetch manager, from `ANYFETCH_MANAGER_URL` when set.
pub fn manager_url() -> Result<ApiUrl, InvalidApiUrl> {
    match std::env::var("ANYFETCH_MANAGER_URL") {
        Ok(url) => ApiUrl::new(url),
        Err(_) => ApiUrl::new(DEFAULT_MANAGER_URL.to_string()),
    }
}
