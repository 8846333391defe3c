//! OAuth code exchange against the manager service.

use std::time::Duration;

use serde::Deserialize;

use crate::config::OAUTH_ENDPOINT;
use crate::errors::AnyfetchError;
use crate::types::ApiUrl;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Trade the `code` obtained from the consent redirect for a bearer token.
pub async fn get_access_token(
    manager_url: &ApiUrl,
    app_id: &str,
    app_secret: &str,
    code: &str,
) -> Result<String, AnyfetchError> {
    tracing::debug!(%manager_url, app_id, "exchanging authorization code");
    let http = reqwest::ClientBuilder::new()
        .timeout(Duration::from_secs(30))
        .build()?;
    let response = http
        .post(format!("{manager_url}{OAUTH_ENDPOINT}"))
        .form(&[
            ("client_id", app_id),
            ("client_secret", app_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AnyfetchError::TokenExchange { status, body });
    }
    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}
