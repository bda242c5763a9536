use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::remote::AuthProvider;
use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Deserialize;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges the configured refresh token for a new access token.
pub struct OAuthRefresher {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

impl OAuthRefresher {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
        }
    }
}

#[async_trait]
impl AuthProvider for OAuthRefresher {
    async fn refresh(&self) -> Result<String> {
        if self.refresh_token.is_empty() {
            return Err(SyncError::ConfigurationMissing("refresh token".to_string()));
        }
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
        ];
        let body = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::from_transport(e, "token refresh"))?
            .text()
            .await
            .map_err(|e| SyncError::from_transport(e, "token refresh"))?;
        let token: TokenResponse = serde_json::from_str(&body)?;
        info!("Access token refreshed");
        Ok(token.access_token)
    }
}
