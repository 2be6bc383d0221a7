//! Bearer token providers

use std::sync::Arc;

use async_trait::async_trait;
use deid_dispatch_api::{
    ApiError,
    ApiResult,
    TokenProvider,
};
use secrecy::{
    ExposeSecret,
    SecretString,
};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

pub const ACCESS_TOKEN_ENV: &str = "DEID_ACCESS_TOKEN";

/// Hands out a fixed token, e.g. one minted by the caller's CI environment
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> ApiResult<SecretString> {
        Ok(self.token.expose_secret().to_owned().into())
    }
}

/// Asks the local `gcloud` installation for application credentials.
///
/// The token is fetched once and reused for the rest of the process, which is
/// far shorter than the token lifetime for a dispatch run.
pub struct GcloudTokenProvider {
    program: String,
    token: OnceCell<SecretString>,
}

impl Default for GcloudTokenProvider {
    fn default() -> Self {
        Self::new("gcloud")
    }
}

impl GcloudTokenProvider {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            token: OnceCell::new(),
        }
    }

    async fn fetch(&self) -> ApiResult<SecretString> {
        debug!(program = %self.program, "Requesting access token");

        let output = Command::new(&self.program)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| {
                ApiError::AuthenticationFailed(format!("Failed to run {}: {e}", self.program))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApiError::AuthenticationFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let token = String::from_utf8(output.stdout)
            .map_err(|e| ApiError::AuthenticationFailed(format!("Token is not UTF-8: {e}")))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::AuthenticationFailed(format!(
                "{} returned an empty token",
                self.program
            )));
        }

        Ok(token.to_string().into())
    }
}

#[async_trait]
impl TokenProvider for GcloudTokenProvider {
    async fn access_token(&self) -> ApiResult<SecretString> {
        let token = self.token.get_or_try_init(|| self.fetch()).await?;
        Ok(token.expose_secret().to_owned().into())
    }
}

/// Uses `DEID_ACCESS_TOKEN` when set, otherwise `gcloud`
pub fn provider_from_env() -> Arc<dyn TokenProvider> {
    match std::env::var(ACCESS_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => {
            debug!("Using access token from {ACCESS_TOKEN_ENV}");
            Arc::new(StaticTokenProvider::new(token.trim()))
        }
        _ => Arc::new(GcloudTokenProvider::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_returns_token() {
        let provider = StaticTokenProvider::new("ya29.token");
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.expose_secret(), "ya29.token");
    }

    #[tokio::test]
    async fn test_gcloud_provider_missing_program() {
        let provider = GcloudTokenProvider::new("definitely-not-an-installed-gcloud");
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed(_)));
    }
}
