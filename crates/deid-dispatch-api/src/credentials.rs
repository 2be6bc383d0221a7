use async_trait::async_trait;
use secrecy::SecretString;

use crate::ApiResult;

/// Source of OAuth bearer tokens for the Google APIs.
///
/// Authentication itself is external; implementations only hand out a token
/// that is valid for the duration of one request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> ApiResult<SecretString>;
}
