use std::time::Duration;

use deid_dispatch_api::{
    ApiError,
    ApiResult,
};
use reqwest::{
    Client,
    Response,
    StatusCode,
};

use crate::GcpSettings;

const USER_AGENT: &str = concat!("deid-dispatch/", env!("CARGO_PKG_VERSION"));

/// Builds the shared HTTP client used by the storage and genomics adapters
pub fn build_http_client(settings: &GcpSettings) -> ApiResult<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {e}")))
}

/// Maps non-success statuses to `ApiError` and decodes the JSON body
pub(crate) async fn handle_response<T: serde::de::DeserializeOwned>(
    response: Response, context: &str,
) -> ApiResult<T> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::AuthenticationFailed(format!(
            "{context} ({status}): {error_text}"
        )));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(context.to_string()));
    }

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ApiError::ApiError(format!(
            "{context} ({status}): {error_text}"
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::SerializationError(format!("{context}: {e}")))
}

pub(crate) fn network_error(context: &str, err: reqwest::Error) -> ApiError {
    ApiError::NetworkError(format!("{context}: {err}"))
}
