use std::time::Duration;

use deid_dispatch_api::{
    ApiError,
    ApiResult,
};

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_GENOMICS_ENDPOINT: &str = "https://genomics.googleapis.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Google APIs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpSettings {
    pub storage_endpoint: String,
    pub genomics_endpoint: String,
    pub timeout: Duration,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            storage_endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
            genomics_endpoint: DEFAULT_GENOMICS_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GcpSettings {
    /// Reads `DEID_STORAGE_ENDPOINT`, `DEID_GENOMICS_ENDPOINT` and
    /// `DEID_HTTP_TIMEOUT_SECS`, falling back to the public endpoints.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> ApiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let storage_endpoint = lookup("DEID_STORAGE_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.storage_endpoint);

        let genomics_endpoint = lookup("DEID_GENOMICS_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.genomics_endpoint);

        let timeout = match lookup("DEID_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ApiError::InvalidConfig(format!(
                        "DEID_HTTP_TIMEOUT_SECS must be a positive integer, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(ApiError::InvalidConfig(
                        "DEID_HTTP_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.timeout,
        };

        Ok(Self {
            storage_endpoint: storage_endpoint.trim_end_matches('/').to_string(),
            genomics_endpoint: genomics_endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings_from(pairs: &[(&str, &str)]) -> ApiResult<GcpSettings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GcpSettings::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings, GcpSettings::default());
    }

    #[test]
    fn test_overrides_trim_trailing_slash() {
        let settings = settings_from(&[
            ("DEID_STORAGE_ENDPOINT", "http://localhost:4443/"),
            ("DEID_GENOMICS_ENDPOINT", "http://localhost:9000"),
            ("DEID_HTTP_TIMEOUT_SECS", "5"),
        ])
        .unwrap();

        assert_eq!(settings.storage_endpoint, "http://localhost:4443");
        assert_eq!(settings.genomics_endpoint, "http://localhost:9000");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        assert!(matches!(
            settings_from(&[("DEID_HTTP_TIMEOUT_SECS", "soon")]),
            Err(ApiError::InvalidConfig(_))
        ));
        assert!(matches!(
            settings_from(&[("DEID_HTTP_TIMEOUT_SECS", "0")]),
            Err(ApiError::InvalidConfig(_))
        ));
    }
}
