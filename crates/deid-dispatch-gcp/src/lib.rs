//! Google Cloud adapters for deid-dispatch
//!
//! - `storage` - Cloud Storage JSON API client implementing `StorageClient`
//! - `genomics` - Genomics `pipelines:run` client implementing `PipelineApi`
//! - `auth` - bearer token providers
//! - `config` - endpoint and timeout settings read from the environment

pub mod auth;
pub mod config;
pub mod genomics;
mod http;
pub mod storage;
mod types;

pub use auth::{
    provider_from_env,
    GcloudTokenProvider,
    StaticTokenProvider,
};
pub use config::GcpSettings;
pub use genomics::GenomicsClient;
pub use http::build_http_client;
pub use storage::GcsClient;
