//! Seams between the dispatch logic and the remote services it talks to.
//!
//! The coordinator in `deid-dispatch-core` only sees the traits defined here:
//! - [`StorageClient`] / [`Bucket`] - bucket lookup and lazy object listing
//! - [`PipelineApi`] - submission of one pipeline run request
//! - [`TokenProvider`] - bearer tokens for the HTTP adapters
//!
//! Concrete Google Cloud implementations live in `deid-dispatch-gcp`; tests
//! substitute in-memory fakes.

pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use credentials::TokenProvider;
pub use error::{
    ApiError,
    ApiResult,
};
pub use pipeline::{
    DockerExecutor,
    EphemeralPipeline,
    LoggingOptions,
    Operation,
    PipelineApi,
    PipelineArgs,
    PipelineRunRequest,
};
pub use storage::{
    BlobEntry,
    BlobStream,
    Bucket,
    StorageClient,
};
