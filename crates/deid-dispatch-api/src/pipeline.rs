//! Wire types for the Genomics `pipelines:run` call

use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};

use crate::ApiResult;

/// Request body for `pipelines:run` with an ephemeral pipeline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRunRequest {
    pub pipeline_args: PipelineArgs,
    pub ephemeral_pipeline: EphemeralPipeline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineArgs {
    pub project_id: String,
    pub logging: LoggingOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingOptions {
    /// Cloud Storage path that receives the run's stdout/stderr logs
    pub gcs_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralPipeline {
    pub project_id: String,
    pub docker: DockerExecutor,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerExecutor {
    /// Shell command run inside the container
    pub cmd: String,
    pub image_name: String,
}

/// Long-running operation returned by a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Remote pipeline execution API
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Submits one run request. Implementations must not retry: a resubmitted
    /// request may start a duplicate run.
    async fn run_pipeline(&self, request: &PipelineRunRequest) -> ApiResult<Operation>;
}
