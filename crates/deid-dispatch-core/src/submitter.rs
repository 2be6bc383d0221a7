//! Builds and submits one pipeline run per shard

use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};
use deid_dispatch_api::{
    ApiResult,
    DockerExecutor,
    EphemeralPipeline,
    LoggingOptions,
    PipelineApi,
    PipelineArgs,
    PipelineRunRequest,
};
use tracing::info;

use crate::command::build_command;

/// Container image holding `deid.pl` and `gsutil`
pub const DEID_IMAGE: &str = "gcr.io/genomics-api-test/physionet:latest";

/// Name given to every ephemeral pipeline submitted by this crate
pub const PIPELINE_NAME: &str = "deid";

/// Settings shared by every shard of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub output_directory: String,
    pub config_file: String,
    pub project_id: String,
    pub log_directory: String,
    pub dict_directory: Option<String>,
    pub lists_directory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub project_id: String,
    pub log_directory: String,
    pub image_reference: String,
    pub command_line: String,
    pub request_name: String,
}

impl ExecutionRequest {
    pub fn for_shard(input: &str, settings: &JobSettings) -> Self {
        Self {
            project_id: settings.project_id.clone(),
            log_directory: settings.log_directory.clone(),
            image_reference: DEID_IMAGE.to_string(),
            command_line: build_command(input, settings),
            request_name: PIPELINE_NAME.to_string(),
        }
    }
}

impl From<ExecutionRequest> for PipelineRunRequest {
    fn from(request: ExecutionRequest) -> Self {
        PipelineRunRequest {
            pipeline_args: PipelineArgs {
                project_id: request.project_id.clone(),
                logging: LoggingOptions {
                    gcs_path: request.log_directory,
                },
            },
            ephemeral_pipeline: EphemeralPipeline {
                project_id: request.project_id,
                docker: DockerExecutor {
                    cmd: request.command_line,
                    image_name: request.image_reference,
                },
                name: request.request_name,
            },
        }
    }
}

/// Accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Operation name returned by the pipelines API
    pub name: String,
    pub done: bool,
    pub submitted_at: DateTime<Utc>,
}

pub struct Submitter {
    api: Arc<dyn PipelineApi>,
}

impl Submitter {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self { api }
    }

    /// Submits one run for `input` and returns without waiting for it.
    ///
    /// API errors are returned as-is and never retried; a second submission
    /// would start a second billable run.
    pub async fn submit(&self, input: &str, settings: &JobSettings) -> ApiResult<JobHandle> {
        let request: PipelineRunRequest = ExecutionRequest::for_shard(input, settings).into();
        let operation = self.api.run_pipeline(&request).await?;

        info!(%input, operation = %operation.name, "Launched de-identification job");

        Ok(JobHandle {
            name: operation.name,
            done: operation.done,
            submitted_at: Utc::now(),
        })
    }
}
