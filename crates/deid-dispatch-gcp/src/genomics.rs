//! Genomics Pipelines API client

use std::sync::Arc;

use async_trait::async_trait;
use deid_dispatch_api::{
    ApiResult,
    Operation,
    PipelineApi,
    PipelineRunRequest,
    TokenProvider,
};
use reqwest::Client;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::http::{
    handle_response,
    network_error,
};
use crate::GcpSettings;

pub struct GenomicsClient {
    http: Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
}

impl GenomicsClient {
    pub fn new(http: Client, settings: &GcpSettings, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http,
            endpoint: settings.genomics_endpoint.clone(),
            tokens,
        }
    }
}

#[async_trait]
impl PipelineApi for GenomicsClient {
    async fn run_pipeline(&self, request: &PipelineRunRequest) -> ApiResult<Operation> {
        let url = run_url(&self.endpoint);
        let context = "Failed to run pipeline";
        let token = self.tokens.access_token().await?;

        debug!(
            project = %request.pipeline_args.project_id,
            image = %request.ephemeral_pipeline.docker.image_name,
            "Submitting pipeline run"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| network_error(context, e))?;

        handle_response(response, context).await
    }
}

pub(crate) fn run_url(endpoint: &str) -> String {
    format!("{endpoint}/v1alpha2/pipelines:run")
}
