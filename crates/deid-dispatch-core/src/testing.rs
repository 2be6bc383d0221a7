//! In-memory storage and pipeline fakes for unit tests

use std::sync::atomic::{
    AtomicUsize,
    Ordering,
};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use deid_dispatch_api::{
    ApiError,
    ApiResult,
    BlobEntry,
    BlobStream,
    Bucket,
    Operation,
    PipelineApi,
    PipelineRunRequest,
    StorageClient,
};
use futures::stream::{
    self,
    StreamExt,
};

pub(crate) struct FakeStorage {
    bucket: String,
    names: Vec<String>,
    lookup_error: bool,
    listing_error_after: Option<usize>,
    lookups: AtomicUsize,
}

impl FakeStorage {
    pub fn new(bucket: &str, names: &[&str]) -> Self {
        Self {
            bucket: bucket.to_string(),
            names: names.iter().map(|n| n.to_string()).collect(),
            lookup_error: false,
            listing_error_after: None,
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn with_lookup_error(mut self) -> Self {
        self.lookup_error = true;
        self
    }

    /// Listing yields `count` names, then fails
    pub fn with_listing_error_after(mut self, count: usize) -> Self {
        self.listing_error_after = Some(count);
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn lookup_bucket(&self, name: &str) -> ApiResult<Option<Box<dyn Bucket>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookup_error {
            return Err(ApiError::NetworkError("connection reset".to_string()));
        }
        if name != self.bucket {
            return Ok(None);
        }
        Ok(Some(Box::new(FakeBucket {
            name: self.bucket.clone(),
            names: self.names.clone(),
            listing_error_after: self.listing_error_after,
        })))
    }
}

struct FakeBucket {
    name: String,
    names: Vec<String>,
    listing_error_after: Option<usize>,
}

impl Bucket for FakeBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_blobs(&self, prefix: &str) -> BlobStream<'_> {
        let mut items: Vec<ApiResult<BlobEntry>> = self
            .names
            .iter()
            .filter(|n| n.starts_with(prefix))
            .map(|n| Ok(BlobEntry::new(n.clone())))
            .collect();

        if let Some(count) = self.listing_error_after {
            items.truncate(count);
            items.push(Err(ApiError::ApiError("listing interrupted".to_string())));
        }

        stream::iter(items).boxed()
    }
}

/// Records every request; optionally fails for one input or sleeps per call
pub(crate) struct RecordingPipelineApi {
    requests: Mutex<Vec<PipelineRunRequest>>,
    fail_on: Option<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl RecordingPipelineApi {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_on: None,
            delay: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(input: &str) -> Self {
        Self {
            fail_on: Some(input.to_string()),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<PipelineRunRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Input location of every submitted request, sorted
    pub fn submitted_inputs(&self) -> Vec<String> {
        let mut inputs: Vec<String> = self
            .requests()
            .iter()
            .filter_map(|r| input_of(&r.ephemeral_pipeline.docker.cmd))
            .collect();
        inputs.sort();
        inputs
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

fn input_of(cmd: &str) -> Option<String> {
    cmd.split(" && ")
        .find(|step| step.ends_with(" input.text"))
        .and_then(|step| step.split_whitespace().nth(2))
        .map(str::to_string)
}

#[async_trait]
impl PipelineApi for RecordingPipelineApi {
    async fn run_pipeline(&self, request: &PipelineRunRequest) -> ApiResult<Operation> {
        let number = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let input = input_of(&request.ephemeral_pipeline.docker.cmd);
        if input.is_some() && input == self.fail_on {
            return Err(ApiError::ApiError("request rejected".to_string()));
        }

        Ok(Operation {
            name: format!("operations/{number}"),
            done: false,
        })
    }
}
