//! Resolves an input pattern to shards and submits one run per shard.
//!
//! Enumeration and submission overlap: each match is handed to a task as soon
//! as it is listed, with at most `max_parallel` submissions in flight. The
//! first failure stops new submissions. Tasks already running are drained
//! before the error is returned.

use std::process::ExitCode;
use std::sync::Arc;

use deid_dispatch_api::{
    ApiResult,
    StorageClient,
};
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::task::{
    JoinError,
    JoinSet,
};
use tracing::{
    debug,
    error,
    info,
    warn,
};

use crate::enumerate;
use crate::error::{
    DispatchError,
    DispatchResult,
};
use crate::location::{
    self,
    StorageLocation,
};
use crate::shard::{
    self,
    MatchedShard,
    ShardPattern,
};
use crate::submitter::{
    JobHandle,
    JobSettings,
    Submitter,
};

pub const DEFAULT_MAX_PARALLEL: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchParams {
    /// `gs://bucket/dir/file-??-of-??`
    pub input_pattern: String,
    pub settings: JobSettings,
    pub max_parallel: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub matched: usize,
    pub submitted: Vec<(StorageLocation, JobHandle)>,
}

type ShardOutcome = (MatchedShard, ApiResult<JobHandle>);

#[derive(Default)]
struct Batch {
    summary: DispatchSummary,
    first_error: Option<DispatchError>,
}

impl Batch {
    fn aborted(&self) -> bool {
        self.first_error.is_some()
    }

    fn fail(&mut self, err: DispatchError) {
        if self.first_error.is_none() {
            self.first_error = Some(err);
        } else {
            warn!(error = %err, "Additional failure after batch abort");
        }
    }

    fn record(&mut self, joined: Result<ShardOutcome, JoinError>) {
        match joined {
            Ok((shard, Ok(handle))) => {
                self.summary.submitted.push((shard.full_location, handle));
            }
            Ok((shard, Err(source))) => {
                self.fail(DispatchError::Submission {
                    input: shard.full_location.to_string(),
                    source,
                });
            }
            Err(e) => {
                self.fail(DispatchError::Internal(format!(
                    "submission task failed: {e}"
                )));
            }
        }
    }

    /// Collects tasks that already finished without waiting on the rest
    fn reap(&mut self, tasks: &mut JoinSet<ShardOutcome>) {
        while let Some(joined) = tasks.try_join_next() {
            self.record(joined);
        }
    }
}

/// Lists the bucket named by `params.input_pattern` and submits every match.
///
/// Fails with `InvalidLocation` before contacting any service when the pattern
/// is malformed, and with `NoMatchingShards` when nothing matches.
pub async fn resolve_and_dispatch(
    params: &DispatchParams, storage: &dyn StorageClient, submitter: Arc<Submitter>,
) -> DispatchResult<DispatchSummary> {
    let location = location::parse(&params.input_pattern)?;
    let (directory, file_pattern) = location.split_file_name();
    let pattern = ShardPattern::compile(file_pattern)?;

    let bucket = enumerate::open_bucket(storage, &location.bucket).await?;
    let prefix = format!("{directory}{}", pattern.literal_prefix());

    info!(
        bucket = %location.bucket,
        %prefix,
        pattern = %pattern.as_str(),
        max_parallel = params.max_parallel,
        "Resolving shards"
    );

    let settings = Arc::new(params.settings.clone());
    let permits = params.max_parallel.clamp(1, Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(permits));
    let mut tasks: JoinSet<ShardOutcome> = JoinSet::new();
    let mut batch = Batch::default();
    let mut names = enumerate::list_names(bucket.as_ref(), &prefix);

    while let Some(listed) = names.next().await {
        batch.reap(&mut tasks);
        if batch.aborted() {
            break;
        }

        let object_name = match listed {
            Ok(name) => name,
            Err(e) => {
                batch.fail(e);
                break;
            }
        };

        let Some(matched) = shard::resolve(&location.bucket, directory, &pattern, &object_name)
        else {
            debug!(object = %object_name, "Skipping object outside the shard pattern");
            continue;
        };
        batch.summary.matched += 1;
        debug!(object = %matched.object_name, fields = ?matched.fields, "Matched shard");

        let permit = match Arc::clone(&semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                batch.fail(DispatchError::Internal(format!(
                    "submission limiter closed: {e}"
                )));
                break;
            }
        };

        // A submission may have failed while we waited for the permit
        batch.reap(&mut tasks);
        if batch.aborted() {
            break;
        }

        let submitter = Arc::clone(&submitter);
        let settings = Arc::clone(&settings);
        tasks.spawn(async move {
            let _permit = permit;
            let input = matched.full_location.to_string();
            let result = submitter.submit(&input, &settings).await;
            (matched, result)
        });
    }

    if batch.aborted() && !tasks.is_empty() {
        info!(
            in_flight = tasks.len(),
            "Batch aborted, waiting for in-flight submissions"
        );
    }
    while let Some(joined) = tasks.join_next().await {
        batch.record(joined);
    }

    if let Some(err) = batch.first_error {
        return Err(err);
    }

    if batch.summary.matched == 0 {
        return Err(DispatchError::NoMatchingShards(params.input_pattern.clone()));
    }

    Ok(batch.summary)
}

/// Runs [`resolve_and_dispatch`] and maps the outcome to a process status
pub async fn run_pipeline(
    params: &DispatchParams, storage: &dyn StorageClient, submitter: Arc<Submitter>,
) -> ExitStatus {
    match resolve_and_dispatch(params, storage, submitter).await {
        Ok(summary) => {
            info!(
                matched = summary.matched,
                submitted = summary.submitted.len(),
                "All shards dispatched"
            );
            ExitStatus::Success
        }
        Err(e) if e.is_local() => {
            error!(
                "Dispatch failed at {}: {e} (no remote service was contacted)",
                e.stage()
            );
            ExitStatus::Failure
        }
        Err(e) => {
            error!("Dispatch failed at {}: {e}", e.stage());
            ExitStatus::Failure
        }
    }
}
