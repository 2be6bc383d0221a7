//! Shard resolution and dispatch for batch de-identification runs.
//!
//! A run takes an input pattern such as `gs://input/notes/file-??-of-??`,
//! lists the bucket, keeps the objects whose names fit the shard pattern and
//! submits one pipeline run per shard through [`Submitter`].

pub mod command;
pub mod dispatch;
pub mod enumerate;
pub mod error;
pub mod location;
pub mod logging;
pub mod shard;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

pub use dispatch::{
    resolve_and_dispatch,
    run_pipeline,
    DispatchParams,
    DispatchSummary,
    ExitStatus,
};
pub use error::{
    DispatchError,
    DispatchResult,
};
pub use location::StorageLocation;
pub use shard::{
    MatchedShard,
    ShardPattern,
};
pub use submitter::{
    ExecutionRequest,
    JobHandle,
    JobSettings,
    Submitter,
};
