use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{
    Deserialize,
    Serialize,
};

use crate::ApiResult;

/// A single listed object. Only the name is needed for shard resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub name: String,
}

impl BlobEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Lazy, unordered sequence of listed objects
pub type BlobStream<'a> = BoxStream<'a, ApiResult<BlobEntry>>;

/// Object storage client
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Resolves a bucket by name.
    ///
    /// Returns `Ok(None)` when the bucket does not exist or is not accessible
    /// to the caller. Transport and authentication failures are errors.
    async fn lookup_bucket(&self, name: &str) -> ApiResult<Option<Box<dyn Bucket>>>;
}

/// Handle to a resolved bucket
pub trait Bucket: Send + Sync {
    fn name(&self) -> &str;

    /// Lists objects whose names start with `prefix`.
    ///
    /// The stream is consumed incrementally; implementations backed by a
    /// paginated API fetch the next page only when the previous one is drained.
    fn list_blobs(&self, prefix: &str) -> BlobStream<'_>;
}
