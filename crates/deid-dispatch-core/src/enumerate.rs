//! Bucket lookup and lazy object enumeration

use deid_dispatch_api::{
    ApiError,
    Bucket,
    StorageClient,
};
use futures::stream::{
    BoxStream,
    StreamExt,
    TryStreamExt,
};
use tracing::debug;

use crate::error::{
    DispatchError,
    DispatchResult,
};

/// Resolves a bucket handle, mapping "missing" and "forbidden" to
/// `BucketNotFound`.
pub async fn open_bucket(
    storage: &dyn StorageClient, bucket: &str,
) -> DispatchResult<Box<dyn Bucket>> {
    match storage.lookup_bucket(bucket).await {
        Ok(Some(handle)) => Ok(handle),
        Ok(None) | Err(ApiError::NotFound(_)) => {
            Err(DispatchError::BucketNotFound(bucket.to_string()))
        }
        Err(source) => Err(DispatchError::Lookup {
            bucket: bucket.to_string(),
            source,
        }),
    }
}

/// Streams object names under `prefix`. An empty stream is not an error.
pub fn list_names<'a>(
    bucket: &'a dyn Bucket, prefix: &str,
) -> BoxStream<'a, DispatchResult<String>> {
    debug!(bucket = %bucket.name(), %prefix, "Listing objects");

    bucket
        .list_blobs(prefix)
        .map_ok(|blob| blob.name)
        .map_err(DispatchError::Listing)
        .boxed()
}
