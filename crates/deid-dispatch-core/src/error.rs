use deid_dispatch_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("No objects match {0}")]
    NoMatchingShards(String),

    #[error("Failed to look up bucket {bucket}: {source}")]
    Lookup {
        bucket: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to list objects: {0}")]
    Listing(#[source] ApiError),

    #[error("Failed to submit {input}: {source}")]
    Submission {
        input: String,
        #[source]
        source: ApiError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Stage of the run that produced the error, for diagnostics
    pub fn stage(&self) -> &'static str {
        match self {
            DispatchError::InvalidLocation(_) => "parse",
            DispatchError::BucketNotFound(_) | DispatchError::Lookup { .. } => "lookup",
            DispatchError::Listing(_) => "list",
            DispatchError::NoMatchingShards(_) => "match",
            DispatchError::Submission { .. } => "submit",
            DispatchError::Internal(_) => "dispatch",
        }
    }

    /// True for failures detected before any remote service was contacted
    pub fn is_local(&self) -> bool {
        matches!(self, DispatchError::InvalidLocation(_))
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
