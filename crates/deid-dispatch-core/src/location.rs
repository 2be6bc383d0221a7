//! Parsing of `scheme://bucket/path` storage locations

use std::fmt;

use crate::error::{
    DispatchError,
    DispatchResult,
};

const SCHEME_DELIMITER: &str = "://";

/// Schemes the dispatcher can enumerate and hand to the transform
pub const SUPPORTED_SCHEMES: &[&str] = &["gs"];

/// Schemes that are well-formed but cannot be dispatched
const UNSUPPORTED_SCHEMES: &[&str] = &["s3", "az", "file", "http", "https"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLocation {
    pub scheme: String,
    pub bucket: String,
    pub path: String,
}

impl StorageLocation {
    /// Location of an object in a Cloud Storage bucket
    pub fn gcs(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: "gs".to_string(),
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.split_file_name().1
    }

    /// Everything up to and including the last `/` of the path, or `""`
    pub fn parent(&self) -> &str {
        self.split_file_name().0
    }

    pub fn split_file_name(&self) -> (&str, &str) {
        match self.path.rfind('/') {
            Some(idx) => self.path.split_at(idx + 1),
            None => ("", self.path.as_str()),
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SCHEME_DELIMITER}{}/{}",
            self.scheme, self.bucket, self.path
        )
    }
}

/// Parses `scheme://bucket/path`.
///
/// Both the bucket and the object path must be non-empty, so a bare
/// `gs://bucket` is rejected.
pub fn parse(location: &str) -> DispatchResult<StorageLocation> {
    let (scheme, rest) = location.split_once(SCHEME_DELIMITER).ok_or_else(|| {
        DispatchError::InvalidLocation(format!(
            "{location}: expected scheme://bucket/path"
        ))
    })?;

    if !SUPPORTED_SCHEMES.contains(&scheme) {
        let reason = if UNSUPPORTED_SCHEMES.contains(&scheme) {
            "unsupported scheme"
        } else {
            "unrecognized scheme"
        };
        return Err(DispatchError::InvalidLocation(format!(
            "{location}: {reason} '{scheme}', expected one of {}",
            SUPPORTED_SCHEMES.join(", ")
        )));
    }

    let (bucket, path) = rest.split_once('/').ok_or_else(|| {
        DispatchError::InvalidLocation(format!("{location}: missing object path after bucket"))
    })?;

    if bucket.is_empty() {
        return Err(DispatchError::InvalidLocation(format!(
            "{location}: missing bucket name"
        )));
    }

    if path.is_empty() {
        return Err(DispatchError::InvalidLocation(format!(
            "{location}: missing object path after bucket"
        )));
    }

    Ok(StorageLocation {
        scheme: scheme.to_string(),
        bucket: bucket.to_string(),
        path: path.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_and_path() {
        let loc = parse("gs://input/file-??-of-??").unwrap();
        assert_eq!(loc.scheme, "gs");
        assert_eq!(loc.bucket, "input");
        assert_eq!(loc.path, "file-??-of-??");
    }

    #[test]
    fn test_parse_keeps_nested_path_verbatim() {
        let loc = parse("gs://my-bucket/a/b//c.txt").unwrap();
        assert_eq!(loc.bucket, "my-bucket");
        assert_eq!(loc.path, "a/b//c.txt");
        assert_eq!(loc.to_string(), "gs://my-bucket/a/b//c.txt");
    }

    #[test]
    fn test_bucket_without_path_is_invalid() {
        for input in ["gs://onlybucketname", "gs://bucket/"] {
            assert!(
                matches!(parse(input), Err(DispatchError::InvalidLocation(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_bucket_is_invalid() {
        assert!(matches!(
            parse("gs:///file"),
            Err(DispatchError::InvalidLocation(_))
        ));
    }

    #[test]
    fn test_missing_delimiter_is_invalid() {
        for input in ["input/file", "gs:/input/file", "", "gs//input/file"] {
            assert!(
                matches!(parse(input), Err(DispatchError::InvalidLocation(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_unsupported_and_unknown_schemes() {
        let err = parse("s3://not-gcs/path").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 's3'"));

        let err = parse("ftp://host/path").unwrap_err();
        assert!(err.to_string().contains("unrecognized scheme 'ftp'"));
    }

    #[test]
    fn test_split_file_name() {
        let loc = StorageLocation::gcs("b", "notes/2017/file-??");
        assert_eq!(loc.parent(), "notes/2017/");
        assert_eq!(loc.file_name(), "file-??");

        let flat = StorageLocation::gcs("b", "file-??");
        assert_eq!(flat.parent(), "");
        assert_eq!(flat.file_name(), "file-??");
    }
}
