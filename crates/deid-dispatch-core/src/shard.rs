//! Shard filename patterns such as `file-??-of-??`.
//!
//! Every run of `?` is a fixed-width numeric field: `??` accepts exactly two
//! ASCII digits. All other characters must match literally. The compiled form
//! is an anchored `regex::Regex`, so matching is linear in the input length.

use regex::Regex;

use crate::error::{
    DispatchError,
    DispatchResult,
};
use crate::location::StorageLocation;

pub const WILDCARD: char = '?';

/// Widest field whose value still fits in a `u64`
const MAX_FIELD_WIDTH: usize = 19;

#[derive(Debug, Clone)]
pub struct ShardPattern {
    source: String,
    widths: Vec<usize>,
    regex: Regex,
}

impl ShardPattern {
    pub fn compile(pattern: &str) -> DispatchResult<Self> {
        if pattern.is_empty() {
            return Err(DispatchError::InvalidLocation(
                "empty shard pattern".to_string(),
            ));
        }
        if pattern.contains('/') {
            return Err(DispatchError::InvalidLocation(format!(
                "shard pattern '{pattern}' must be a single path segment"
            )));
        }

        let mut expr = String::with_capacity(pattern.len() * 2 + 2);
        let mut widths = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        expr.push('^');
        while let Some(c) = chars.next() {
            if c != WILDCARD {
                literal.push(c);
                continue;
            }

            let mut width = 1;
            while chars.next_if_eq(&WILDCARD).is_some() {
                width += 1;
            }
            if width > MAX_FIELD_WIDTH {
                return Err(DispatchError::InvalidLocation(format!(
                    "shard pattern '{pattern}' has a {width}-digit field, at most \
                     {MAX_FIELD_WIDTH} are supported"
                )));
            }

            expr.push_str(&regex::escape(&literal));
            literal.clear();
            expr.push_str(&format!("([0-9]{{{width}}})"));
            widths.push(width);
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| {
            DispatchError::InvalidLocation(format!("shard pattern '{pattern}': {e}"))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            widths,
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Digit width of each wildcard group, in order
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Text before the first wildcard; narrows the listing prefix
    pub fn literal_prefix(&self) -> &str {
        match self.source.find(WILDCARD) {
            Some(idx) => &self.source[..idx],
            None => &self.source,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Values of the wildcard groups when `name` matches
    pub fn capture(&self, name: &str) -> Option<Vec<u64>> {
        let caps = self.regex.captures(name)?;
        caps.iter()
            .skip(1)
            .map(|group| group.and_then(|m| m.as_str().parse().ok()))
            .collect()
    }
}

/// Listed object that fits the shard pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedShard {
    pub object_name: String,
    pub full_location: StorageLocation,
    /// Numeric wildcard values, e.g. `[1, 2]` for `file-01-of-02`
    pub fields: Vec<u64>,
}

/// Resolves a listed object name against the pattern.
///
/// The name must sit directly under `directory`; objects in deeper
/// sub-directories never match because the pattern cannot contain `/`.
pub fn resolve(
    bucket: &str, directory: &str, pattern: &ShardPattern, object_name: &str,
) -> Option<MatchedShard> {
    let file_name = object_name.strip_prefix(directory)?;
    let fields = pattern.capture(file_name)?;

    Some(MatchedShard {
        object_name: object_name.to_string(),
        full_location: StorageLocation::gcs(bucket, object_name),
        fields,
    })
}
