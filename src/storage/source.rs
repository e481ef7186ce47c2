//! Input discovery and lazy file streaming

use super::store::Storage;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use object_store::path::Path as ObjectPath;
use regex::Regex;
use tracing::debug;

/// A path glob where `*` and `?` never cross a `/`
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
    literal_prefix: String,
}

impl GlobPattern {
    /// Compile a glob such as `song_data/*/*/*/*.json`
    pub fn new(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::invalid_value("glob", "pattern is empty"));
        }

        let mut expr = String::from("^");
        for c in trimmed.chars() {
            match c {
                '*' => expr.push_str("[^/]*"),
                '?' => expr.push_str("[^/]"),
                other => expr.push_str(&regex::escape(&other.to_string())),
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr)
            .map_err(|e| Error::invalid_value("glob", format!("{pattern}: {e}")))?;

        // Directories before the first wildcard can be listed directly
        let literal_prefix = trimmed
            .split('/')
            .take_while(|segment| !segment.contains(['*', '?']))
            .collect::<Vec<_>>()
            .join("/");

        Ok(Self {
            raw: trimmed.to_string(),
            regex,
            literal_prefix,
        })
    }

    /// Whether a root-relative path matches
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Longest wildcard-free directory prefix
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    /// The pattern as given
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// One raw input file
#[derive(Debug, Clone)]
pub struct RawFile {
    /// Path relative to the input root
    pub path: String,
    pub body: Bytes,
}

/// Discovers and streams raw input files from a storage root
#[derive(Debug, Clone)]
pub struct RecordSource {
    storage: Storage,
}

impl RecordSource {
    /// Create a source over an input root
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// The underlying storage
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// All files matching `pattern`, sorted by path
    pub async fn discover(&self, pattern: &GlobPattern) -> Result<Vec<ObjectPath>> {
        let listed = self
            .storage
            .list(&ObjectPath::from(pattern.literal_prefix()))
            .await?;

        let matched: Vec<ObjectPath> = listed
            .into_iter()
            .filter(|path| pattern.matches(path.as_ref()))
            .collect();

        debug!(
            "{} files match {}",
            matched.len(),
            self.storage.url_for(&ObjectPath::from(pattern.as_str()))
        );
        Ok(matched)
    }

    /// Fetch files one at a time, in order, as the stream is polled
    pub fn files(&self, paths: Vec<ObjectPath>) -> BoxStream<'_, Result<RawFile>> {
        stream::iter(paths)
            .then(move |path| async move {
                let body = self.storage.get(&path).await?;
                Ok::<_, Error>(RawFile {
                    path: path.to_string(),
                    body,
                })
            })
            .boxed()
    }
}
