//! Star schema row types
//!
//! Four dimension tables (songs, artists, users, time) and one fact table
//! (songplays). Rows are immutable once built.

use crate::error::Result;
use crate::types::Level;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A persisted table of typed rows
pub trait Table: Sized + Send + Sync + 'static {
    /// Logical table name
    const NAME: &'static str;

    /// Directory under the output root
    const DIRECTORY: &'static str;

    /// Columns encoded in the directory layout, outermost first
    const PARTITION_COLUMNS: &'static [&'static str];

    /// Full Arrow schema, partition columns included
    fn schema() -> SchemaRef;

    /// Encode rows as a single batch with [`Table::schema`]
    fn to_batch(rows: &[Self]) -> Result<RecordBatch>;

    /// Decode a batch carrying every column of [`Table::schema`]
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>>;
}

// ============================================================================
// Dimension Rows
// ============================================================================

/// A row of the `songs` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct SongsRow {
    pub song_id: String,
    pub title: Option<String>,
    pub artist_id: Option<String>,
    pub year: i32,
    pub duration: Option<f64>,
}

/// A row of the `artists` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistsRow {
    pub artist_id: String,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

// Floats compare by normalized bit pattern so tuple-distinct is well defined.
impl Eq for ArtistsRow {}

impl Hash for ArtistsRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.artist_id.hash(state);
        self.artist_name.hash(state);
        self.artist_location.hash(state);
        self.artist_latitude.map(float_key).hash(state);
        self.artist_longitude.map(float_key).hash(state);
    }
}

fn float_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

/// A row of the `users` dimension
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsersRow {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<Level>,
}

/// A row of the `time` dimension
///
/// `weekday` counts from 1 = Sunday to 7 = Saturday. `week` is the ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl TimeRow {
    /// Rebuild the start of the hour from the calendar fields
    pub fn hour_start(&self) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(
            self.year,
            self.month as u32,
            self.day as u32,
            self.hour as u32,
            0,
            0,
        )
        .single()
    }
}

// ============================================================================
// Fact Rows
// ============================================================================

/// A row of the `songplays` fact table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongplayRow {
    pub songplay_id: i64,
    pub start_time: DateTime<Utc>,
    pub month: i32,
    pub year: i32,
    pub user_id: Option<String>,
    pub level: Option<Level>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

// ============================================================================
// Relational Helpers
// ============================================================================

/// Drop repeated rows, keeping the first occurrence of each tuple
pub fn distinct<T: Eq + Hash + Clone>(rows: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Rows produced by a table build, with the count of inputs rejected
/// because a required field was null
#[derive(Debug, Clone, PartialEq)]
pub struct TableBuild<T> {
    pub rows: Vec<T>,
    pub dropped: usize,
}

impl<T> TableBuild<T> {
    /// Merge per-shard builds in shard order
    pub fn merge(shards: impl IntoIterator<Item = TableBuild<T>>) -> Self {
        let mut rows = Vec::new();
        let mut dropped = 0;
        for shard in shards {
            rows.extend(shard.rows);
            dropped += shard.dropped;
        }
        Self { rows, dropped }
    }
}
