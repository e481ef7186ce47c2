//! Run summary

use crate::output::WriteSummary;
use crate::records::DecodeStats;
use serde::Serialize;
use tracing::info;

/// Rows and files committed for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
    pub files: usize,
    pub partitions: usize,
}

impl From<&WriteSummary> for TableReport {
    fn from(summary: &WriteSummary) -> Self {
        Self {
            table: summary.table.clone(),
            rows: summary.rows,
            files: summary.files,
            partitions: summary.partitions.len(),
        }
    }
}

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Identifier of the run
    pub run_id: String,
    /// Tables in commit order
    pub tables: Vec<TableReport>,
    /// Input files read, both families
    pub files_read: usize,
    /// Records decoded, both families
    pub records_read: usize,
    /// Lines rejected by the decoder
    pub parse_failures: usize,
    /// Activity records whose page is not `NextSong`
    pub non_song_events: usize,
    /// Records dropped because a required field was null
    pub schema_drops: usize,
    /// Song plays without a catalog match
    pub unmatched_plays: usize,
    /// Wall clock duration
    pub duration_ms: u64,
}

impl PipelineReport {
    /// Create an empty report for a run
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    /// Add decoder counters for one input family
    pub fn add_decoded(&mut self, stats: DecodeStats) {
        self.files_read += stats.files;
        self.records_read += stats.records;
        self.parse_failures += stats.failures;
    }

    /// Record a committed table
    pub fn add_table(&mut self, summary: &WriteSummary) {
        self.tables.push(TableReport::from(summary));
    }

    /// Rows committed for `table`
    pub fn rows(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.rows)
    }

    /// Log a one-line-per-table summary
    pub fn log_summary(&self) {
        for table in &self.tables {
            info!(
                "  {:<10} {:>8} rows {:>5} files {:>5} partitions",
                table.table, table.rows, table.files, table.partitions
            );
        }
        info!(
            "Run {} finished in {}ms: {} files, {} records, {} parse failures, {} schema drops, {} unmatched plays",
            self.run_id,
            self.duration_ms,
            self.files_read,
            self.records_read,
            self.parse_failures,
            self.schema_drops,
            self.unmatched_plays
        );
    }
}
