//! Output module
//!
//! Handles Parquet encoding and partitioned table layout.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Encoding and decoding Parquet files in memory
//! - Splitting batches into Hive-style `col=value` partitions
//! - Committing whole tables with a `_SUCCESS` marker and reading them back

mod partition;
mod table_writer;
mod writer;

pub use partition::{
    attach_partition_columns, escape_value, split_by_partition, unescape_value, PartitionKey,
    DEFAULT_PARTITION,
};
pub use table_writer::{
    PartitionedTableWriter, SuccessMarker, WriteSummary, PART_FILE, STAGING_DIR, SUCCESS_MARKER,
};
pub use writer::{decode_parquet, encode_parquet, ParquetWriter, ParquetWriterConfig};
