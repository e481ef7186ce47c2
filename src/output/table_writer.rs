//! Partitioned table writes with a `_SUCCESS` commit marker
//!
//! A table is written in four steps:
//!
//! 1. every partition is encoded and staged under `_temporary/{run_id}/{dir}/`
//! 2. the marker and then the previous contents of `{dir}/` are deleted
//! 3. staged files are renamed into `{dir}/`
//! 4. `{dir}/_SUCCESS` is written, recording row and file counts
//!
//! Readers refuse a table without a marker, or whose files disagree with it,
//! so an interrupted write is reported instead of served.

use super::partition::{attach_partition_columns, split_by_partition, PartitionKey};
use super::writer::{decode_parquet, encode_parquet, ParquetWriterConfig};
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::tables::Table;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::path::Path as ObjectPath;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name of the commit marker inside a table directory
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Root of all staging locations
pub const STAGING_DIR: &str = "_temporary";

/// File name used for the single part of each partition
pub const PART_FILE: &str = "part-00000.parquet";

/// Contents of a table's `_SUCCESS` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessMarker {
    pub table: String,
    pub rows: usize,
    pub files: usize,
    pub run_id: String,
    pub committed_at: DateTime<Utc>,
}

/// Result of one table write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub table: String,
    pub rows: usize,
    pub files: usize,
    pub partitions: Vec<PartitionKey>,
}

/// Writes and reads partitioned Parquet tables under an output root
#[derive(Debug, Clone)]
pub struct PartitionedTableWriter {
    ctx: RunContext,
    storage: Storage,
    parquet: ParquetWriterConfig,
}

impl PartitionedTableWriter {
    /// Create a writer over an output root
    pub fn new(ctx: RunContext, storage: Storage, parquet: ParquetWriterConfig) -> Self {
        Self {
            ctx,
            storage,
            parquet,
        }
    }

    /// The output root
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Replace a table with `rows`
    pub async fn write_table<T: Table>(&self, rows: &[T]) -> Result<WriteSummary> {
        let batch = T::to_batch(rows)?;
        self.write_batch(T::NAME, T::DIRECTORY, &batch, T::PARTITION_COLUMNS)
            .await
    }

    /// Replace the table at `dir` with the rows of `batch`
    pub async fn write_batch(
        &self,
        table: &str,
        dir: &str,
        batch: &RecordBatch,
        partition_columns: &[&str],
    ) -> Result<WriteSummary> {
        let partitions = split_by_partition(batch, partition_columns)?;

        let encoded = self
            .ctx
            .map_shards(&partitions, |_, shard| {
                shard
                    .iter()
                    .map(|(_, part)| encode_parquet(part, &self.parquet))
                    .collect::<Vec<_>>()
            })
            .into_iter()
            .flatten()
            .collect::<Result<Vec<Bytes>>>()?;

        let staging = format!("{STAGING_DIR}/{}/{dir}", self.ctx.run_id());
        let mut moves = Vec::with_capacity(partitions.len());
        for ((key, part), data) in partitions.iter().zip(encoded) {
            let staged = part_path(&staging, key)?;
            debug!(
                "{table}: staging {} rows for {key} ({} bytes)",
                part.num_rows(),
                data.len()
            );
            self.storage.put(&staged, data).await?;
            moves.push((staged, part_path(dir, key)?));
        }

        let table_dir = ObjectPath::from(dir);
        let marker_path = marker_path(dir);
        self.storage.delete(&marker_path).await?;
        let removed = self.storage.delete_prefix(&table_dir).await?;
        if removed > 0 {
            debug!("{table}: removed {removed} files from previous write");
        }

        for (staged, target) in &moves {
            self.storage.rename(staged, target).await?;
        }
        self.storage
            .delete_prefix(&ObjectPath::from(staging.as_str()))
            .await?;

        let marker = SuccessMarker {
            table: table.to_string(),
            rows: batch.num_rows(),
            files: moves.len(),
            run_id: self.ctx.run_id().to_string(),
            committed_at: Utc::now(),
        };
        self.storage
            .put(&marker_path, Bytes::from(serde_json::to_vec_pretty(&marker)?))
            .await?;

        info!(
            "{table}: wrote {} rows in {} files to {}",
            marker.rows,
            marker.files,
            self.storage.url_for(&table_dir)
        );

        Ok(WriteSummary {
            table: table.to_string(),
            rows: marker.rows,
            files: marker.files,
            partitions: partitions.into_iter().map(|(key, _)| key).collect(),
        })
    }

    /// Read a committed table's marker
    pub async fn read_marker<T: Table>(&self) -> Result<SuccessMarker> {
        let path = marker_path(T::DIRECTORY);
        if !self.storage.exists(&path).await? {
            return Err(Error::partial_write(
                T::NAME,
                format!(
                    "no {SUCCESS_MARKER} marker at {}",
                    self.storage.url_for(&path)
                ),
            ));
        }
        let data = self.storage.get(&path).await?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Read every row of a committed table
    pub async fn read_table<T: Table>(&self) -> Result<Vec<T>> {
        let marker = self.read_marker::<T>().await?;
        let files = self.part_files::<T>().await?;

        if files.len() != marker.files {
            return Err(Error::partial_write(
                T::NAME,
                format!(
                    "marker lists {} files but {} are present",
                    marker.files,
                    files.len()
                ),
            ));
        }

        let mut rows = Vec::with_capacity(marker.rows);
        for (key, path) in &files {
            rows.extend(self.read_part::<T>(key, path).await?);
        }

        if rows.len() != marker.rows {
            return Err(Error::partial_write(
                T::NAME,
                format!("marker lists {} rows but {} were read", marker.rows, rows.len()),
            ));
        }

        debug!("{}: read {} rows from {} files", T::NAME, rows.len(), files.len());
        Ok(rows)
    }

    /// Read only the rows stored under one partition
    pub async fn read_partition<T: Table>(&self, key: &PartitionKey) -> Result<Vec<T>> {
        self.read_marker::<T>().await?;

        let dir = partition_dir(T::DIRECTORY, key)?;
        let mut rows = Vec::new();
        for path in self.storage.list(&dir).await? {
            if is_part_file(&path) {
                rows.extend(self.read_part::<T>(key, &path).await?);
            }
        }
        Ok(rows)
    }

    /// Every partition of a committed table, sorted
    pub async fn list_partitions<T: Table>(&self) -> Result<Vec<PartitionKey>> {
        self.read_marker::<T>().await?;
        let mut keys: Vec<PartitionKey> = self
            .part_files::<T>()
            .await?
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    /// Remove this run's staging area
    pub async fn cleanup_staging(&self) -> Result<()> {
        let staging = format!("{STAGING_DIR}/{}", self.ctx.run_id());
        self.storage
            .delete_prefix(&ObjectPath::from(staging.as_str()))
            .await?;
        Ok(())
    }

    async fn part_files<T: Table>(&self) -> Result<Vec<(PartitionKey, ObjectPath)>> {
        let listed = self.storage.list(&ObjectPath::from(T::DIRECTORY)).await?;
        listed
            .into_iter()
            .filter(is_part_file)
            .map(|path| {
                let parts: Vec<String> = path.parts().map(|p| p.as_ref().to_string()).collect();
                // {dir}/{partition dirs...}/{file}
                let dirs = parts
                    .get(1..parts.len().saturating_sub(1))
                    .unwrap_or_default();
                let key = PartitionKey::parse(dirs, T::PARTITION_COLUMNS)
                    .map_err(|e| Error::partial_write(T::NAME, format!("{path}: {e}")))?;
                Ok((key, path))
            })
            .collect()
    }

    async fn read_part<T: Table>(&self, key: &PartitionKey, path: &ObjectPath) -> Result<Vec<T>> {
        let data = self.storage.get(path).await?;
        let schema = T::schema();
        let mut rows = Vec::new();
        for batch in decode_parquet(data)? {
            let full = attach_partition_columns(&batch, key, &schema)?;
            rows.extend(T::from_batch(&full)?);
        }
        Ok(rows)
    }
}

fn marker_path(dir: &str) -> ObjectPath {
    ObjectPath::from(format!("{dir}/{SUCCESS_MARKER}"))
}

fn is_part_file(path: &ObjectPath) -> bool {
    path.filename()
        .is_some_and(|name| name.ends_with(".parquet"))
}

fn partition_dir(base: &str, key: &PartitionKey) -> Result<ObjectPath> {
    let joined = if key.is_root() {
        base.to_string()
    } else {
        format!("{base}/{}", key.relative_dir())
    };
    ObjectPath::parse(&joined)
        .map_err(|e| Error::output(format!("Invalid partition path {joined}: {e}")))
}

fn part_path(base: &str, key: &PartitionKey) -> Result<ObjectPath> {
    Ok(partition_dir(base, key)?.child(PART_FILE))
}
