//! Hive-style partition layout
//!
//! A partitioned table stores rows under `col=value/...` directories. The
//! partition columns are removed from the files and restored on read from
//! the directory names.

use crate::error::{Error, Result};
use arrow::array::{new_null_array, Array, ArrayRef, StringArray, UInt32Array};
use arrow::compute::{cast, take_record_batch};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Directory value used for null partition values
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// The partition column values identifying one directory of a table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PartitionKey {
    segments: Vec<(String, Option<String>)>,
}

impl PartitionKey {
    /// The key of an unpartitioned table
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a key from `(column, value)` pairs, outermost first
    pub fn new<I, C, V>(segments: I) -> Self
    where
        I: IntoIterator<Item = (C, Option<V>)>,
        C: Into<String>,
        V: Into<String>,
    {
        Self {
            segments: segments
                .into_iter()
                .map(|(column, value)| (column.into(), value.map(Into::into)))
                .collect(),
        }
    }

    /// Parse directory names such as `year=2018` back into a key
    ///
    /// The directory names must name `columns` in order.
    pub fn parse<S: AsRef<str>>(dirs: &[S], columns: &[&str]) -> Result<Self> {
        if dirs.len() != columns.len() {
            return Err(Error::output(format!(
                "Expected {} partition directories, found {}",
                columns.len(),
                dirs.len()
            )));
        }

        let mut segments = Vec::with_capacity(columns.len());
        for (dir, column) in dirs.iter().zip(columns) {
            let dir = dir.as_ref();
            let value = dir
                .strip_prefix(column)
                .and_then(|rest| rest.strip_prefix('='))
                .ok_or_else(|| {
                    Error::output(format!("Partition directory '{dir}' is not {column}=<value>"))
                })?;
            let value = (value != DEFAULT_PARTITION).then(|| unescape_value(value));
            segments.push(((*column).to_string(), value));
        }
        Ok(Self { segments })
    }

    /// Value of a partition column, `None` when null or absent
    pub fn value(&self, column: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    /// `(column, value)` pairs, outermost first
    pub fn segments(&self) -> &[(String, Option<String>)] {
        &self.segments
    }

    /// Whether this is the key of an unpartitioned table
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Escaped directory names, outermost first
    pub fn dir_names(&self) -> Vec<String> {
        self.segments
            .iter()
            .map(|(column, value)| match value {
                Some(value) => format!("{column}={}", escape_value(value)),
                None => format!("{column}={DEFAULT_PARTITION}"),
            })
            .collect()
    }

    /// Relative directory, empty for the root key
    pub fn relative_dir(&self) -> String {
        self.dir_names().join("/")
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.relative_dir())
        }
    }
}

// ============================================================================
// Value Escaping
// ============================================================================

fn needs_escape(c: char) -> bool {
    c.is_control() || "\"#%'*/:=?\\{}[]^`~<>|".contains(c)
}

/// Percent-escape characters that cannot appear in a directory name
pub fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                escaped.push_str(&format!("%{byte:02X}"));
            }
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Reverse [`escape_value`]; malformed escapes are kept literally
pub fn unescape_value(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let high = char::from(bytes[i + 1]).to_digit(16);
            let low = char::from(bytes[i + 2]).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                out.push((high * 16 + low) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ============================================================================
// Batch Splitting
// ============================================================================

/// Split a batch into one batch per partition key
///
/// Returned batches no longer carry the partition columns. Keys come back in
/// sorted order and rows keep their relative order within a partition. A
/// batch with no partition columns yields a single root entry, even when
/// empty.
pub fn split_by_partition(
    batch: &RecordBatch,
    columns: &[&str],
) -> Result<Vec<(PartitionKey, RecordBatch)>> {
    let schema = batch.schema();
    let partition_indices = columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| Error::output(format!("Partition column '{name}' not in batch")))
        })
        .collect::<Result<Vec<_>>>()?;
    let data_indices: Vec<usize> = (0..schema.fields().len())
        .filter(|i| !partition_indices.contains(i))
        .collect();

    if columns.is_empty() {
        return Ok(vec![(PartitionKey::root(), batch.project(&data_indices)?)]);
    }

    let mut groups: BTreeMap<Vec<Option<String>>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let values = partition_indices
            .iter()
            .map(|&i| {
                let array = batch.column(i);
                if array.is_null(row) {
                    Ok(None)
                } else {
                    array_value_to_string(array, row).map(Some)
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let row = u32::try_from(row)
            .map_err(|_| Error::output("Batch too large to partition".to_string()))?;
        groups.entry(values).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(values, rows)| {
            let key = PartitionKey::new(columns.iter().copied().zip(values));
            let taken = take_record_batch(batch, &UInt32Array::from(rows))?;
            Ok((key, taken.project(&data_indices)?))
        })
        .collect()
}

/// Rebuild a full-schema batch from a partition file and its key
pub fn attach_partition_columns(
    batch: &RecordBatch,
    key: &PartitionKey,
    schema: &SchemaRef,
) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            if let Some((_, value)) = key.segments().iter().find(|(column, _)| column == name) {
                return Ok(match value {
                    Some(value) => {
                        let strings: ArrayRef =
                            Arc::new(StringArray::from(vec![value.as_str(); rows]));
                        cast(&strings, field.data_type())?
                    }
                    None => new_null_array(field.data_type(), rows),
                });
            }
            batch
                .column_by_name(name)
                .cloned()
                .ok_or_else(|| Error::output(format!("Column '{name}' missing from file")))
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
