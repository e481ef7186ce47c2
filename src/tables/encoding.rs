//! Arrow schemas and row <-> RecordBatch conversion for each table

use super::types::{ArtistsRow, SongplayRow, SongsRow, Table, TimeRow, UsersRow};
use crate::error::{Error, Result};
use crate::types::Level;
use arrow::array::{
    Array, ArrayRef, Float64Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use std::sync::{Arc, OnceLock};

/// Arrow type used for every `start_time` column
pub fn timestamp_type() -> DataType {
    DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))
}

// ============================================================================
// Schema Definitions
// ============================================================================

fn songs_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("song_id", DataType::Utf8, false),
                Field::new("title", DataType::Utf8, true),
                Field::new("artist_id", DataType::Utf8, true),
                Field::new("year", DataType::Int32, false),
                Field::new("duration", DataType::Float64, true),
            ]))
        })
        .clone()
}

fn artists_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("artist_id", DataType::Utf8, false),
                Field::new("artist_name", DataType::Utf8, true),
                Field::new("artist_location", DataType::Utf8, true),
                Field::new("artist_latitude", DataType::Float64, true),
                Field::new("artist_longitude", DataType::Float64, true),
            ]))
        })
        .clone()
}

fn users_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("user_id", DataType::Utf8, false),
                Field::new("first_name", DataType::Utf8, true),
                Field::new("last_name", DataType::Utf8, true),
                Field::new("gender", DataType::Utf8, true),
                Field::new("level", DataType::Utf8, true),
            ]))
        })
        .clone()
}

fn time_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("start_time", timestamp_type(), false),
                Field::new("hour", DataType::Int32, false),
                Field::new("day", DataType::Int32, false),
                Field::new("week", DataType::Int32, false),
                Field::new("month", DataType::Int32, false),
                Field::new("year", DataType::Int32, false),
                Field::new("weekday", DataType::Int32, false),
            ]))
        })
        .clone()
}

fn songplays_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            Arc::new(Schema::new(vec![
                Field::new("songplay_id", DataType::Int64, false),
                Field::new("start_time", timestamp_type(), false),
                Field::new("month", DataType::Int32, false),
                Field::new("year", DataType::Int32, false),
                Field::new("user_id", DataType::Utf8, true),
                Field::new("level", DataType::Utf8, true),
                Field::new("song_id", DataType::Utf8, true),
                Field::new("artist_id", DataType::Utf8, true),
                Field::new("session_id", DataType::Int64, true),
                Field::new("location", DataType::Utf8, true),
                Field::new("user_agent", DataType::Utf8, true),
            ]))
        })
        .clone()
}

// ============================================================================
// Table Implementations
// ============================================================================

impl Table for SongsRow {
    const NAME: &'static str = "songs";
    const DIRECTORY: &'static str = "songs_table";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "artist_id"];

    fn schema() -> SchemaRef {
        songs_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.song_id.as_str()),
            )),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.title.as_deref()))),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.artist_id.as_deref()),
            )),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Float64Array::from_iter(rows.iter().map(|r| r.duration))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let song_id = col_string(batch, "song_id")?;
        let title = col_string(batch, "title")?;
        let artist_id = col_string(batch, "artist_id")?;
        let year = col_i32(batch, "year")?;
        let duration = col_f64(batch, "duration")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(SongsRow {
                    song_id: required_string(song_id, row, Self::NAME, "song_id")?,
                    title: opt_string(title, row),
                    artist_id: opt_string(artist_id, row),
                    year: year.value(row),
                    duration: opt_f64(duration, row),
                })
            })
            .collect()
    }
}

impl Table for ArtistsRow {
    const NAME: &'static str = "artists";
    const DIRECTORY: &'static str = "artists_table";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        artists_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.artist_id.as_str()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.artist_name.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.artist_location.as_deref()),
            )),
            Arc::new(Float64Array::from_iter(
                rows.iter().map(|r| r.artist_latitude),
            )),
            Arc::new(Float64Array::from_iter(
                rows.iter().map(|r| r.artist_longitude),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let artist_id = col_string(batch, "artist_id")?;
        let artist_name = col_string(batch, "artist_name")?;
        let artist_location = col_string(batch, "artist_location")?;
        let latitude = col_f64(batch, "artist_latitude")?;
        let longitude = col_f64(batch, "artist_longitude")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(ArtistsRow {
                    artist_id: required_string(artist_id, row, Self::NAME, "artist_id")?,
                    artist_name: opt_string(artist_name, row),
                    artist_location: opt_string(artist_location, row),
                    artist_latitude: opt_f64(latitude, row),
                    artist_longitude: opt_f64(longitude, row),
                })
            })
            .collect()
    }
}

impl Table for UsersRow {
    const NAME: &'static str = "users";
    const DIRECTORY: &'static str = "users_table";
    const PARTITION_COLUMNS: &'static [&'static str] = &[];

    fn schema() -> SchemaRef {
        users_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.user_id.as_str()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.first_name.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.last_name.as_deref()),
            )),
            Arc::new(StringArray::from_iter(rows.iter().map(|r| r.gender.as_deref()))),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.level.map(Level::as_str)),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let user_id = col_string(batch, "user_id")?;
        let first_name = col_string(batch, "first_name")?;
        let last_name = col_string(batch, "last_name")?;
        let gender = col_string(batch, "gender")?;
        let level = col_string(batch, "level")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(UsersRow {
                    user_id: required_string(user_id, row, Self::NAME, "user_id")?,
                    first_name: opt_string(first_name, row),
                    last_name: opt_string(last_name, row),
                    gender: opt_string(gender, row),
                    level: opt_level(level, row)?,
                })
            })
            .collect()
    }
}

impl Table for TimeRow {
    const NAME: &'static str = "time";
    const DIRECTORY: &'static str = "time_table";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        time_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(timestamps(rows.iter().map(|r| r.start_time))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.hour))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.day))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.week))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.weekday))),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let start_time = col_timestamp(batch, "start_time")?;
        let hour = col_i32(batch, "hour")?;
        let day = col_i32(batch, "day")?;
        let week = col_i32(batch, "week")?;
        let month = col_i32(batch, "month")?;
        let year = col_i32(batch, "year")?;
        let weekday = col_i32(batch, "weekday")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(TimeRow {
                    start_time: timestamp_value(start_time, row)?,
                    hour: hour.value(row),
                    day: day.value(row),
                    week: week.value(row),
                    month: month.value(row),
                    year: year.value(row),
                    weekday: weekday.value(row),
                })
            })
            .collect()
    }
}

impl Table for SongplayRow {
    const NAME: &'static str = "songplays";
    const DIRECTORY: &'static str = "songplays_table";
    const PARTITION_COLUMNS: &'static [&'static str] = &["year", "month"];

    fn schema() -> SchemaRef {
        songplays_schema()
    }

    fn to_batch(rows: &[Self]) -> Result<RecordBatch> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(
                rows.iter().map(|r| r.songplay_id),
            )),
            Arc::new(timestamps(rows.iter().map(|r| r.start_time))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.month))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.user_id.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.level.map(Level::as_str)),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.song_id.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.artist_id.as_deref()),
            )),
            Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.session_id))),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.location.as_deref()),
            )),
            Arc::new(StringArray::from_iter(
                rows.iter().map(|r| r.user_agent.as_deref()),
            )),
        ];
        Ok(RecordBatch::try_new(Self::schema(), columns)?)
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>> {
        let songplay_id = col_i64(batch, "songplay_id")?;
        let start_time = col_timestamp(batch, "start_time")?;
        let month = col_i32(batch, "month")?;
        let year = col_i32(batch, "year")?;
        let user_id = col_string(batch, "user_id")?;
        let level = col_string(batch, "level")?;
        let song_id = col_string(batch, "song_id")?;
        let artist_id = col_string(batch, "artist_id")?;
        let session_id = col_i64(batch, "session_id")?;
        let location = col_string(batch, "location")?;
        let user_agent = col_string(batch, "user_agent")?;

        (0..batch.num_rows())
            .map(|row| {
                Ok(SongplayRow {
                    songplay_id: songplay_id.value(row),
                    start_time: timestamp_value(start_time, row)?,
                    month: month.value(row),
                    year: year.value(row),
                    user_id: opt_string(user_id, row),
                    level: opt_level(level, row)?,
                    song_id: opt_string(song_id, row),
                    artist_id: opt_string(artist_id, row),
                    session_id: (!session_id.is_null(row)).then(|| session_id.value(row)),
                    location: opt_string(location, row),
                    user_agent: opt_string(user_agent, row),
                })
            })
            .collect()
    }
}

// ============================================================================
// Column Helpers
// ============================================================================

fn timestamps(values: impl Iterator<Item = DateTime<Utc>>) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from_iter_values(values.map(|t| t.timestamp_micros()))
        .with_timezone("UTC")
}

fn column<'a, A: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a A> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::output(format!("missing column '{name}'")))?
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| Error::output(format!("column '{name}' has unexpected type")))
}

fn col_string<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    column::<StringArray>(batch, name)
}

fn col_i32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    column::<Int32Array>(batch, name)
}

fn col_i64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    column::<Int64Array>(batch, name)
}

fn col_f64<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    column::<Float64Array>(batch, name)
}

fn col_timestamp<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a TimestampMicrosecondArray> {
    column::<TimestampMicrosecondArray>(batch, name)
}

fn opt_string(arr: &StringArray, row: usize) -> Option<String> {
    (!arr.is_null(row)).then(|| arr.value(row).to_string())
}

fn required_string(arr: &StringArray, row: usize, table: &str, name: &str) -> Result<String> {
    opt_string(arr, row).ok_or_else(|| Error::schema(table, name))
}

fn opt_f64(arr: &Float64Array, row: usize) -> Option<f64> {
    (!arr.is_null(row)).then(|| arr.value(row))
}

fn opt_level(arr: &StringArray, row: usize) -> Result<Option<Level>> {
    if arr.is_null(row) {
        return Ok(None);
    }
    arr.value(row).parse().map(Some).map_err(Error::output)
}

fn timestamp_value(arr: &TimestampMicrosecondArray, row: usize) -> Result<DateTime<Utc>> {
    let micros = arr.value(row);
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::output(format!("timestamp out of range: {micros}")))
}
