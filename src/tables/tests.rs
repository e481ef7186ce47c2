//! Tests for table row types and Arrow encoding

use super::*;
use crate::types::Level;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

fn artist(id: &str, location: Option<&str>, lat: Option<f64>) -> ArtistsRow {
    ArtistsRow {
        artist_id: id.to_string(),
        artist_name: Some("Artist".to_string()),
        artist_location: location.map(String::from),
        artist_latitude: lat,
        artist_longitude: None,
    }
}

// ============================================================================
// Distinct Tests
// ============================================================================

#[test]
fn test_distinct_keeps_first_occurrence_order() {
    let rows = vec![3, 1, 3, 2, 1];
    assert_eq!(distinct(rows), vec![3, 1, 2]);
}

#[test]
fn test_distinct_artists_by_full_tuple() {
    let rows = vec![
        artist("A1", Some("London"), Some(51.5)),
        artist("A1", Some("London"), Some(51.5)),
        artist("A1", Some("Paris"), Some(51.5)),
        artist("A2", None, None),
    ];

    let unique = distinct(rows);
    assert_eq!(unique.len(), 3);
    assert_eq!(unique[0].artist_location.as_deref(), Some("London"));
    assert_eq!(unique[1].artist_location.as_deref(), Some("Paris"));
}

#[test]
fn test_distinct_artists_signed_zero() {
    let rows = vec![artist("A1", None, Some(0.0)), artist("A1", None, Some(-0.0))];
    assert_eq!(distinct(rows).len(), 1);
}

#[test]
fn test_distinct_users_keeps_level_changes() {
    let user = |level| UsersRow {
        user_id: "15".to_string(),
        first_name: Some("Lily".to_string()),
        last_name: Some("Koch".to_string()),
        gender: Some("F".to_string()),
        level: Some(level),
    };

    let unique = distinct(vec![user(Level::Free), user(Level::Paid), user(Level::Free)]);
    assert_eq!(unique.len(), 2);
}

// ============================================================================
// Arrow Encoding Tests
// ============================================================================

#[test]
fn test_songs_batch_schema() {
    let rows = vec![SongsRow {
        song_id: "S1".to_string(),
        title: Some("Test".to_string()),
        artist_id: None,
        year: 0,
        duration: Some(218.93179),
    }];

    let batch = SongsRow::to_batch(&rows).unwrap();
    assert_eq!(batch.num_rows(), 1);
    assert_eq!(batch.schema(), SongsRow::schema());
    assert_eq!(SongsRow::from_batch(&batch).unwrap(), rows);
}

#[test]
fn test_songplays_batch_preserves_nulls() {
    let rows = vec![SongplayRow {
        songplay_id: 7,
        start_time: Utc.with_ymd_and_hms(2018, 11, 15, 8, 30, 0).unwrap(),
        month: 11,
        year: 2018,
        user_id: Some("26".to_string()),
        level: Some(Level::Paid),
        song_id: None,
        artist_id: None,
        session_id: Some(583),
        location: None,
        user_agent: Some("Mozilla/5.0".to_string()),
    }];

    let batch = SongplayRow::to_batch(&rows).unwrap();
    assert_eq!(batch.column_by_name("song_id").unwrap().null_count(), 1);
    assert_eq!(SongplayRow::from_batch(&batch).unwrap(), rows);
}

#[test]
fn test_time_batch_uses_utc_timestamp() {
    let rows = vec![TimeRow {
        start_time: Utc.with_ymd_and_hms(2018, 11, 1, 21, 1, 46).unwrap(),
        hour: 21,
        day: 1,
        week: 44,
        month: 11,
        year: 2018,
        weekday: 5,
    }];

    let batch = TimeRow::to_batch(&rows).unwrap();
    assert_eq!(
        batch.schema().field_with_name("start_time").unwrap().data_type(),
        &timestamp_type()
    );
    assert_eq!(TimeRow::from_batch(&batch).unwrap(), rows);
}

#[test]
fn test_from_batch_rejects_missing_column() {
    let batch = ArtistsRow::to_batch(&[artist("A1", None, None)]).unwrap();
    let projected = batch.project(&[0, 1]).unwrap();
    let err = ArtistsRow::from_batch(&projected).unwrap_err();
    assert!(err.to_string().contains("artist_location"));
}

#[test]
fn test_from_batch_rejects_null_key() {
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    let schema = Arc::new(Schema::new(vec![
        Field::new("user_id", DataType::Utf8, true),
        Field::new("first_name", DataType::Utf8, true),
        Field::new("last_name", DataType::Utf8, true),
        Field::new("gender", DataType::Utf8, true),
        Field::new("level", DataType::Utf8, true),
    ]));
    let column: ArrayRef = Arc::new(StringArray::from(vec![None::<&str>]));
    let batch = RecordBatch::try_new(schema, vec![column; 5]).unwrap();

    let err = UsersRow::from_batch(&batch).unwrap_err();
    assert!(matches!(
        err,
        crate::Error::Schema { ref table, ref field } if table == "users" && field == "user_id"
    ));
}

#[test]
fn test_empty_batch() {
    let batch = UsersRow::to_batch(&[]).unwrap();
    assert_eq!(batch.num_rows(), 0);
    assert!(UsersRow::from_batch(&batch).unwrap().is_empty());
}

#[test]
fn test_partition_columns_exist_in_schema() {
    fn check<T: Table>() {
        let schema = T::schema();
        for column in T::PARTITION_COLUMNS {
            assert!(schema.field_with_name(column).is_ok(), "{column}");
        }
    }
    check::<SongsRow>();
    check::<ArtistsRow>();
    check::<UsersRow>();
    check::<TimeRow>();
    check::<SongplayRow>();
}
