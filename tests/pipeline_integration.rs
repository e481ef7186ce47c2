//! Integration tests over a local data lake
//!
//! Tests the full end-to-end flow: raw JSON files → two-phase run →
//! partitioned Parquet tables read back through the public API

use pretty_assertions::assert_eq;
use serde_json::json;
use sparkify_lake::cli::{Cli, Runner};
use sparkify_lake::output::{PartitionKey, DEFAULT_PARTITION, SUCCESS_MARKER};
use sparkify_lake::tables::{ArtistsRow, SongplayRow, SongsRow, TimeRow, UsersRow};
use sparkify_lake::{Error, Pipeline, PipelineConfig, PipelineReport, RunContext};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

// ============================================================================
// Fixtures
// ============================================================================

struct Lake {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn write_json_lines(path: &Path, lines: &[serde_json::Value]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: Vec<String> = lines.iter().map(ToString::to_string).collect();
    std::fs::write(path, body.join("\n")).unwrap();
}

fn song(
    song_id: Option<&str>,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    year: i64,
) -> serde_json::Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 218.93179,
        "year": year
    })
}

fn event(
    page: &str,
    user_id: &str,
    level: &str,
    song: Option<&str>,
    artist: Option<&str>,
    ts: i64,
) -> serde_json::Value {
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Jacob",
        "gender": "M",
        "itemInSession": 0,
        "lastName": "Klein",
        "length": 254.56281,
        "level": level,
        "location": "Tampa-St. Petersburg-Clearwater, FL",
        "method": "PUT",
        "page": page,
        "registration": 1_540_558_108_796.0,
        "sessionId": 954,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)",
        "userId": user_id
    })
}

fn lake() -> Lake {
    let dir = tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");

    let songs = input.join("song_data");
    write_json_lines(
        &songs.join("A/A/A/TRAAAAW128F429D538.json"),
        &[song(Some("S1"), "Test", "A1", "Artist", 2001)],
    );
    write_json_lines(
        &songs.join("A/A/B/TRAABJL12903CDCF1A.json"),
        &[song(Some("S2"), "Second", "A1", "Artist", 2001)],
    );
    write_json_lines(
        &songs.join("A/B/A/TRABACN128F425B784.json"),
        &[song(Some("S3"), "Solo", "A2", "Band", 0)],
    );
    write_json_lines(
        &songs.join("A/B/B/TRABBAM128F429D223.json"),
        &[song(None, "Nameless", "A3", "Ghost", 1999)],
    );

    let logs = input.join("log_data/2018/11");
    write_json_lines(
        &logs.join("2018-11-01-events.json"),
        &[
            event("NextSong", "39", "free", Some("Test"), Some("Artist"), 1_541_105_830_796),
            event("Home", "39", "free", None, None, 1_541_105_900_000),
            event("NextSong", "8", "free", Some("Unknown"), Some("Nobody"), 1_541_106_106_796),
        ],
    );
    write_json_lines(
        &logs.join("2018-11-30-events.json"),
        &[
            event("NextSong", "39", "paid", Some("Solo"), Some("Band"), 1_543_579_200_000),
            event("NextSong", "", "paid", Some("Solo"), Some("Band"), 1_543_579_260_000),
        ],
    );

    Lake {
        _dir: dir,
        input,
        output,
    }
}

fn config(lake: &Lake) -> PipelineConfig {
    let mut config = PipelineConfig::new(
        lake.input.display().to_string(),
        lake.output.display().to_string(),
    );
    config.workers = 2;
    config.shard_size = 2;
    config
}

async fn run(lake: &Lake) -> (Pipeline, PipelineReport) {
    let pipeline = Pipeline::new(config(lake)).unwrap();
    let report = pipeline.run().await.unwrap();
    (pipeline, report)
}

// ============================================================================
// End-to-End Tests
// ============================================================================

#[tokio::test]
async fn test_tables_and_partition_layout() {
    let lake = lake();
    let (_, report) = run(&lake).await;

    for dir in [
        "songs_table",
        "artists_table",
        "users_table",
        "time_table",
        "songplays_table",
    ] {
        assert!(lake.output.join(dir).join(SUCCESS_MARKER).is_file(), "{dir}");
    }

    let songs = lake.output.join("songs_table");
    assert!(songs.join("year=2001/artist_id=A1").is_dir());
    assert!(songs.join("year=0/artist_id=A2").is_dir());
    assert!(!songs.join("year=1999").exists());
    assert!(lake.output.join("time_table/year=2018/month=11").is_dir());
    assert!(lake.output.join("songplays_table/year=2018/month=11").is_dir());

    assert_eq!(report.rows("songs"), Some(3));
    assert_eq!(report.rows("artists"), Some(3));
    assert_eq!(report.rows("songplays"), Some(4));
    // one catalog record without song_id, one play without userId
    assert_eq!(report.schema_drops, 2);
    assert_eq!(report.non_song_events, 1);
    assert_eq!(report.unmatched_plays, 1);
    assert_eq!(report.parse_failures, 0);
}

#[tokio::test]
async fn test_songplays_match_catalog() {
    let lake = lake();
    let (pipeline, _) = run(&lake).await;

    let mut plays: Vec<SongplayRow> = pipeline.writer().read_table().await.unwrap();
    plays.sort_by_key(|p| p.start_time);

    let keys: Vec<(Option<&str>, Option<&str>)> = plays
        .iter()
        .map(|p| (p.song_id.as_deref(), p.artist_id.as_deref()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (Some("S1"), Some("A1")),
            (None, None),
            (Some("S3"), Some("A2")),
            (Some("S3"), Some("A2")),
        ]
    );

    assert_eq!(plays[3].user_id, None);
    let mut ids: Vec<i64> = plays.iter().map(|p| p.songplay_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_dimensions_content() {
    let lake = lake();
    let (pipeline, _) = run(&lake).await;
    let writer = pipeline.writer();

    let artists: Vec<ArtistsRow> = writer.read_table().await.unwrap();
    let mut artist_ids: Vec<&str> = artists.iter().map(|a| a.artist_id.as_str()).collect();
    artist_ids.sort_unstable();
    assert_eq!(artist_ids, vec!["A1", "A2", "A3"]);

    // user 39 appears once per level; the anonymous play has no user row
    let users: Vec<UsersRow> = writer.read_table().await.unwrap();
    let mut levels: Vec<(String, String)> = users
        .iter()
        .map(|u| (u.user_id.clone(), u.level.map(|l| l.to_string()).unwrap_or_default()))
        .collect();
    levels.sort();
    assert_eq!(
        levels,
        vec![
            ("39".to_string(), "free".to_string()),
            ("39".to_string(), "paid".to_string()),
            ("8".to_string(), "free".to_string()),
        ]
    );

    let time: Vec<TimeRow> = writer.read_table().await.unwrap();
    assert_eq!(time.len(), 4);
    for row in &time {
        let hour = row.hour_start().unwrap();
        let seconds = row.start_time.timestamp();
        assert_eq!(hour.timestamp(), seconds - seconds % 3600);
    }
}

#[tokio::test]
async fn test_partition_scan_finds_each_song() {
    let lake = lake();
    let (pipeline, _) = run(&lake).await;
    let writer = pipeline.writer();

    let all: Vec<SongsRow> = writer.read_table().await.unwrap();
    for song in &all {
        let year = song.year.to_string();
        let key = PartitionKey::new([
            ("year", Some(year.as_str())),
            ("artist_id", song.artist_id.as_deref()),
        ]);
        let rows: Vec<SongsRow> = writer.read_partition(&key).await.unwrap();
        assert!(rows.contains(song), "{} not in {key}", song.song_id);
    }
    assert!(!lake
        .output
        .join(format!("songs_table/year=0/artist_id={DEFAULT_PARTITION}"))
        .exists());
}

#[tokio::test]
async fn test_rerun_yields_identical_tables() {
    let lake = lake();
    let (pipeline, first) = run(&lake).await;
    let songs_before: Vec<SongsRow> = pipeline.writer().read_table().await.unwrap();
    let plays_before: Vec<SongplayRow> = pipeline.writer().read_table().await.unwrap();

    let (pipeline, second) = run(&lake).await;
    let songs_after: Vec<SongsRow> = pipeline.writer().read_table().await.unwrap();
    let plays_after: Vec<SongplayRow> = pipeline.writer().read_table().await.unwrap();

    assert_eq!(songs_before, songs_after);
    assert_eq!(plays_before, plays_after);
    assert_eq!(first.tables, second.tables);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[tokio::test]
async fn test_partial_catalog_write_detected() {
    let lake = lake();
    let ctx = RunContext::new(2, 2).unwrap();
    let pipeline = Pipeline::with_context(config(&lake), ctx).unwrap();

    let mut report = PipelineReport::default();
    let catalog = pipeline.run_catalog_phase(&mut report).await.unwrap();
    std::fs::remove_file(lake.output.join("artists_table").join(SUCCESS_MARKER)).unwrap();

    let err = pipeline
        .run_activity_phase(&mut report, &catalog)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PartialWrite { ref table, .. } if table == "artists"));
}

#[test]
fn test_unreachable_input_root() {
    let dir = tempdir().unwrap();
    let config = PipelineConfig::new(
        dir.path().join("nowhere").display().to_string(),
        dir.path().join("out").display().to_string(),
    );
    assert!(Pipeline::new(config).is_err());
}

#[tokio::test]
async fn test_no_activity_files_fails_after_catalog() {
    let lake = lake();
    std::fs::remove_dir_all(lake.input.join("log_data")).unwrap();

    let err = Pipeline::new(config(&lake)).unwrap().run().await.unwrap_err();
    assert!(matches!(err, Error::Stage { ref stage, .. } if stage == "log_data"));
    assert!(lake.output.join("songs_table").join(SUCCESS_MARKER).is_file());
}

#[tokio::test]
async fn test_runner_with_yaml_config() {
    use clap::Parser;

    let lake = lake();
    let path = lake.input.parent().unwrap().join("pipeline.yaml");
    std::fs::write(
        &path,
        format!(
            "input_root: {}\noutput_root: {}\nshard_size: 1\nparquet:\n  compression: zstd\n",
            lake.input.display(),
            lake.output.display()
        ),
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "sparkify-lake",
        "--config",
        path.to_str().unwrap(),
        "--format",
        "quiet",
    ])
    .unwrap();
    let report = Runner::new(cli).run().await.unwrap();
    assert_eq!(report.rows("songplays"), Some(4));
}
