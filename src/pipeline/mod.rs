//! Pipeline orchestrator
//!
//! Runs the two phases of a load against one input root and one output
//! root.
//!
//! # Overview
//!
//! - Phase 1 reads `song_data`, then builds and commits `songs` and
//!   `artists`.
//! - Phase 2 starts only after both Phase 1 tables are committed. It reads
//!   `log_data`, commits `users` and `time`, reads `songs` and `artists`
//!   back, indexes the catalog pairs whose song and artist were committed,
//!   then resolves and commits `songplays`.
//!
//! Any failure aborts the run. Record-level problems (bad lines, null
//! required fields, unmatched plays) are counted in the [`PipelineReport`]
//! instead.

mod report;

pub use report::{PipelineReport, TableReport};

use crate::activity::{ActivityTransformer, NextSongEvents};
use crate::catalog::CatalogTransformer;
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::output::{ParquetWriterConfig, PartitionedTableWriter};
use crate::records::{decode_lines, ActivityRecord, CatalogRecord, DecodeStats, RawRecord};
use crate::songplay::{SongCatalog, SongIndex, SongplayResolver};
use crate::storage::{AccessMode, GlobPattern, RecordSource, RetryPolicy, Storage};
use crate::tables::{ArtistsRow, SongsRow};
use futures::TryStreamExt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One configured load from input root to output root
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    ctx: RunContext,
    source: RecordSource,
    writer: PartitionedTableWriter,
}

impl Pipeline {
    /// Validate `config`, open both roots and build the worker pool
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let ctx = RunContext::from_config(&config)?;
        Self::with_context(config, ctx)
    }

    /// Like [`Pipeline::new`] with a caller-supplied run context
    pub fn with_context(config: PipelineConfig, ctx: RunContext) -> Result<Self> {
        config.validate()?;
        let policy = RetryPolicy::from_config(&config.retry);

        let input = Storage::open(&config.input_root, &config.credentials, AccessMode::Read)?
            .with_retry(policy.clone());
        let output = Storage::open(&config.output_root, &config.credentials, AccessMode::Write)?
            .with_retry(policy);

        let writer = PartitionedTableWriter::new(
            ctx.clone(),
            output,
            ParquetWriterConfig::from_config(&config.parquet),
        );

        Ok(Self {
            config,
            ctx,
            source: RecordSource::new(input),
            writer,
        })
    }

    /// The run context
    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// The table writer for the output root
    pub fn writer(&self) -> &PartitionedTableWriter {
        &self.writer
    }

    /// Run both phases
    pub async fn run(&self) -> Result<PipelineReport> {
        let started = Instant::now();
        let mut report = PipelineReport::new(self.ctx.run_id());
        info!(
            "Starting run {} with {} workers",
            self.ctx.run_id(),
            self.ctx.workers()
        );

        let catalog = self.run_catalog_phase(&mut report).await?;
        // Phase 2 reads what Phase 1 committed
        self.run_activity_phase(&mut report, &catalog).await?;
        self.writer.cleanup_staging().await?;

        report.duration_ms = started.elapsed().as_millis() as u64;
        report.log_summary();
        Ok(report)
    }

    /// Phase 1: `songs` and `artists`
    ///
    /// Returns the catalog's (title, artist name) pairs for song matching.
    pub async fn run_catalog_phase(&self, report: &mut PipelineReport) -> Result<SongCatalog> {
        info!("Phase 1: catalog");
        let (records, stats) = self
            .load_records::<CatalogRecord>(&self.config.song_data_glob)
            .await?;
        report.add_decoded(stats);

        let transformer = CatalogTransformer::new(self.ctx.clone());

        let songs = transformer.build_songs(&records);
        report.schema_drops += songs.dropped;
        let summary = self.writer.write_table(&songs.rows).await?;
        report.add_table(&summary);

        let artists = transformer.build_artists(&records);
        report.schema_drops += artists.dropped;
        let summary = self.writer.write_table(&artists.rows).await?;
        report.add_table(&summary);

        Ok(SongCatalog::from_records(&records))
    }

    /// Phase 2: `users`, `time` and `songplays`
    pub async fn run_activity_phase(
        &self,
        report: &mut PipelineReport,
        catalog: &SongCatalog,
    ) -> Result<()> {
        info!("Phase 2: activity");
        let (records, stats) = self
            .load_records::<ActivityRecord>(&self.config.log_data_glob)
            .await?;
        report.add_decoded(stats);

        let events = NextSongEvents::from_records(records);
        report.non_song_events += events.filtered_out();
        info!(
            "{} NextSong events ({} other events skipped)",
            events.len(),
            events.filtered_out()
        );

        let transformer = ActivityTransformer::new(self.ctx.clone());

        let users = transformer.build_users(&events);
        report.schema_drops += users.dropped;
        let summary = self.writer.write_table(&users.rows).await?;
        report.add_table(&summary);

        let time = transformer.build_time(&events);
        report.schema_drops += time.dropped;
        let summary = self.writer.write_table(&time.rows).await?;
        report.add_table(&summary);

        let index = self.load_song_index(catalog).await?;
        let songplays = SongplayResolver::new(self.ctx.clone(), index).resolve(&events);
        report.schema_drops += songplays.dropped;
        report.unmatched_plays += songplays.unmatched;
        let summary = self.writer.write_table(&songplays.rows).await?;
        report.add_table(&summary);

        Ok(())
    }

    /// Build the song index against the committed `songs` and `artists` tables
    async fn load_song_index(&self, catalog: &SongCatalog) -> Result<SongIndex> {
        let songs: Vec<SongsRow> = self.writer.read_table().await?;
        let artists: Vec<ArtistsRow> = self.writer.read_table().await?;
        let index = SongIndex::build(catalog, &songs, &artists);
        debug!(
            "Song index: {} keys from {} songs and {} artists",
            index.len(),
            songs.len(),
            artists.len()
        );
        Ok(index)
    }

    /// Discover, fetch and decode every file of one input family
    async fn load_records<R: RawRecord>(&self, glob: &str) -> Result<(Vec<R>, DecodeStats)> {
        let pattern = GlobPattern::new(glob)?;
        let paths = self.source.discover(&pattern).await?;
        if paths.is_empty() {
            return Err(Error::stage(
                R::FAMILY.to_string(),
                format!("no input files match {}", pattern.as_str()),
            ));
        }
        info!("Reading {} {} files", paths.len(), R::FAMILY);

        let mut records = Vec::new();
        let mut stats = DecodeStats::default();
        let mut files = self.source.files(paths);
        while let Some(file) = files.try_next().await? {
            let decoded = decode_lines::<R>(&file.path, &file.body);
            for failure in &decoded.failures {
                warn!("Skipping record: {failure}");
            }
            stats += decoded.stats();
            records.extend(decoded.records);
        }

        info!(
            "{}: {} records from {} files, {} unreadable lines",
            R::FAMILY,
            stats.records,
            stats.files,
            stats.failures
        );
        Ok((records, stats))
    }
}
