//! Songs and artists table builds

use crate::context::RunContext;
use crate::records::CatalogRecord;
use crate::tables::{distinct, ArtistsRow, SongsRow, TableBuild};
use tracing::{debug, warn};

/// Builds the catalog dimensions
#[derive(Debug, Clone)]
pub struct CatalogTransformer {
    ctx: RunContext,
}

impl CatalogTransformer {
    /// Create a transformer bound to a run
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// One `SongsRow` per record with a song id
    ///
    /// Duplicates across input files are kept.
    pub fn build_songs(&self, records: &[CatalogRecord]) -> TableBuild<SongsRow> {
        let build = TableBuild::merge(self.ctx.map_shards(records, |_, shard| {
            let mut rows = Vec::with_capacity(shard.len());
            let mut dropped = 0;
            for record in shard {
                match song_row(record) {
                    Some(row) => rows.push(row),
                    None => dropped += 1,
                }
            }
            TableBuild { rows, dropped }
        }));

        if build.dropped > 0 {
            warn!(
                "songs: dropped {} catalog records with null song_id",
                build.dropped
            );
        }
        debug!("songs: built {} rows", build.rows.len());
        build
    }

    /// Artists with an id, distinct on the full tuple
    pub fn build_artists(&self, records: &[CatalogRecord]) -> TableBuild<ArtistsRow> {
        let shards = self.ctx.map_shards(records, |_, shard| {
            let mut dropped = 0;
            let rows = shard
                .iter()
                .filter_map(|record| {
                    let row = artist_row(record);
                    dropped += usize::from(row.is_none());
                    row
                })
                .collect::<Vec<_>>();
            TableBuild {
                rows: distinct(rows),
                dropped,
            }
        });

        let merged = TableBuild::merge(shards);
        let build = TableBuild {
            rows: distinct(merged.rows),
            dropped: merged.dropped,
        };

        if build.dropped > 0 {
            warn!(
                "artists: dropped {} catalog records with null artist_id",
                build.dropped
            );
        }
        debug!("artists: built {} distinct rows", build.rows.len());
        build
    }
}

fn song_row(record: &CatalogRecord) -> Option<SongsRow> {
    let song_id = record.song_id.clone()?;
    Some(SongsRow {
        song_id,
        title: record.title.clone(),
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    })
}

fn artist_row(record: &CatalogRecord) -> Option<ArtistsRow> {
    let artist_id = record.artist_id.clone()?;
    Some(ArtistsRow {
        artist_id,
        artist_name: record.artist_name.clone(),
        artist_location: record.artist_location.clone(),
        artist_latitude: record.artist_latitude,
        artist_longitude: record.artist_longitude,
    })
}
