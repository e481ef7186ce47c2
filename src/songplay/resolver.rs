//! Equi-join of song play events against the song index

use super::index::SongIndex;
use super::keys::MonotonicIdGenerator;
use crate::activity::{start_time_from_millis, NextSongEvents};
use crate::context::RunContext;
use crate::records::ActivityRecord;
use crate::tables::SongplayRow;
use chrono::Datelike;
use tracing::{debug, info, warn};

/// Output of a songplay resolution
#[derive(Debug, Clone, Default)]
pub struct SongplayBuild {
    pub rows: Vec<SongplayRow>,
    /// Events dropped for a null or out-of-range `ts`
    pub dropped: usize,
    /// Rows emitted with null song and artist ids
    pub unmatched: usize,
}

/// Resolves song play events into fact rows
#[derive(Debug, Clone)]
pub struct SongplayResolver {
    ctx: RunContext,
    index: SongIndex,
}

impl SongplayResolver {
    /// Create a resolver over a prepared index
    pub fn new(ctx: RunContext, index: SongIndex) -> Self {
        Self { ctx, index }
    }

    /// The index used for matching
    pub fn index(&self) -> &SongIndex {
        &self.index
    }

    /// Emit one fact row per event with a timestamp
    pub fn resolve(&self, events: &NextSongEvents) -> SongplayBuild {
        let shards = self.ctx.map_shards(events.as_slice(), |shard, records| {
            let mut ids = MonotonicIdGenerator::for_shard(shard);
            let mut build = SongplayBuild::default();
            for record in records {
                match self.resolve_one(record, &mut ids) {
                    Some((row, matched)) => {
                        build.unmatched += usize::from(!matched);
                        build.rows.push(row);
                    }
                    None => build.dropped += 1,
                }
            }
            build
        });

        let mut build = SongplayBuild::default();
        for shard in shards {
            build.rows.extend(shard.rows);
            build.dropped += shard.dropped;
            build.unmatched += shard.unmatched;
        }

        if build.dropped > 0 {
            warn!(
                "songplays: dropped {} events with null or out-of-range ts",
                build.dropped
            );
        }
        info!(
            "songplays: resolved {} of {} plays against {} catalog keys",
            build.rows.len() - build.unmatched,
            build.rows.len(),
            self.index.len()
        );
        build
    }

    fn resolve_one(
        &self,
        record: &ActivityRecord,
        ids: &mut MonotonicIdGenerator,
    ) -> Option<(SongplayRow, bool)> {
        let start_time = record.ts.and_then(start_time_from_millis)?;

        let matched = match (record.song.as_deref(), record.artist.as_deref()) {
            (Some(title), Some(artist)) => self.index.lookup(title, artist),
            _ => None,
        };
        if matched.is_none() {
            debug!(
                "songplays: no catalog match for {:?} by {:?}",
                record.song, record.artist
            );
        }

        let row = SongplayRow {
            songplay_id: ids.next_id(),
            start_time,
            month: start_time.month() as i32,
            year: start_time.year(),
            user_id: record.user_id.clone(),
            level: record.level,
            song_id: matched.map(|m| m.song_id.clone()),
            artist_id: matched.map(|m| m.artist_id.clone()),
            session_id: record.session_id,
            location: record.location.clone(),
            user_agent: record.user_agent.clone(),
        };
        Some((row, matched.is_some()))
    }
}
