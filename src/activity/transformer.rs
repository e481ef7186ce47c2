//! Users and time table builds

use super::events::NextSongEvents;
use super::time::{start_time_from_millis, time_row};
use crate::context::RunContext;
use crate::records::ActivityRecord;
use crate::tables::{distinct, TableBuild, TimeRow, UsersRow};
use tracing::{debug, warn};

/// Builds the activity dimensions
#[derive(Debug, Clone)]
pub struct ActivityTransformer {
    ctx: RunContext,
}

impl ActivityTransformer {
    /// Create a transformer bound to a run
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Users with an id, distinct on the full tuple
    ///
    /// A user whose level changed appears once per level.
    pub fn build_users(&self, events: &NextSongEvents) -> TableBuild<UsersRow> {
        let shards = self.ctx.map_shards(events.as_slice(), |_, shard| {
            let mut dropped = 0;
            let rows = shard
                .iter()
                .filter_map(|record| {
                    let row = user_row(record);
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
            debug!(
                "users: skipped {} events with null user_id",
                build.dropped
            );
        }
        debug!("users: built {} distinct rows", build.rows.len());
        build
    }

    /// One time row per distinct `ts`
    pub fn build_time(&self, events: &NextSongEvents) -> TableBuild<TimeRow> {
        let shards = self.ctx.map_shards(events.as_slice(), |_, shard| {
            let timestamps = shard.iter().filter_map(|r| r.ts).collect::<Vec<_>>();
            let dropped = shard.len() - timestamps.len();
            TableBuild {
                rows: distinct(timestamps),
                dropped,
            }
        });

        let merged = TableBuild::merge(shards);
        let unique_ts = distinct(merged.rows);
        let mut dropped = merged.dropped;

        let rows = TableBuild::merge(self.ctx.map_shards(&unique_ts, |_, shard| {
            let mut out_of_range = 0;
            let rows = shard
                .iter()
                .filter_map(|&ts| {
                    let row = start_time_from_millis(ts).map(time_row);
                    out_of_range += usize::from(row.is_none());
                    row
                })
                .collect();
            TableBuild {
                rows,
                dropped: out_of_range,
            }
        }));
        dropped += rows.dropped;

        if dropped > 0 {
            warn!("time: dropped {dropped} events with null or out-of-range ts");
        }
        debug!("time: built {} rows", rows.rows.len());
        TableBuild {
            rows: rows.rows,
            dropped,
        }
    }
}

fn user_row(record: &ActivityRecord) -> Option<UsersRow> {
    let user_id = record.user_id.clone()?;
    Some(UsersRow {
        user_id,
        first_name: record.first_name.clone(),
        last_name: record.last_name.clone(),
        gender: record.gender.clone(),
        level: record.level,
    })
}
