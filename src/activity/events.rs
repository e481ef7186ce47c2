//! Song play event filter

use crate::records::ActivityRecord;

/// Activity records whose page is `NextSong`
#[derive(Debug, Clone, Default)]
pub struct NextSongEvents {
    records: Vec<ActivityRecord>,
    filtered_out: usize,
}

impl NextSongEvents {
    /// Keep only song play events
    pub fn from_records(records: impl IntoIterator<Item = ActivityRecord>) -> Self {
        let mut kept = Vec::new();
        let mut filtered_out = 0;
        for record in records {
            if record.is_song_play() {
                kept.push(record);
            } else {
                filtered_out += 1;
            }
        }
        Self {
            records: kept,
            filtered_out,
        }
    }

    /// The retained events, in input order
    pub fn as_slice(&self) -> &[ActivityRecord] {
        &self.records
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no events were retained
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records rejected by the page filter
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }
}
