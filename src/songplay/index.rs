//! Song lookup index keyed by (title, artist name)

use crate::records::CatalogRecord;
use crate::tables::{ArtistsRow, SongsRow};
use std::collections::{HashMap, HashSet};

/// Identity resolved for a song play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Exact, case-sensitive lookup from (title, artist name) to a song
///
/// When several songs share a key the first one inserted wins.
#[derive(Debug, Clone, Default)]
pub struct SongIndex {
    by_title: HashMap<String, HashMap<String, SongMatch>>,
    entries: usize,
}

/// Title and artist name of one catalog record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
}

/// The (title, artist name) pairs seen in `song_data`, in input order
///
/// Neither committed table carries a record's own pair: `songs` has the
/// title and `artists` has every name an artist id was given.
#[derive(Debug, Clone, Default)]
pub struct SongCatalog {
    entries: Vec<CatalogEntry>,
}

impl SongCatalog {
    /// Keep records that carry a song id, title, artist id and artist name
    pub fn from_records(records: &[CatalogRecord]) -> Self {
        let entries = records
            .iter()
            .filter_map(|record| {
                Some(CatalogEntry {
                    song_id: record.song_id.clone()?,
                    title: record.title.clone()?,
                    artist_id: record.artist_id.clone()?,
                    artist_name: record.artist_name.clone()?,
                })
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SongIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Index catalog entries whose song and artist are both committed
    ///
    /// Each key is the title and artist name of a single catalog record.
    /// Entries are taken in catalog order, so the first record wins a
    /// duplicate key.
    pub fn build(catalog: &SongCatalog, songs: &[SongsRow], artists: &[ArtistsRow]) -> Self {
        let committed_songs: HashSet<(&str, Option<&str>)> = songs
            .iter()
            .map(|song| (song.song_id.as_str(), song.artist_id.as_deref()))
            .collect();
        let committed_artists: HashSet<&str> =
            artists.iter().map(|artist| artist.artist_id.as_str()).collect();

        let mut index = Self::new();
        for entry in catalog.entries() {
            let song_key = (entry.song_id.as_str(), Some(entry.artist_id.as_str()));
            if committed_songs.contains(&song_key)
                && committed_artists.contains(entry.artist_id.as_str())
            {
                index.insert(
                    &entry.title,
                    &entry.artist_name,
                    &entry.song_id,
                    &entry.artist_id,
                );
            }
        }
        index
    }

    fn insert(&mut self, title: &str, artist_name: &str, song_id: &str, artist_id: &str) {
        let by_artist = self.by_title.entry(title.to_string()).or_default();
        if !by_artist.contains_key(artist_name) {
            by_artist.insert(
                artist_name.to_string(),
                SongMatch {
                    song_id: song_id.to_string(),
                    artist_id: artist_id.to_string(),
                },
            );
            self.entries += 1;
        }
    }

    /// Look up a song by exact title and artist name
    pub fn lookup(&self, title: &str, artist_name: &str) -> Option<&SongMatch> {
        self.by_title.get(title)?.get(artist_name)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the index has no keys
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}
