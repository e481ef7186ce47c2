//! Songplay resolver
//!
//! Builds the `songplays` fact table by matching each song play event to a
//! catalog song on the exact (title, artist name) pair.
//!
//! # Overview
//!
//! - [`SongCatalog`]: (title, artist name) pairs kept from `song_data`
//! - [`SongIndex`]: lookup from (title, artist name) to song and artist ids
//! - [`MonotonicIdGenerator`]: surrogate `songplay_id` values
//! - [`SongplayResolver`]: the join itself
//!
//! Events without a match are kept with null `song_id` and `artist_id`.

mod index;
mod keys;
mod resolver;

pub use index::{CatalogEntry, SongCatalog, SongIndex, SongMatch};
pub use keys::MonotonicIdGenerator;
pub use resolver::{SongplayBuild, SongplayResolver};
