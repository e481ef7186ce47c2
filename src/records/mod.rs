//! Raw record models
//!
//! Typed representations of the two input families:
//! - [`CatalogRecord`]: one song with its artist, from `song_data/`
//! - [`ActivityRecord`]: one user event, from `log_data/`
//!
//! # Overview
//!
//! Raw files are newline-delimited JSON. Each line decodes independently;
//! a malformed line is counted and skipped, never fatal to the run.

mod decoder;
mod types;

pub use decoder::{decode_lines, DecodeStats, DecodedFile};
pub use types::{ActivityRecord, CatalogRecord, RawRecord};
