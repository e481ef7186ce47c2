//! Activity transformer
//!
//! Derives the `users` and `time` dimensions from activity records.
//!
//! # Overview
//!
//! Only `NextSong` events take part in any table build. The filter is
//! applied once by [`NextSongEvents::from_records`]; every consumer takes
//! that type rather than raw records.

mod events;
mod time;
mod transformer;

pub use events::NextSongEvents;
pub use time::{start_time_from_millis, time_row};
pub use transformer::ActivityTransformer;
