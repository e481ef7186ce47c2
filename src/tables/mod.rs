//! Star schema tables
//!
//! Row types for the five output tables and their Arrow encoding.
//!
//! | table     | directory         | partitioned by    |
//! |-----------|-------------------|-------------------|
//! | songs     | `songs_table`     | year, artist_id   |
//! | artists   | `artists_table`   |                   |
//! | users     | `users_table`     |                   |
//! | time      | `time_table`      | year, month       |
//! | songplays | `songplays_table` | year, month       |

mod encoding;
mod types;

pub use encoding::timestamp_type;
pub use types::{
    distinct, ArtistsRow, SongplayRow, SongsRow, Table, TableBuild, TimeRow, UsersRow,
};

#[cfg(test)]
mod tests;
