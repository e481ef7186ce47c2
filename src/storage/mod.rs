//! Storage collaborators
//!
//! Object store access for both ends of the pipeline.
//!
//! # Overview
//!
//! This module provides:
//! - [`Storage`]: a rooted object store (local, S3, R2, GCS, Azure) with
//!   bounded retries on transient failures
//! - [`RecordSource`]: glob discovery and lazy file streaming for inputs
//! - [`RetryPolicy`]: backoff settings shared by every storage call

mod retry;
mod source;
mod store;

pub use retry::{retry, RetryPolicy};
pub use source::{GlobPattern, RawFile, RecordSource};
pub use store::{AccessMode, Storage};

#[cfg(test)]
mod tests;
