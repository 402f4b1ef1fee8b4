//! Host document adapters.

pub mod snapshot_page;

pub use snapshot_page::{SnapshotPage, DEFAULT_SEGMENT_HEIGHT, DEFAULT_VIEWPORT_HEIGHT};
