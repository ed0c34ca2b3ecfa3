//! MBTiles tile store.
//!
//! Two ways to fill a store:
//!
//! - [`pack_directory`] walks a `<zoom>/<x>/<y>.<ext>` tree produced by the
//!   fetcher.
//! - [`LiveTileStoreWriter`] pulls every covering tile from a running
//!   rendering endpoint.
//!
//! Both delete an existing output file first and rebuild it completely.
//! Rows are stored in the TMS convention (`tile_row = 2^zoom - 1 - y`).

mod error;
mod live;
mod metadata;
mod pack;
mod store;

pub use error::{StoreError, StoreResult};
pub use live::{LiveTileStoreWriter, DEFAULT_CHANNEL_CAPACITY};
pub use metadata::{LayerType, TileStoreMetadata, COMPOSITE_NAME, DEFAULT_NAME};
pub use pack::{pack_directory, remove_source_directory, scan_tile_tree, TileFile};
pub use store::TileStore;

/// Counters for a store build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreReport {
    pub tiles_written: usize,
    /// Tiles the source could not provide (live mode only)
    pub tiles_failed: usize,
    pub bytes: u64,
    /// Set when cancellation stopped a live build early
    pub cancelled: bool,
}
