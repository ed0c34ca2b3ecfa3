//! SQLite-backed MBTiles container.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use super::error::{StoreError, StoreResult};
use super::metadata::TileStoreMetadata;
use crate::coord::TileCoord;

const SCHEMA: &str = "
    CREATE TABLE metadata (name TEXT, value TEXT);
    CREATE UNIQUE INDEX name ON metadata (name);
    CREATE TABLE tiles (
        zoom_level INTEGER,
        tile_column INTEGER,
        tile_row INTEGER,
        tile_data BLOB
    );
    CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);
";

/// An MBTiles file.
///
/// Tiles go in and come out addressed in XYZ; rows are stored flipped to
/// TMS as the format requires.
pub struct TileStore {
    conn: Connection,
    path: PathBuf,
}

impl TileStore {
    /// Creates an empty store at `path`, deleting any existing file first.
    pub fn create(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            fs::remove_file(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Deleted existing tile store");
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path).map_err(|source| StoreError::StoreWriteFailure {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            path: path.to_path_buf(),
        };
        store
            .conn
            .execute_batch(SCHEMA)
            .map_err(|e| store.write_failure(e))?;

        debug!(path = %path.display(), "Created tile store");
        Ok(store)
    }

    /// Opens an existing store read-only.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |source| StoreError::StoreReadFailure {
                path: path.to_path_buf(),
                source,
            },
        )?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces every metadata row.
    pub fn write_metadata(&mut self, metadata: &TileStoreMetadata) -> StoreResult<()> {
        let tx = self.conn.transaction().map_err(|e| write_failure(&self.path, e))?;
        tx.execute("DELETE FROM metadata", [])
            .map_err(|e| write_failure(&self.path, e))?;
        for (name, value) in metadata.rows() {
            tx.execute(
                "INSERT OR REPLACE INTO metadata (name, value) VALUES (?1, ?2)",
                params![name, value],
            )
            .map_err(|e| write_failure(&self.path, e))?;
        }
        tx.commit().map_err(|e| write_failure(&self.path, e))
    }

    /// Inserts one tile, replacing any tile at the same address.
    pub fn insert_tile(&self, tile: &TileCoord, data: &[u8]) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![tile.zoom, tile.x, tile.tms_y(), data],
            )
            .map_err(|e| self.write_failure(e))?;
        Ok(())
    }

    /// Inserts a batch of tiles in one transaction.
    pub fn insert_batch(&mut self, tiles: &[(TileCoord, Vec<u8>)]) -> StoreResult<()> {
        let tx = self.conn.transaction().map_err(|e| write_failure(&self.path, e))?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) \
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(|e| write_failure(&self.path, e))?;
            for (tile, data) in tiles {
                stmt.execute(params![tile.zoom, tile.x, tile.tms_y(), data])
                    .map_err(|e| write_failure(&self.path, e))?;
            }
        }
        tx.commit().map_err(|e| write_failure(&self.path, e))
    }

    /// Looks a tile up by its XYZ address.
    pub fn get_tile(&self, tile: &TileCoord) -> StoreResult<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT tile_data FROM tiles \
                 WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
                params![tile.zoom, tile.x, tile.tms_y()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| self.read_failure(e))
    }

    pub fn metadata(&self) -> StoreResult<BTreeMap<String, String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, value FROM metadata")
            .map_err(|e| self.read_failure(e))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| self.read_failure(e))?;
        rows.collect::<Result<BTreeMap<_, _>, _>>()
            .map_err(|e| self.read_failure(e))
    }

    pub fn tile_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get(0))
            .map_err(|e| self.read_failure(e))?;
        Ok(count.max(0) as u64)
    }

    /// Lowest and highest zoom level holding tiles.
    pub fn zoom_range(&self) -> StoreResult<Option<(u8, u8)>> {
        let range: (Option<u8>, Option<u8>) = self
            .conn
            .query_row(
                "SELECT MIN(zoom_level), MAX(zoom_level) FROM tiles",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| self.read_failure(e))?;
        Ok(match range {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    fn write_failure(&self, source: rusqlite::Error) -> StoreError {
        write_failure(&self.path, source)
    }

    fn read_failure(&self, source: rusqlite::Error) -> StoreError {
        StoreError::StoreReadFailure {
            path: self.path.clone(),
            source,
        }
    }
}

fn write_failure(path: &Path, source: rusqlite::Error) -> StoreError {
    StoreError::StoreWriteFailure {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_flips_row_to_tms() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("flip.mbtiles");
        let store = TileStore::create(&path).unwrap();

        store.insert_tile(&TileCoord::new(5, 10, 12), b"tile").unwrap();

        let (zoom, column, row): (u8, u32, u32) = store
            .conn
            .query_row(
                "SELECT zoom_level, tile_column, tile_row FROM tiles",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!((zoom, column, row), (5, 10, 19));
    }

    #[test]
    fn test_get_tile_by_xyz_address() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("get.mbtiles");
        let store = TileStore::create(&path).unwrap();
        store.insert_tile(&TileCoord::new(3, 1, 2), b"abc").unwrap();
        drop(store);

        let store = TileStore::open(&path).unwrap();
        assert_eq!(
            store.get_tile(&TileCoord::new(3, 1, 2)).unwrap(),
            Some(b"abc".to_vec())
        );
        assert_eq!(store.get_tile(&TileCoord::new(3, 1, 5)).unwrap(), None);
        assert_eq!(store.tile_count().unwrap(), 1);
        assert_eq!(store.zoom_range().unwrap(), Some((3, 3)));
    }

    #[test]
    fn test_insert_replaces_duplicate_address() {
        let temp = TempDir::new().unwrap();
        let mut store = TileStore::create(&temp.path().join("dup.mbtiles")).unwrap();
        let tile = TileCoord::new(2, 1, 1);

        store.insert_tile(&tile, b"old").unwrap();
        store.insert_batch(&[(tile, b"new".to_vec())]).unwrap();

        assert_eq!(store.tile_count().unwrap(), 1);
        assert_eq!(store.get_tile(&tile).unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_create_deletes_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("again.mbtiles");

        let store = TileStore::create(&path).unwrap();
        store.insert_tile(&TileCoord::new(1, 0, 0), b"x").unwrap();
        drop(store);

        let store = TileStore::create(&path).unwrap();
        assert_eq!(store.tile_count().unwrap(), 0);
        assert_eq!(store.zoom_range().unwrap(), None);
    }

    #[test]
    fn test_metadata_rows_are_replaced() {
        let temp = TempDir::new().unwrap();
        let mut store = TileStore::create(&temp.path().join("meta.mbtiles")).unwrap();

        store.write_metadata(&TileStoreMetadata::named("first")).unwrap();
        store
            .write_metadata(&TileStoreMetadata::composite(Some("attr")))
            .unwrap();

        let metadata = store.metadata().unwrap();
        assert_eq!(metadata["name"], "Composite change detection raster map");
        assert_eq!(metadata["type"], "baselayer");
        assert_eq!(metadata["attribution"], "attr");
    }

    #[test]
    fn test_open_missing_store_fails() {
        let temp = TempDir::new().unwrap();
        let result = TileStore::open(&temp.path().join("missing.mbtiles"));
        assert!(matches!(result, Err(StoreError::StoreReadFailure { .. })));
    }
}
