//! Directory mode: package a `<zoom>/<x>/<y>.<ext>` tree into a store.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::error::{StoreError, StoreResult};
use super::metadata::TileStoreMetadata;
use super::store::TileStore;
use super::StoreReport;
use crate::coord::{tile_to_lat_lon, TileCoord, MAX_ZOOM};
use crate::extent::BoundingBox;
use crate::fetch::TileSetMetadata;

/// Tiles per insert transaction.
const BATCH_SIZE: usize = 512;

/// A tile file found while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFile {
    pub tile: TileCoord,
    pub path: PathBuf,
    pub extension: String,
}

/// Packages a tile tree into a new store at `output`.
///
/// The existing output file, if any, is deleted first. When the tree holds a
/// `metadata.json` sidecar its values fill whatever `metadata` leaves unset.
/// `format`, `minzoom`, `maxzoom` and `bounds` are derived from the tiles
/// found when still missing.
///
/// Files that do not follow the `<zoom>/<x>/<y>.<ext>` layout, or whose
/// indices fall outside their zoom level, are logged and ignored.
pub fn pack_directory(
    dir: &Path,
    output: &Path,
    metadata: &TileStoreMetadata,
) -> StoreResult<StoreReport> {
    if !dir.is_dir() {
        return Err(StoreError::SourceNotFound(dir.to_path_buf()));
    }

    let files = scan_tile_tree(dir)?;
    info!(
        dir = %dir.display(),
        output = %output.display(),
        tiles = files.len(),
        "Packaging tile directory"
    );

    let mut merged = metadata.clone();
    if let Some(sidecar) = TileSetMetadata::read_from(dir)? {
        debug!(name = %sidecar.name, "Using tile set sidecar metadata");
        merged = merged.or(sidecar.into());
    }
    let merged = merged.or(derived_metadata(&files));

    let mut store = TileStore::create(output)?;
    store.write_metadata(&merged)?;

    let mut report = StoreReport::default();
    for chunk in files.chunks(BATCH_SIZE) {
        let mut batch = Vec::with_capacity(chunk.len());
        for file in chunk {
            let data = fs::read(&file.path).map_err(|source| StoreError::Io {
                path: file.path.clone(),
                source,
            })?;
            report.bytes += data.len() as u64;
            batch.push((file.tile, data));
        }
        store.insert_batch(&batch)?;
        report.tiles_written += batch.len();
    }

    info!(
        output = %output.display(),
        tiles = report.tiles_written,
        bytes = report.bytes,
        "Tile store written"
    );

    Ok(report)
}

/// Deletes a packaged tile tree.
pub fn remove_source_directory(dir: &Path) -> StoreResult<()> {
    fs::remove_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    info!(dir = %dir.display(), "Deleted tile directory");
    Ok(())
}

/// Lists every tile file under `dir`, sorted by zoom, column and row.
pub fn scan_tile_tree(dir: &Path) -> StoreResult<Vec<TileFile>> {
    let mut files = Vec::new();

    for zoom_entry in read_dir(dir)? {
        let Some(zoom) = numeric_dir::<u8>(&zoom_entry) else {
            continue;
        };
        if zoom > MAX_ZOOM {
            warn!(path = %zoom_entry.display(), "Zoom level out of range, skipping");
            continue;
        }

        for column_entry in read_dir(&zoom_entry)? {
            let Some(x) = numeric_dir::<u32>(&column_entry) else {
                continue;
            };

            for file in read_dir(&column_entry)? {
                let Some((y, extension)) = tile_file_name(&file) else {
                    debug!(path = %file.display(), "Not a tile file, skipping");
                    continue;
                };
                let tile = TileCoord::new(zoom, x, y);
                let limit = tile.tiles_per_axis();
                if x as u64 >= limit || y as u64 >= limit {
                    warn!(path = %file.display(), "Tile index out of range, skipping");
                    continue;
                }
                files.push(TileFile {
                    tile,
                    path: file,
                    extension,
                });
            }
        }
    }

    files.sort_by(|a, b| a.tile.cmp(&b.tile));
    Ok(files)
}

/// Metadata implied by the tiles themselves.
fn derived_metadata(files: &[TileFile]) -> TileStoreMetadata {
    let mut derived = TileStoreMetadata::default();
    let (Some(first), Some(max_zoom)) = (files.first(), files.iter().map(|f| f.tile.zoom).max())
    else {
        return derived;
    };

    derived.format = Some(first.extension.clone());
    derived.min_zoom = files.iter().map(|f| f.tile.zoom).min();
    derived.max_zoom = Some(max_zoom);

    // Union of the deepest level's tiles, from north-west to south-east corners
    let mut bounds = BoundingBox::empty();
    for file in files.iter().filter(|f| f.tile.zoom == max_zoom) {
        let (north, west) = tile_to_lat_lon(&file.tile);
        let (south, east) = tile_to_lat_lon(&TileCoord::new(
            max_zoom,
            file.tile.x + 1,
            file.tile.y + 1,
        ));
        bounds.expand(west, north);
        bounds.expand(east, south);
    }
    derived.bounds = Some(bounds);

    derived
}

fn read_dir(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| StoreError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })
}

fn numeric_dir<T: std::str::FromStr>(path: &Path) -> Option<T> {
    if !path.is_dir() {
        return None;
    }
    path.file_name()?.to_str()?.parse().ok()
}

/// `12.jpg` → `(12, "jpg")`; anything else (e.g. `12.jpg.part`) → `None`.
fn tile_file_name(path: &Path) -> Option<(u32, String)> {
    if !path.is_file() {
        return None;
    }
    let y = path.file_stem()?.to_str()?.parse().ok()?;
    let extension = path.extension()?.to_str()?.to_string();
    Some((y, extension))
}
