//! End-to-end: GeoJSON extent → imagery fetch → MBTiles package → read back.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use alertmap::coord::{flip_y, tile_to_quadkey, TileRange};
use alertmap::extent::{read_features, BoundingBox};
use alertmap::fetch::{FetchRequest, TilePyramidFetcher, TileSetMetadata};
use alertmap::mbtiles::{pack_directory, TileStore, TileStoreMetadata};
use alertmap::provider::{AsyncHttpClient, ProviderError, TemplateSource, TileUrlTemplate};
use tempfile::TempDir;

/// Serves the requested URL back as the tile body, failing on a blocklist.
#[derive(Clone, Default)]
struct EchoClient {
    failing: Arc<HashSet<String>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl EchoClient {
    fn failing(urls: &[&str]) -> Self {
        Self {
            failing: Arc::new(urls.iter().map(|u| u.to_string()).collect()),
            requests: Arc::default(),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl AsyncHttpClient for EchoClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(ProviderError::HttpStatus {
                status: 404,
                url: url.to_string(),
            });
        }
        Ok(url.as_bytes().to_vec())
    }
}

const ALERT: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"alert": "deforestation"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [-60.02, -3.11], [-59.95, -3.11], [-59.95, -3.05],
                    [-60.02, -3.05], [-60.02, -3.11]
                ]]
            }
        },
        {
            "type": "Feature",
            "properties": {"alert": "fire"},
            "geometry": {"type": "Point", "coordinates": [-59.90, -3.02]}
        }
    ]
}"#;

fn write_alert(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("alert.geojson");
    fs::write(&path, ALERT).unwrap();
    path
}

fn request(bbox: BoundingBox, output_dir: &Path) -> FetchRequest {
    FetchRequest {
        bbox,
        min_zoom: 1,
        max_zoom: 9,
        output_dir: output_dir.to_path_buf(),
        extension: "jpg".to_string(),
        metadata: TileSetMetadata::imagery("alert", Some("© Integration"), "jpg"),
    }
}

fn quadkey_source(client: EchoClient) -> TemplateSource<EchoClient> {
    let template = TileUrlTemplate::parse("http://imagery.test/a{q}.jpeg").unwrap();
    TemplateSource::new(client, template, "imagery")
}

#[tokio::test]
async fn test_extent_fetch_package_read_back() {
    let temp = TempDir::new().unwrap();
    let features = read_features(&write_alert(temp.path())).unwrap();
    let bbox = BoundingBox::from_features(&features).unwrap();
    assert_eq!(bbox, BoundingBox::new(-60.02, -3.11, -59.90, -3.02));

    let tiles_dir = temp.path().join("xyz");
    let client = EchoClient::default();
    let fetcher = TilePyramidFetcher::new(quadkey_source(client.clone()));
    let report = fetcher.fetch(&request(bbox, &tiles_dir)).await.unwrap();

    let expected: Vec<_> = (1..=9)
        .flat_map(|zoom| TileRange::covering(&bbox, zoom).tiles())
        .collect();
    assert_eq!(report.downloaded, expected.len());
    assert_eq!(client.request_count(), expected.len());

    let output = temp.path().join("alert.mbtiles");
    let packed = pack_directory(&tiles_dir, &output, &TileStoreMetadata::default()).unwrap();
    assert_eq!(packed.tiles_written, expected.len());

    let store = TileStore::open(&output).unwrap();
    assert_eq!(store.tile_count().unwrap(), expected.len() as u64);
    assert_eq!(store.zoom_range().unwrap(), Some((1, 9)));
    for tile in &expected {
        let body = store.get_tile(tile).unwrap().unwrap();
        let url = format!("http://imagery.test/a{}.jpeg", tile_to_quadkey(tile));
        assert_eq!(body, url.into_bytes(), "tile {tile}");
    }

    let metadata = store.metadata().unwrap();
    assert_eq!(metadata["name"], "alert");
    assert_eq!(metadata["attribution"], "© Integration");
    assert_eq!(metadata["format"], "jpg");
    assert_eq!(metadata["minzoom"], "1");
    assert_eq!(metadata["maxzoom"], "9");
}

#[tokio::test]
async fn test_rows_are_stored_in_tms_order() {
    let temp = TempDir::new().unwrap();
    let bbox = BoundingBox::new(-60.02, -3.11, -59.90, -3.02);
    let tiles_dir = temp.path().join("xyz");
    let fetcher = TilePyramidFetcher::new(quadkey_source(EchoClient::default()));
    fetcher.fetch(&request(bbox, &tiles_dir)).await.unwrap();

    let output = temp.path().join("alert.mbtiles");
    pack_directory(&tiles_dir, &output, &TileStoreMetadata::default()).unwrap();

    let tile = TileRange::covering(&bbox, 9).tiles().next().unwrap();
    let conn = rusqlite::Connection::open(&output).unwrap();
    let row: u32 = conn
        .query_row(
            "SELECT tile_row FROM tiles WHERE zoom_level = 9 AND tile_column = ?1",
            [tile.x],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(row, flip_y(tile.y, 9));
}

#[tokio::test]
async fn test_resumed_fetch_fills_only_missing_tiles() {
    let temp = TempDir::new().unwrap();
    let bbox = BoundingBox::new(-60.02, -3.11, -59.90, -3.02);
    let tiles_dir = temp.path().join("xyz");

    let first_tile = TileRange::covering(&bbox, 1).tiles().next().unwrap();
    let broken_url = format!("http://imagery.test/a{}.jpeg", tile_to_quadkey(&first_tile));
    let flaky = EchoClient::failing(&[broken_url.as_str()]);
    let first = TilePyramidFetcher::new(quadkey_source(flaky))
        .fetch(&request(bbox, &tiles_dir))
        .await
        .unwrap();
    assert_eq!(first.failed, 1);
    assert!(!first.is_complete());

    let healthy = EchoClient::default();
    let second = TilePyramidFetcher::new(quadkey_source(healthy.clone()))
        .fetch(&request(bbox, &tiles_dir))
        .await
        .unwrap();
    assert_eq!(second.downloaded, 1);
    assert_eq!(second.skipped, first.downloaded);
    assert_eq!(healthy.request_count(), 1);
    assert!(second.is_complete());
}
