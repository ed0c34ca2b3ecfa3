//! Bbox command - print the extent of a GeoJSON file as a Polygon Feature.

use std::path::PathBuf;

use clap::Args;

use alertmap::app::{PipelineError, Stage, StageError};
use alertmap::buffer::GeodeticBufferer;
use alertmap::extent::{read_features, BoundingBox};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

#[derive(Debug, Args)]
pub struct BboxArgs {
    /// GeoJSON file (Feature, FeatureCollection or bare geometry)
    #[arg(long)]
    pub input: PathBuf,

    /// Widen the extent by this many kilometers
    #[arg(long, allow_negative_numbers = true)]
    pub buffer_km: Option<f64>,
}

pub fn run(options: &GlobalOptions, args: BboxArgs) -> Result<(), CliError> {
    let runner = CliRunner::quiet(options)?;
    let buffer_km = args.buffer_km.or(runner.config().imagery.buffer_km);

    let bbox = extent(&args, buffer_km)?;
    let feature = serde_json::to_string_pretty(&bbox.to_feature()).map_err(CliError::Output)?;
    println!("{}", feature);
    Ok(())
}

fn extent(args: &BboxArgs, buffer_km: Option<f64>) -> Result<BoundingBox, PipelineError> {
    let features = read_features(&args.input).map_err(|e| PipelineError::new(Stage::Extent, e))?;
    let bbox =
        BoundingBox::from_features(&features).map_err(|e| PipelineError::new(Stage::Extent, e))?;
    if bbox.is_empty() {
        return Err(PipelineError::new(Stage::Extent, StageError::EmptyExtent));
    }

    GeodeticBufferer::new()
        .buffer(&bbox, buffer_km)
        .map_err(|e| PipelineError::new(Stage::Buffer, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(dir: &TempDir, geojson: &str, buffer_km: Option<f64>) -> BboxArgs {
        let input = dir.path().join("alert.geojson");
        fs::write(&input, geojson).unwrap();
        BboxArgs { input, buffer_km }
    }

    #[test]
    fn test_unbuffered_extent_of_a_point_is_degenerate() {
        let dir = TempDir::new().unwrap();
        let args = args(
            &dir,
            r#"{"type": "Point", "coordinates": [-122.68, 45.58]}"#,
            None,
        );
        let bbox = extent(&args, None).unwrap();
        assert_eq!(bbox, BoundingBox::new(-122.68, 45.58, -122.68, 45.58));
    }

    #[test]
    fn test_buffered_extent_contains_the_input() {
        let dir = TempDir::new().unwrap();
        let args = args(
            &dir,
            r#"{"type": "Point", "coordinates": [-122.68, 45.58]}"#,
            Some(1.0),
        );
        let bbox = extent(&args, args.buffer_km).unwrap();
        assert!(bbox.strictly_contains(&BoundingBox::new(-122.68, 45.58, -122.68, 45.58)));
    }

    #[test]
    fn test_empty_collection_fails_in_extent_stage() {
        let dir = TempDir::new().unwrap();
        let args = args(&dir, r#"{"type": "FeatureCollection", "features": []}"#, None);
        let err = extent(&args, None).unwrap_err();
        assert_eq!(err.stage, Stage::Extent);
    }
}
