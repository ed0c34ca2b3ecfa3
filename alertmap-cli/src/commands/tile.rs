//! Tile command - show every address of the tile under a coordinate.

use clap::Args;

use alertmap::coord::{lat_lon_to_tile, tile_to_quadkey, TileCoord, MAX_ZOOM};

use crate::error::CliError;

#[derive(Debug, Args)]
pub struct TileArgs {
    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Zoom level
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=MAX_ZOOM as i64))]
    pub zoom: u8,
}

pub fn run(args: TileArgs) -> Result<(), CliError> {
    for line in describe(&lat_lon_to_tile(args.lat, args.lon, args.zoom)) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(tile: &TileCoord) -> Vec<String> {
    vec![
        format!("XYZ:     {}/{}/{}", tile.zoom, tile.x, tile.y),
        format!("TMS:     {}/{}/{}", tile.zoom, tile.x, tile.tms_y()),
        format!("Quadkey: {}", tile_to_quadkey(tile)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_lists_all_addresses() {
        let lines = describe(&TileCoord::new(3, 5, 2));
        assert_eq!(lines[0], "XYZ:     3/5/2");
        assert_eq!(lines[1], "TMS:     3/5/5");
        assert_eq!(lines[2], "Quadkey: 121");
    }
}
