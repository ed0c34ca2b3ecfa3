//! CLI command implementations.
//!
//! Each module handles one subcommand:
//! - `bbox`: print the buffered extent of a GeoJSON file
//! - `tile`: convert a coordinate to XYZ, TMS and quadkey addresses
//! - `fetch`: download the imagery pyramid into an XYZ directory
//! - `pack`: package an XYZ directory into an MBTiles store
//! - `render`: fill an MBTiles store from the rendering endpoint
//! - `run`: the whole pipeline for one alert file

pub mod bbox;
pub mod common;
pub mod fetch;
pub mod pack;
pub mod render;
pub mod run;
pub mod tile;
