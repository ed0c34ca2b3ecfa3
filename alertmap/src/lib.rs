//! alertmap - browsable map assets from GeoJSON alert footprints
//!
//! This library turns the features of an alert (deforestation, fire, land
//! change) into map tiles:
//!
//! - [`extent`]: bounding box of a feature set
//! - [`buffer`]: widen a box by kilometers through a local UTM projection
//! - [`coord`]: slippy-map tile math, quadkeys and XYZ/TMS row flips
//! - [`fetch`]: download an imagery pyramid into `<zoom>/<x>/<y>.<ext>`
//! - [`mbtiles`]: package tiles into a single MBTiles file, from a directory
//!   or a live rendering endpoint
//! - [`app`]: the pipeline running all of the above for one input

pub mod app;
pub mod buffer;
pub mod config;
pub mod coord;
pub mod extent;
pub mod fetch;
pub mod logging;
pub mod mbtiles;
pub mod provider;
pub mod renderer;
