//! alertmap CLI - Command-line interface
//!
//! Turns GeoJSON alert footprints into browsable imagery tiles and MBTiles
//! stores using the alertmap library.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{bbox, fetch, pack, render, run, tile};
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "alertmap")]
#[command(version, about = "Build map tiles and MBTiles stores around GeoJSON alerts", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.alertmap/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the (buffered) extent of a GeoJSON file as a Polygon Feature
    Bbox(bbox::BboxArgs),

    /// Show the XYZ, TMS and quadkey address of the tile under a coordinate
    Tile(tile::TileArgs),

    /// Download the imagery pyramid covering a GeoJSON file
    Fetch(fetch::FetchArgs),

    /// Package an XYZ tile directory into an MBTiles store
    Pack(pack::PackArgs),

    /// Fill an MBTiles store from a running tile server
    Render(render::RenderArgs),

    /// Extent, download, package and (with --style) render in one go
    Run(run::RunArgs),
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Bbox(args) => bbox::run(&options, args),
        Commands::Tile(args) => tile::run(args),
        Commands::Fetch(args) => fetch::run(&options, args),
        Commands::Pack(args) => pack::run(&options, args),
        Commands::Render(args) => render::run(&options, args),
        Commands::Run(args) => run::run(&options, args),
    };

    if let Err(e) = result {
        e.exit();
    }
}
