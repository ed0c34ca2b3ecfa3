//! Pack command - package an XYZ tile directory into an MBTiles store.

use std::path::PathBuf;

use clap::Args;

use alertmap::mbtiles::{pack_directory, remove_source_directory, TileStoreMetadata};

use super::common::print_store_summary;
use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

#[derive(Debug, Args)]
pub struct PackArgs {
    /// Directory laid out as <zoom>/<x>/<y>.<ext>
    #[arg(long)]
    pub input: PathBuf,

    /// MBTiles file to create (replaced if it exists)
    #[arg(long)]
    pub output: PathBuf,

    /// Tile format stored in the metadata (default: derived from the files)
    #[arg(long)]
    pub format: Option<String>,

    /// Store name (default: the directory's metadata.json)
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub attribution: Option<String>,

    /// Delete the tile directory once the store is written
    #[arg(long)]
    pub remove_source: bool,
}

impl PackArgs {
    fn metadata(&self) -> TileStoreMetadata {
        TileStoreMetadata {
            name: self.name.clone(),
            format: self
                .format
                .as_deref()
                .map(|f| f.trim_start_matches('.').to_string()),
            attribution: self.attribution.clone(),
            ..TileStoreMetadata::default()
        }
    }
}

pub fn run(options: &GlobalOptions, args: PackArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("pack");

    let report = pack_directory(&args.input, &args.output, &args.metadata())?;
    if args.remove_source {
        remove_source_directory(&args.input)?;
    }

    print_store_summary("Store", &args.output, &report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_given_flags_are_explicit() {
        let args = PackArgs {
            input: PathBuf::from("xyz"),
            output: PathBuf::from("alert.mbtiles"),
            format: Some(".png".to_string()),
            name: None,
            attribution: Some("© Imagery".to_string()),
            remove_source: false,
        };
        let metadata = args.metadata();
        assert_eq!(metadata.format.as_deref(), Some("png"));
        assert_eq!(metadata.name, None);
        assert_eq!(metadata.attribution.as_deref(), Some("© Imagery"));
        assert_eq!(metadata.layer_type, None);
    }
}
