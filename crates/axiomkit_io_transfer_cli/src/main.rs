//! `axiomkit-transfer`: copy the original images referenced by a labeling
//! export table out of a search tree.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use axiomkit_io_transfer::{
    SpecNameHeuristic, SpecTransferOptions, derive_default_name_heuristic, find_and_copy_from_csv,
};
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "axiomkit_io_transfer=info";
const VERBOSE_LOG_FILTER: &str = "axiomkit_io_transfer=debug";

#[derive(Parser, Debug)]
#[command(
    name = "axiomkit-transfer",
    about = "Copy original images referenced by a labeling export table"
)]
struct Cli {
    /// Export table (CSV or other delimited text).
    csv_path: PathBuf,

    /// Directory searched recursively for original images.
    search_path: PathBuf,

    /// Directory receiving the copies (created if absent).
    destination_path: PathBuf,

    /// Table column holding filenames (default: inferred).
    #[arg(long)]
    column: Option<String>,

    /// Match names exactly instead of case-insensitively.
    #[arg(long)]
    case_sensitive: bool,

    /// Replace existing destination files instead of adding `_<n>` suffixes.
    #[arg(long)]
    overwrite: bool,

    /// Mirror source subdirectories under the destination.
    #[arg(long)]
    keep_dir_structure: bool,

    /// Report what would be copied without writing anything.
    #[arg(long)]
    dry_run: bool,

    /// Extension of recovered names.
    #[arg(long, value_name = "EXT")]
    ext_target: Option<String>,

    /// Alternate spelling of the target extension tried once.
    #[arg(long, value_name = "EXT")]
    ext_target_alternate: Option<String>,

    /// Export marker token in `_<ext>.<marker>.`.
    #[arg(long, value_name = "TOKEN")]
    export_marker: Option<String>,

    /// Raster extension recognized in the export suffix (repeatable).
    #[arg(long = "ext-raster", value_name = "EXT")]
    exts_raster: Vec<String>,

    /// Extension whose first occurrence splits the stem.
    #[arg(long, value_name = "EXT")]
    ext_legacy: Option<String>,

    /// Log debug details (dialect, column choice, skipped entries).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn derive_name_heuristic(&self) -> SpecNameHeuristic {
        let spec_default = derive_default_name_heuristic();
        SpecNameHeuristic {
            ext_target: self.ext_target.clone().unwrap_or(spec_default.ext_target),
            ext_target_alternate: self
                .ext_target_alternate
                .clone()
                .or(spec_default.ext_target_alternate),
            export_marker: self
                .export_marker
                .clone()
                .unwrap_or(spec_default.export_marker),
            exts_raster: if self.exts_raster.is_empty() {
                spec_default.exts_raster
            } else {
                self.exts_raster.clone()
            },
            ext_legacy: self.ext_legacy.clone().or(spec_default.ext_legacy),
        }
    }

    fn derive_transfer_options(&self) -> SpecTransferOptions {
        SpecTransferOptions {
            column: self.column.clone(),
            if_case_insensitive: !self.case_sensitive,
            if_overwrite: self.overwrite,
            if_keep_tree: self.keep_dir_structure,
            if_dry_run: self.dry_run,
            spec_name_heuristic: self.derive_name_heuristic(),
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_LOG_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<bool> {
    let report = find_and_copy_from_csv(
        &cli.csv_path,
        &cli.search_path,
        &cli.destination_path,
        cli.derive_transfer_options(),
    )
    .with_context(|| format!("Transfer from {} failed", cli.csv_path.display()))?;

    println!("{report}");
    Ok(report.error_count() == 0)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;

    #[test]
    fn cli_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "axiomkit-transfer",
            "a.csv",
            "search",
            "out",
            "--case-sensitive",
            "--keep-dir-structure",
            "--ext-raster",
            "webp",
            "--ext-raster",
            "jpg",
            "--ext-target",
            "png",
        ]);
        let spec_options = cli.derive_transfer_options();
        assert!(!spec_options.if_case_insensitive);
        assert!(spec_options.if_keep_tree);
        assert!(!spec_options.if_overwrite);
        assert_eq!(spec_options.spec_name_heuristic.ext_target, "png");
        assert_eq!(spec_options.spec_name_heuristic.exts_raster, vec!["webp", "jpg"]);
        assert_eq!(spec_options.spec_name_heuristic.export_marker, "rf");
    }

    #[test]
    fn cli_defaults_match_library_defaults() {
        let cli = Cli::parse_from(["axiomkit-transfer", "a.csv", "search", "out"]);
        let spec_options = cli.derive_transfer_options();
        assert!(spec_options.if_case_insensitive);
        assert!(!spec_options.if_keep_tree);
        assert!(!spec_options.if_dry_run);
        assert_eq!(
            spec_options.spec_name_heuristic,
            axiomkit_io_transfer::SpecNameHeuristic::default()
        );
    }
}
