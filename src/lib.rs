//! Litterprep: dataset preparation for litter detection.
//!
//! Prepares object-detection datasets for YOLO training and
//! annotation-tool round trips:
//!
//! - `convert` reads a COCO-style annotation document, maps fine
//!   litter categories onto 8 coarse classes, writes one YOLO label
//!   file per image, and bundles images + labels into a ZIP ready for
//!   re-import.
//! - `split` shuffles an exported images+labels tree into
//!   train/val/test and writes a `data.yaml`.
//! - `check` samples a split and verifies label sanity.
//!
//! # Modules
//!
//! - [`convert`]: the COCO-to-YOLO pipeline
//! - [`classes`]: the coarse class taxonomy and name mapping
//! - [`split`], [`check`], [`bundle`]: the surrounding tooling
//! - [`error`]: error types for litterprep operations

pub mod bbox;
pub mod bundle;
pub mod check;
pub mod classes;
pub mod coco;
pub mod convert;
pub mod error;
pub mod paths;
pub mod split;

#[cfg(test)]
pub(crate) mod testutil;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::LitterprepError;

/// The litterprep CLI application.
#[derive(Parser)]
#[command(name = "litterprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a COCO annotation document to coarse-class YOLO labels.
    Convert(ConvertArgs),
    /// Split an images+labels tree into train/val/test.
    Split(SplitArgs),
    /// Spot-check labels in a split dataset.
    Check(CheckArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// The COCO JSON annotation document.
    annotations: PathBuf,

    /// Root directory containing the image files.
    #[arg(long)]
    image_root: PathBuf,

    /// Root directory to write label files under.
    #[arg(long)]
    label_root: PathBuf,

    /// Also write a ZIP bundle of images + labels at this path.
    #[arg(long)]
    bundle: Option<PathBuf>,

    /// Also write the coarse class-name list at this path.
    #[arg(long)]
    names_out: Option<PathBuf>,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Source tree of image files with sibling .txt labels.
    source: PathBuf,

    /// Output dataset root (recreated on every run).
    #[arg(long)]
    output: PathBuf,

    /// Fraction of pairs for training.
    #[arg(long, default_value_t = 0.7)]
    train: f64,

    /// Fraction of pairs for validation (the rest becomes test).
    #[arg(long, default_value_t = 0.2)]
    val: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Class-name list for data.yaml (plain lines or YAML names list).
    #[arg(long)]
    names: Option<PathBuf>,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Dataset root produced by `split` (contains data.yaml).
    dataset: PathBuf,

    /// Which split to sample.
    #[arg(long, default_value = "train")]
    split: String,

    /// Number of images to sample.
    #[arg(short = 'n', long, default_value_t = 5)]
    samples: usize,

    /// Sampling seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Exit non-zero if any finding is reported.
    #[arg(long)]
    strict: bool,
}

/// Run the litterprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LitterprepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("litterprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset preparation for litter detection.");
            println!();
            println!("Run 'litterprep --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), LitterprepError> {
    let opts = convert::ConvertOptions {
        annotations: args.annotations,
        image_root: args.image_root,
        label_root: args.label_root,
    };

    let report = convert::run_convert(&opts)?;
    print!("{}", report);

    if let Some(names_out) = &args.names_out {
        classes::write_coarse_names(names_out)?;
        println!("Wrote class names to {}", names_out.display());
    }

    if let Some(bundle_path) = &args.bundle {
        let entries = bundle::write_bundle(bundle_path, &opts.image_root, &opts.label_root)?;
        println!(
            "Wrote bundle {} ({} entries).",
            bundle_path.display(),
            entries
        );
    }

    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), LitterprepError> {
    let opts = split::SplitOptions {
        source: args.source,
        output: args.output,
        train_ratio: args.train,
        val_ratio: args.val,
        seed: args.seed,
        names_file: args.names,
    };

    let report = split::run_split(&opts)?;
    print!("{}", report);
    println!("Config file: {}", opts.output.join("data.yaml").display());
    Ok(())
}

/// Execute the check subcommand.
fn run_check(args: CheckArgs) -> Result<(), LitterprepError> {
    let opts = check::CheckOptions {
        dataset: args.dataset,
        split: args.split,
        samples: args.samples,
        seed: args.seed,
    };

    let report = check::run_check(&opts)?;
    print!("{}", report);

    if args.strict && !report.findings.is_empty() {
        return Err(LitterprepError::CheckFailed {
            finding_count: report.findings.len(),
        });
    }
    Ok(())
}
