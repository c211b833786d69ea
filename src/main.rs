use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::Env;
use imgdupes::{DedupScope, FolderClassifier, Options, ReportFlush, RunSummary};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "imgdupes",
    version,
    about = "Find duplicate images inside image-only folders"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List folders that contain only image files
    Folders {
        /// Directory to classify
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,

        #[command(flatten)]
        walk: WalkArgs,
    },

    /// Find duplicates in every image-only folder and write a CSV report
    Scan {
        /// Directory to scan
        #[arg(short, long, value_name = "DIR")]
        path: PathBuf,
        /// CSV report to write (default: `<dir>/duplicates.csv`)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Compare fingerprints across the whole run or within each folder
        #[arg(long, value_enum)]
        scope: Option<DedupScope>,
        /// Rewrite the report after every folder or once at the end
        #[arg(long, value_enum)]
        flush: Option<ReportFlush>,
        /// Extension to fingerprint; repeat for more (default: jpg)
        #[arg(long = "scan-ext", value_name = "EXT")]
        scan_ext: Vec<String>,
        /// Don't draw the progress bar
        #[arg(long)]
        no_progress: bool,

        #[command(flatten)]
        walk: WalkArgs,
    },
}

#[derive(Args, Debug)]
struct WalkArgs {
    /// JSON options file; flags given on the command line win
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Don't descend more than N levels below the root
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

impl WalkArgs {
    fn load(&self) -> Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_file(path)
                .with_context(|| format!("Failed to load options from {:?}", path))?,
            None => Options::default(),
        };
        if self.max_depth.is_some() {
            options.max_depth = self.max_depth;
        }
        Ok(options)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Folders { path, walk } => {
            let options = walk.load()?;
            println!("▶ Classifying folders in: {}", path.display());
            let folders = FolderClassifier::new(options.image_set())
                .with_max_depth(options.max_depth)
                .find_image_only_folders(&path)
                .with_context(|| format!("Failed to classify {:?}", path))?;

            if folders.is_empty() {
                println!("No image-only folders found.");
            } else {
                println!("Found {} image-only folder(s):", folders.len());
                for folder in &folders {
                    println!("   ▶ {}", folder.display());
                }
            }
        }

        Commands::Scan {
            path,
            output,
            scope,
            flush,
            scan_ext,
            no_progress,
            walk,
        } => {
            let mut options = walk.load()?;
            if let Some(scope) = scope {
                options.scope = scope;
            }
            if let Some(flush) = flush {
                options.flush = flush;
            }
            if !scan_ext.is_empty() {
                options.scan_extensions = scan_ext;
            }
            if no_progress {
                options.progress = false;
            }
            options.normalize();
            options.validate()?;

            let output = output.unwrap_or_else(|| path.join("duplicates.csv"));
            println!("▶ Scanning for duplicates in: {}", path.display());

            let summary = benchmark("scan", || imgdupes::run(&path, &output, &options))
                .with_context(|| format!("Scan of {:?} failed", path))?;

            println!("{}", summary_line(&summary, &output));
            if summary.folders_failed > 0 || summary.images_skipped > 0 {
                println!(
                    "⚠️  {} folder(s) failed, {} image(s) skipped",
                    summary.folders_failed, summary.images_skipped
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
}

/// Run `f()`, log how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    log::info!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}

/// Closing line for `scan`. Only claims the report was written when every
/// rewrite succeeded.
fn summary_line(summary: &RunSummary, output: &Path) -> String {
    if summary.folders_found == 0 {
        "No image-only folders found.".to_string()
    } else if summary.duplicates == 0 {
        format!(
            "✅ Scanned {} folder(s), {} image(s); nothing to report.",
            summary.folders_scanned, summary.images_fingerprinted
        )
    } else if summary.reports_failed > 0 {
        format!(
            "⚠️  {} duplicate(s) found but {} report write(s) to {} failed",
            summary.duplicates,
            summary.reports_failed,
            output.display()
        )
    } else {
        format!(
            "✅ {} duplicate(s) across {} folder(s) recorded in {}",
            summary.duplicates,
            summary.folders_scanned,
            display_output(output)
        )
    }
}

fn display_output(output: &Path) -> String {
    output
        .canonicalize()
        .unwrap_or_else(|_| output.to_path_buf())
        .display()
        .to_string()
}
