//! dng-fixup - Repair black level and CFA pattern metadata in DNG files.
//!
//! This binary scans one directory, corrects affected files in place and
//! prints a summary of the run.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dng_fixup::{
    config::{Config, OutputFormat},
    fixup::{Corrector, FileOutcome, RunSummary},
    scan::find_candidates,
};

fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    if config.dry_run && config.no_verify {
        warn!("--no-verify has no effect with --dry-run");
    }

    info!("Scanning {}", config.dir.display());
    let paths = match find_candidates(&config.dir) {
        Ok(paths) => paths,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let corrector = Corrector::new(config.corrector_config());
    let summary = match corrector.run(&paths) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.format {
        OutputFormat::Text => print_text_summary(&summary, config.dry_run),
        OutputFormat::Json => match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize summary: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
///
/// Logs go to stderr so the summary on stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "dng_fixup=debug"
    } else {
        "dng_fixup=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_text_summary(summary: &RunSummary, dry_run: bool) {
    for report in &summary.files {
        let status = match &report.outcome {
            FileOutcome::Skipped { reason } => format!("skipped ({:?})", reason),
            FileOutcome::Unchanged { verdict } => format!("unchanged: {}", verdict.description()),
            FileOutcome::DryRun { verdict, patches } => {
                format!("would patch {} field(s): {}", patches.len(), verdict.description())
            }
            FileOutcome::Patched { verdict, patches } => {
                format!("patched {} field(s): {}", patches.len(), verdict.description())
            }
            FileOutcome::PatchFailed { applied, error, .. } => {
                format!("FAILED after {} field(s): {}", applied.len(), error)
            }
        };
        println!("{}: {}", report.path.display(), status);
    }

    println!();
    let written = if dry_run {
        format!("{} would be patched", summary.would_patch)
    } else {
        format!("{} patched", summary.patched)
    };
    println!(
        "{} file(s): {}, {} unchanged, {} skipped, {} failed",
        summary.processed, written, summary.unchanged, summary.skipped, summary.failed
    );
}
