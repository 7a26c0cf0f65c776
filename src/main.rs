// USAGE cargo run --release -- -c /path/to/caseroot
//       cargo run --release -- --context case.toml

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cesm_catalog::{
    build_catalog, BuildOptions, BuildOutcome, CaseContextProvider, CimeCase, Diagnostics,
    FixtureCase, NetcdfLongNames,
};

#[derive(Parser, Debug)]
#[command(name = "cesm_catalog")]
#[command(about = "Generate intake-esm catalog for a CESM case")]
struct Args {
    /// CESM case root to generate intake-esm catalog for
    #[arg(short = 'c', long, required_unless_present = "context")]
    caseroot: Option<PathBuf>,

    /// Read the case context from a TOML file instead of querying the case
    #[arg(long, conflicts_with = "caseroot")]
    context: Option<PathBuf>,

    /// Extension of the output files to catalog
    #[arg(long, default_value = "nc")]
    extension: String,

    /// Read file metadata one file at a time
    #[arg(long)]
    serial: bool,

    /// Add additional output for debugging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default = if args.debug { "cesm_catalog=debug" } else { "cesm_catalog=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let provider: Box<dyn CaseContextProvider> = match (&args.context, &args.caseroot) {
        (Some(toml), _)        => Box::new(FixtureCase::new(toml)),
        (None, Some(caseroot)) => Box::new(CimeCase::new(caseroot)),
        (None, None)           => bail!("one of --caseroot or --context is required"),
    };
    let options = BuildOptions { extension: args.extension.clone(), parallel: !args.serial };
    let diag = Diagnostics::new();

    let outcome = build_catalog(provider.as_ref(), &NetcdfLongNames, &options, &diag)
        .context("catalog generation failed")?;

    match outcome {
        BuildOutcome::Written(summary) => {
            info!("Created {}", summary.catalog.display());
            if summary.skipped > 0 {
                info!("{} file(s) skipped, see warnings above", summary.skipped);
            }
        }
        BuildOutcome::TimeSliceUnsupported(root) => {
            info!("Will catalog files in {} once time-slice cataloging exists", root.display());
        }
    }
    Ok(())
}
