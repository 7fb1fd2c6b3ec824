use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pco_pedal_sync::catalog::CatalogError;
use pco_pedal_sync::config::{load_credentials, ConfigError, EXAMPLE_CONFIG};
use pco_pedal_sync::pco::PcoClient;
use pco_pedal_sync::progress::{format_elapsed, ProgressMode};
use pco_pedal_sync::project::{load_project, save_project};
use pco_pedal_sync::safety::validate_output_path;
use pco_pedal_sync::sync::sync_project;

#[derive(Parser)]
#[command(name = "pco-pedal-sync")]
#[command(about = "Sync Planning Center songs with a pedal project")]
struct Args {
    /// Path to the pedal project JSON file
    #[arg(long)]
    pedal_file: PathBuf,

    /// Path to save the updated project (defaults to --pedal-file)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Config file with PCO credentials
    #[arg(long, default_value = "config.ini")]
    config: PathBuf,

    /// Maximum number of distinct songs to fetch from PCO
    #[arg(long, default_value = "128")]
    max_songs: usize,

    /// Merge and report without writing the project file
    #[arg(long)]
    dry_run: bool,

    /// Write the sync report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar and print periodic progress lines instead
    #[arg(long)]
    log_only: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,pco_pedal_sync={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let start = Instant::now();

    let credentials = load_credentials(&args.config).context("Error loading config")?;
    info!("Loaded PCO credentials from {}", args.config.display());

    let mut project =
        load_project(&args.pedal_file).context("Error loading pedal project file")?;
    info!(
        "Loaded pedal project from {} ({} song slots)",
        args.pedal_file.display(),
        project.songs.len()
    );

    let output = args
        .output_file
        .clone()
        .unwrap_or_else(|| args.pedal_file.clone());
    if !args.dry_run {
        validate_output_path(&output, &[args.config.as_path()])?;
    }

    let client = PcoClient::new(credentials)?;
    let mode = if args.log_only {
        ProgressMode::LogLines
    } else {
        ProgressMode::Bar
    };
    let mut report = sync_project(&client, &mut project, args.max_songs, mode)?;

    if args.dry_run {
        info!("Dry run: not writing {}", output.display());
    } else {
        save_project(&project, &output).context("Error saving pedal project file")?;
        info!("Updated pedal project saved to {}", output.display());
        report.saved_to = Some(output);
    }

    println!("\n{:=<60}", "");
    print!("{}", report);
    println!("  Elapsed: {}", format_elapsed(start.elapsed()));
    println!("{:=<60}", "");

    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.chain().any(|c| c.is::<ConfigError>()) {
                println!("Example config.ini:\n{}", EXAMPLE_CONFIG);
            }
            eprintln!("Error: {:#}", e);
            let auth_failed = e
                .chain()
                .filter_map(|c| c.downcast_ref::<CatalogError>())
                .any(CatalogError::is_auth_failure);
            if auth_failed {
                eprintln!(
                    "Authentication failed. Please check your PCO credentials in the config file."
                );
            }
            ExitCode::FAILURE
        }
    }
}
