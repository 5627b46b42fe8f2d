//! Subextract - embedded subtitle extraction and synchronization
//!
//! Entry point: loads the configuration, sets up logging and dispatches the
//! selected command.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subextract::cli::{Args, Commands, LibraryArgs};
use subextract::config::{Config, LanguageSelection};
use subextract::workflow::Workflow;

const LOG_TIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Run { library, workers } => {
            apply_library_args(&mut config, &library);
            if let Some(workers) = workers {
                config.pool.workers = Some(workers);
            }
            config.validate()?;

            let root = config.root_folder.clone();
            let workflow = Arc::new(Workflow::new(config));
            workflow.check_tools().await;

            let summary = workflow.run(&root).await?;
            info!(
                "Run started {} finished in {:.1}s: {} workers, {} queued, {} already extracted, {} unreadable, {} completed",
                summary.started_at.format(LOG_TIME_FORMAT),
                summary.elapsed.as_secs_f64(),
                summary.workers,
                summary.scan.dispatched,
                summary.scan.skipped,
                summary.scan.unreadable,
                summary.completed
            );
        }
        Commands::Scan { library, json } => {
            apply_library_args(&mut config, &library);
            config.validate()?;

            let root = config.root_folder.clone();
            let workflow = Workflow::new(config);
            let (jobs, report) = workflow.pending_jobs(&root)?;

            if json {
                let entries: Vec<PendingVideo> = jobs
                    .iter()
                    .map(|job| PendingVideo {
                        id: job.id,
                        video: job.video_path().display().to_string(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("\nPending videos under {}:", root.display());
                println!("{:<6} {:<60}", "Job", "Video");
                println!("{}", "-".repeat(66));
                for job in &jobs {
                    println!("{:<6} {:<60}", job.id, job.video_path().display());
                }
                println!(
                    "\n{} pending, {} already extracted, {} unreadable",
                    report.dispatched, report.skipped, report.unreadable
                );
            }
        }
        Commands::Probe { input } => {
            let workflow = Workflow::new(config);
            workflow.check_tools().await;

            let streams = workflow.probe_file(&input).await?;
            if streams.is_empty() {
                println!("No subtitle streams in {}", input.display());
            } else {
                println!("\nSubtitle streams in {}:", input.display());
                println!("{:<10} {:<10} {:<10}", "Stream", "Language", "Extract");
                println!("{}", "-".repeat(30));
                for (stream, allowed) in streams {
                    println!(
                        "{:<10} {:<10} {:<10}",
                        stream.index,
                        stream.language,
                        if allowed { "yes" } else { "no" }
                    );
                }
            }
        }
        Commands::Sync { input } => {
            let workflow = Workflow::new(config);
            workflow.check_tools().await;

            let report = workflow.sync_file(&input).await?;
            println!(
                "Synced {} subtitle files, {} failed{}",
                report.synced.len(),
                report.failed.len(),
                if report.reference_generated { "" } else { " (reference generation failed)" }
            );
        }
        Commands::Init { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct PendingVideo {
    id: usize,
    video: String,
}

/// Config file (explicit, or `config.toml` in the working directory), then environment
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };
    config.apply_env()?;
    Ok(config)
}

fn apply_library_args(config: &mut Config, library: &LibraryArgs) {
    if let Some(root) = &library.root {
        config.root_folder = root.clone();
    }
    if let Some(languages) = &library.languages {
        config.languages.extract = LanguageSelection::parse_list(languages);
    }
    if let Some(language) = &library.default_language {
        config.languages.default_language = language.trim().to_lowercase();
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".subextract").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "subextract.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_target(false)
        .with_thread_ids(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
        .with_target(false)
        .with_thread_ids(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("subextract.log").display());

    Ok(())
}
