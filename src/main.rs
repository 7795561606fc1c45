//! memcleaner - reclaim physical memory from the command line

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use memcleaner::security::{is_elevated, PrivilegeLevel};
use memcleaner::{
    create_facility, format_report, format_snapshot, AutoCleaner, CleanerConfig, CleanerError,
    MemoryCleaner,
};

#[derive(Parser)]
#[command(name = "memcleaner")]
#[command(about = "Reclaim physical memory held by caches and working sets", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current memory status
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Run one cleanup (requires administrator / root)
    Clean {
        #[arg(long)]
        json: bool,
    },

    /// Clean automatically when usage crosses a threshold
    Watch {
        /// RAM usage percent that triggers a cleanup
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Minutes between checks
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let path = cli.config.unwrap_or_else(CleanerConfig::default_path);

    match cli.command {
        Commands::Status { json } => {
            let config = CleanerConfig::load_or_default(&path)?;
            let cleaner = MemoryCleaner::new(create_facility(), config);
            let snapshot = cleaner.snapshot()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("Memory Status ({}):", PrivilegeLevel::detect());
                println!("{}", format_snapshot(&snapshot));
            }
        }

        Commands::Clean { json } => {
            let config = CleanerConfig::load_or_default(&path)?;
            let elevated = is_elevated();
            let cleaner = MemoryCleaner::new(create_facility(), config);

            let outcome = tokio::task::spawn_blocking(move || cleaner.cleanup(elevated)).await?;
            match outcome {
                Ok(result) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        println!("{}", format_report(&result));
                        println!("Duration: {} ms", result.duration_ms);
                    }
                    if !result.success {
                        return Ok(ExitCode::FAILURE);
                    }
                }
                Err(CleanerError::PrivilegeRequired) => {
                    eprintln!("Administrator privileges are required to clean memory.");
                    return Ok(ExitCode::from(2));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Watch { threshold, interval } => {
            let config = CleanerConfig::load_or_default(&path)?;
            let mut settings = config.auto_clean.clone();
            if let Some(t) = threshold {
                settings.threshold_percent = t;
            }
            if let Some(i) = interval {
                settings.interval_minutes = i;
            }
            let effective = CleanerConfig {
                auto_clean: settings.clone(),
                ..config
            };
            effective.validate()?;

            if !is_elevated() {
                eprintln!("Administrator privileges are required to clean memory.");
                return Ok(ExitCode::from(2));
            }

            info!("Watching memory usage (Ctrl+C to stop)");
            let watcher = AutoCleaner::new(MemoryCleaner::new(create_facility(), effective), settings);
            watcher.run().await;
        }

        Commands::Config { init } => {
            if init {
                write_default_config(&path)?;
                println!("Wrote default configuration to {}", path.display());
            } else {
                let config = CleanerConfig::load_or_default(&path)?;
                println!("Configuration ({}):", path.display());
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn write_default_config(path: &Path) -> Result<(), memcleaner::ConfigError> {
    CleanerConfig::default().save(path)
}
