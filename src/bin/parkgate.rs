//! Parkgate Server Binary
//!
//! Command-line interface for the Parkgate slot allocation service:
//! - Serve the HTTP API
//! - Validate seed data and report free capacity
//! - Print the effective configuration
//!
//! # Examples
//!
//! ```bash
//! # Start server
//! parkgate serve --bind 0.0.0.0 --port 8080
//!
//! # Validate slots and distances without serving
//! parkgate --config config/parkgate.toml check
//! ```

use clap::{Args, Parser, Subcommand};
use parkgate::config::Settings;
use parkgate::server::{start_server, ServerConfig};
use parkgate::ParkingService;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Parkgate - nearest-slot allocation for multi-gate parking facilities
#[derive(Parser, Debug)]
#[command(name = "parkgate")]
#[command(version = parkgate::VERSION)]
#[command(about = "Parkgate - nearest-slot allocation for multi-gate parking", long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "PARKGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Log directory path
    #[arg(long, global = true, default_value = "logs", env = "PARKGATE_LOG_DIR")]
    log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Parkgate server
    Serve(ServeArgs),

    /// Load slots and distances, build the index and report capacity
    Check,

    /// Print the effective configuration as TOML
    Config,

    /// Show version
    Version,
}

/// Server arguments; these override the configuration file
#[derive(Args, Debug)]
struct ServeArgs {
    /// HTTP bind address
    #[arg(short, long)]
    bind: Option<String>,

    /// HTTP port
    #[arg(short, long)]
    port: Option<u16>,

    /// Disable CORS
    #[arg(long)]
    no_cors: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(&cli)?;

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => serve_command(settings, args).await,
        Commands::Check => check_command(settings),
        Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        Commands::Version => {
            println!("Parkgate {}", parkgate::VERSION);
            Ok(())
        }
    }
}

/// Setup logging with rolling files and console output
fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    std::fs::create_dir_all(&cli.log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &cli.log_dir, "parkgate.log");

    let log_level = cli
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_ansi(!cli.no_color)
                .pretty(),
        )
        .with(fmt::layer().with_writer(file_appender).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();

    Ok(())
}

/// Serve command - seed, build the index, start the server
async fn serve_command(mut settings: Settings, args: ServeArgs) -> anyhow::Result<()> {
    info!(version = %parkgate::VERSION, "Parkgate starting");

    if let Some(bind) = args.bind {
        settings.server.bind = bind;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if args.no_cors {
        settings.server.enable_cors = false;
    }

    let service = match ParkingService::from_settings(&settings) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %e, "Failed to build slot index, refusing to serve");
            return Err(e.into());
        }
    };
    for entry in service.availability()? {
        info!(
            vehicle_type = %entry.vehicle_type,
            free = entry.free_slots,
            "Capacity"
        );
    }

    start_server(ServerConfig::from(settings.server), service).await
}

/// Check command - validate seed data without serving
fn check_command(settings: Settings) -> anyhow::Result<()> {
    let service = ParkingService::from_settings(&settings)?;

    println!("Slots:     {}", service.list_slots()?.len());
    println!(
        "Distances: {}",
        service.allocator().distances().len()
    );
    for entry in service.availability()? {
        println!("  {:<6} {} free", entry.vehicle_type, entry.free_slots);
    }

    let problems = service.check_consistency()?;
    if problems.is_empty() {
        println!("Index consistent");
    } else {
        for problem in &problems {
            warn!(?problem, "Index inconsistency");
        }
        anyhow::bail!("{} index inconsistencies", problems.len());
    }
    Ok(())
}
