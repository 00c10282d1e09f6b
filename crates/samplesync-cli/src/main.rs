use clap::{Parser, Subcommand, ValueEnum};
use samplesync_core::{AppointmentStatus, SampleStatus, SyncConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(
    name = "samplesync",
    version,
    about = "Keep lab samples in step with appointment status changes"
)]
struct Cli {
    /// TOML engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Commit an appointment status and cascade it to the order's samples
    Sync {
        /// JSON lab snapshot
        #[arg(long)]
        lab: PathBuf,
        /// Appointment id
        #[arg(long)]
        appointment: String,
        /// New appointment status
        #[arg(long)]
        status: AppointmentStatus,
        /// Persist the mutated snapshot back to --lab
        #[arg(long)]
        write: bool,
    },
    /// Ask the pre-flight gate whether a status change is advisable
    Check {
        /// JSON lab snapshot
        #[arg(long)]
        lab: PathBuf,
        /// Appointment id
        #[arg(long)]
        appointment: String,
        /// Proposed appointment status
        #[arg(long)]
        status: AppointmentStatus,
    },
    /// Sample progress for an order
    Summary {
        /// JSON lab snapshot
        #[arg(long)]
        lab: PathBuf,
        /// Order id
        #[arg(long)]
        order: String,
    },
    /// Next possible states of a sample status
    Transitions {
        /// Current sample status
        status: SampleStatus,
    },
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    tracing::debug!(?config, "engine configuration");

    let output = match cli.command {
        Command::Sync {
            lab,
            appointment,
            status,
            write,
        } => {
            let report = commands::sync(&config, &lab, &appointment, status, write).await?;
            serde_json::to_string_pretty(&commands::SyncView::from(report))?
        }
        Command::Check {
            lab,
            appointment,
            status,
        } => {
            let decision = commands::check(&config, &lab, &appointment, status).await?;
            serde_json::to_string_pretty(&decision)?
        }
        Command::Summary { lab, order } => {
            let summary = commands::summary(&config, &lab, &order).await?;
            serde_json::to_string_pretty(&summary)?
        }
        Command::Transitions { status } => {
            serde_json::to_string_pretty(&commands::transitions(status))?
        }
    };

    println!("{output}");
    Ok(())
}
