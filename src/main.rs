use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gcporg::config::Config;
use gcporg::gcp::client::{Endpoints, GcpClient};
use gcporg::gcp::http::format_gcp_error;
use gcporg::output::{self, JsonLinesSink, OutputFormat};
use gcporg::{CollectingSink, QueryContext, Qualifiers, Session};
use std::io::Write;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// List GCP organizations, folders, and projects
#[derive(Parser, Debug)]
#[command(name = "gcporg", version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Maximum number of rows to return
    #[arg(short, long, global = true)]
    limit: Option<u64>,

    /// Output format (defaults to the config file setting, then table)
    #[arg(short, long, value_enum, global = true)]
    output: Option<OutputFormat>,

    /// Omit column headers in table and CSV output
    #[arg(long, global = true)]
    no_headers: bool,

    /// Number of organizations to search at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Base URL for both APIs (testing, private gateways)
    #[arg(long, global = true, hide = true)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the organizations visible to the caller
    Organizations,

    /// List organizations, folders, and projects as one table
    Resources {
        /// Only search under this organization id
        #[arg(long)]
        organization: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("gcporg started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gcporg").join("gcporg.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".gcporg").join("gcporg.log");
    }
    PathBuf::from("gcporg.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = Config::load();
    let mut settings = config.settings();
    if let Some(endpoint) = &args.endpoint {
        settings.endpoints = Endpoints::single(endpoint);
    }
    if let Some(concurrency) = args.concurrency {
        settings.concurrency = concurrency.max(1);
    }

    let format = args
        .output
        .or_else(|| config.output.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    let session = match std::env::var("GCPORG_ACCESS_TOKEN") {
        Ok(token) if !token.is_empty() => {
            tracing::info!("Using access token from GCPORG_ACCESS_TOKEN");
            let client = GcpClient::with_static_token(settings.endpoints.clone(), &token)?;
            Session::from_client(client, settings)
        }
        _ => Session::connect(settings)
            .await
            .context("Could not connect to GCP")?,
    };

    let ctx = QueryContext { limit: args.limit };

    match args.command {
        Command::Organizations => {
            let mut orgs = match session.describe_organizations().await {
                Ok(orgs) => orgs,
                Err(err) => {
                    tracing::error!("organizations: {}", err);
                    anyhow::bail!(format_gcp_error(&err));
                }
            };
            if let Some(limit) = ctx.limit {
                orgs.truncate(limit as usize);
            }
            println!("{}", output::format_organizations(&orgs, format, args.no_headers));
        }
        Command::Resources { organization } => {
            let quals = Qualifiers { organization };

            if format == OutputFormat::Jsonl {
                let mut sink = JsonLinesSink::new(std::io::stdout(), &ctx);
                let result = session.query(&ctx, &quals, &mut sink).await;
                sink.into_inner().flush()?;
                if let Err(err) = result {
                    tracing::error!("resources: {}", err);
                    anyhow::bail!(format_gcp_error(&err));
                }
            } else {
                let mut sink = CollectingSink::new(&ctx);
                if let Err(err) = session.query(&ctx, &quals, &mut sink).await {
                    tracing::error!("resources: {}", err);
                    // Rows gathered before the failure are still worth showing
                    if !sink.rows().is_empty() {
                        println!("{}", output::format_resources(sink.rows(), format, args.no_headers));
                    }
                    anyhow::bail!(format_gcp_error(&err));
                }
                println!(
                    "{}",
                    output::format_resources(sink.rows(), format, args.no_headers)
                );
            }
        }
    }

    Ok(())
}
