use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod models;
mod report;
mod scheduler;
mod select;
mod sink;
mod stats;

use api::{FactionApi, TornClient};
use config::{parse_interval, Config, OutputKind, ReportMode, SheetsCredentials, Targets};
use scheduler::ReportRunner;
use sink::{ConsoleSink, CsvDirectory, ReportSink, SheetsClient, TabularEmitter};

#[derive(Parser)]
#[command(name = "oc-history-report")]
#[command(about = "Organized crime participation report for a Torn faction", long_about = None)]
#[command(group(
    ArgGroup::new("scope")
        .args(["all", "both"])
        .multiple(false)
))]
struct Cli {
    /// Where the report goes
    #[arg(long, value_enum, default_value_t = OutputKind::Stdout)]
    output: OutputKind,
    /// Report on every faction member
    #[arg(long)]
    all: bool,
    /// Produce both reports: members not in an OC and all members
    #[arg(long)]
    both: bool,
    /// Target range for the members-not-in-OC report
    #[arg(long, default_value = "History!A1")]
    range_noc: String,
    /// Target range for the all-members report
    #[arg(long, default_value = "HistoryAll!A1")]
    range_all: String,
    /// Repeat at this interval (e.g. 90s, 5m, 1h30m); 0 runs once
    #[arg(long, default_value = "0", value_parser = parse_interval)]
    interval: Duration,
    #[arg(long, default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Directory for --output csv
    #[arg(long, default_value = "reports")]
    csv_dir: PathBuf,
    #[arg(long, default_value_t = 30)]
    http_timeout_secs: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn required_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

fn load_config(cli: Cli) -> anyhow::Result<Config> {
    let mode = ReportMode::from_flags(cli.all, cli.both)?;
    let api_key = required_env("TORN_API_KEY")?;
    let sheets = if cli.output == OutputKind::Sheets {
        Some(SheetsCredentials {
            spreadsheet_id: required_env("SPREADSHEET_ID")?,
            access_token: required_env("GOOGLE_SHEETS_TOKEN")
                .context("sheets output needs an OAuth access token")?,
        })
    } else {
        None
    };

    let config = Config {
        base_url: cli.base_url,
        api_key,
        mode,
        output: cli.output,
        targets: Targets {
            not_in_oc: cli.range_noc,
            all: cli.range_all,
        },
        interval: Some(cli.interval).filter(|interval| !interval.is_zero()),
        csv_dir: cli.csv_dir,
        http_timeout: Duration::from_secs(cli.http_timeout_secs),
        sheets,
    };
    config.validate()?;
    Ok(config)
}

async fn run_with_sink<S: ReportSink>(api: impl FactionApi, sink: S, config: &Config) {
    ReportRunner::new(
        api,
        sink,
        config.mode,
        config.targets.clone(),
        scheduler::local_now,
    )
    .run(config.interval)
    .await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli).context("invalid configuration")?;

    let api = TornClient::new(&config.base_url, &config.api_key, config.http_timeout)
        .context("failed to build API client")?;

    match config.output {
        OutputKind::Stdout => {
            let headings = config.mode == ReportMode::Both;
            run_with_sink(api, ConsoleSink::stdout(headings), &config).await;
        }
        OutputKind::Sheets => {
            let credentials = config
                .sheets
                .clone()
                .context("sheets output requires spreadsheet credentials")?;
            let http = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()
                .context("failed to build sheets client")?;
            let client = SheetsClient::new(
                http,
                &credentials.spreadsheet_id,
                &credentials.access_token,
            );
            run_with_sink(api, TabularEmitter::new(client), &config).await;
        }
        OutputKind::Csv => {
            let directory = CsvDirectory::new(config.csv_dir.clone());
            run_with_sink(api, TabularEmitter::new(directory), &config).await;
        }
    }

    Ok(())
}
