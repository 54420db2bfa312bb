//! eduzip: extract privacy-compliance checklist rows from PDF/HWP forms.
//!
//! Usage:
//!   eduzip analyze <FILES>...   Parse and analyse documents, write a CSV
//!   eduzip serve                Run the credential proxy
//!   eduzip config               Show the resolved configuration

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use eduzip_core::{AnalysisMode, AppConfig};
use tracing_subscriber::EnvFilter;

mod analyze;
mod display;

#[derive(Parser)]
#[command(name = "eduzip", version, about = "Learning-software selection checklist analyser")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse documents and extract one checklist row per software.
    Analyze {
        /// PDF or HWP files, processed in the order given.
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Extraction method (defaults to the configured pipeline mode).
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
        /// Directory for the CSV export.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Also print the rows as tab-separated text for pasting.
        #[arg(long)]
        tsv: bool,
        /// Print the raw parse and analysis responses.
        #[arg(long)]
        raw: bool,
    },
    /// Run the credential proxy.
    Serve {
        /// Listen address (defaults to proxy.bind).
        #[arg(long)]
        bind: Option<String>,
    },
    /// Print the resolved configuration with the API key masked.
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Ask the chat model to fill in the checklist.
    Ai,
    /// Read the checklist table from the parsed layout.
    Table,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Ai => AnalysisMode::Ai,
            ModeArg::Table => AnalysisMode::Table,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("loading configuration")?;
    tracing::debug!("eduzip v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Analyze {
            files,
            mode,
            out,
            tsv,
            raw,
        } => {
            if let Some(mode) = mode {
                config.pipeline.mode = mode.into();
            }
            analyze::run(
                &config,
                analyze::Options {
                    files,
                    out,
                    tsv,
                    raw,
                },
            )
            .await
        }
        Command::Serve { bind } => eduzip_proxy::serve(&config, bind.as_deref())
            .await
            .context("running credential proxy"),
        Command::Config => {
            config.upstage.api_key = config.upstage.masked_key();
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
