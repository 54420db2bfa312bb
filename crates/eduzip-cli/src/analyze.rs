//! The `analyze` command: queue files, run the batch, print and export rows.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use eduzip_client::UpstageClient;
use eduzip_core::{AppConfig, UploadedFile};
use eduzip_ingest::{IngestEvent, LogLevel, Orchestrator};
use eduzip_store::{Session, to_clipboard_text, write_csv};

use crate::display;

pub struct Options {
    pub files: Vec<PathBuf>,
    pub out: PathBuf,
    pub tsv: bool,
    pub raw: bool,
}

pub async fn run(config: &AppConfig, opts: Options) -> anyhow::Result<()> {
    let mut session = Session::new();

    let uploads = opts
        .files
        .iter()
        .map(|path| read_upload(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let rejected = session.add_files(uploads, &config.pipeline);
    if rejected > 0 {
        eprintln!(
            "Skipped {rejected} file(s): only {} are supported.",
            config.pipeline.supported_extensions.join(", ")
        );
    }
    if session.files().is_empty() {
        bail!("no supported files to analyse");
    }

    eprintln!("Queued {} file(s):", session.files().len());
    eprint!("{}", display::render_file_list(session.files()));

    let client = UpstageClient::new(&config.upstage).context("building HTTP client")?;
    let orchestrator = Orchestrator::new(client, config.upstage.clone(), config.pipeline.clone());

    let report = orchestrator
        .run_batch(&mut session, |event| match event {
            IngestEvent::Log(entry) => match entry.level {
                LogLevel::Error => eprintln!("  ✗ {entry}"),
                LogLevel::Success => eprintln!("  ✓ {entry}"),
                LogLevel::Info => eprintln!("    {entry}"),
            },
            IngestEvent::Progress { processed, total } => {
                eprintln!("  [{processed}/{total}]");
            }
            IngestEvent::State { .. } => {}
        })
        .await
        .context("analysis could not start; set UPSTAGE_API_KEY or upstage.proxy_url")?;

    eprintln!();
    eprintln!("{}", display::render_summary(&report));

    if opts.raw {
        for exchange in session.raw_exchanges() {
            println!("{}", serde_json::to_string_pretty(exchange)?);
        }
    }

    let results = session.results();
    if results.is_empty() {
        eprintln!("No rows to export.");
        return Ok(());
    }

    println!();
    print!("{}", display::render_results(results.records(), &report.needs_review));
    if !report.needs_review.is_empty() {
        eprintln!(
            "{} row(s) could not be filled automatically and need manual entry.",
            report.needs_review.len()
        );
    }

    if opts.tsv {
        println!();
        println!("{}", to_clipboard_text(results)?);
    }

    let path = write_csv(results, session.id(), &opts.out)
        .with_context(|| format!("writing CSV into {}", opts.out.display()))?;
    eprintln!("CSV written to {}", path.display());
    Ok(())
}

fn read_upload(path: &Path) -> anyhow::Result<UploadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadedFile::new(name, bytes))
}
