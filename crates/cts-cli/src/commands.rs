use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use cts_cli::pipeline::{self, RunReport, TermEvent};
use cts_cli::settings::{DEFAULT_SETTINGS_FILE, Settings};
use cts_cli::terms::read_terms_file;
use cts_registry::{CancelToken, QueryOrchestrator};

use crate::cli::QueryArgs;

/// Explicit `--config` must exist; the default file is optional.
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let settings = match config {
        Some(path) => Settings::load(path).context("load settings")?,
        None => Settings::load_or_default(Path::new(DEFAULT_SETTINGS_FILE))
            .context("load settings")?,
    };
    Ok(settings)
}

pub fn run_config(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    settings.validate().context("validate settings")?;
    print!("{}", settings.to_toml_string().context("render settings")?);
    Ok(())
}

pub async fn run_query(args: &QueryArgs, config: Option<&Path>) -> Result<RunReport> {
    let mut settings = load_settings(config)?;
    apply_overrides(&mut settings, args);
    settings.validate().context("validate settings")?;

    let terms = collect_terms(args)?;
    let cancel = CancelToken::new();
    let orchestrator = QueryOrchestrator::http(settings.registry.clone())
        .context("build registry client")?
        .with_cancel_token(cancel.clone());
    spawn_interrupt_handler(cancel);

    let today = Local::now().date_naive();
    let progress = progress_bar(terms.len(), args.no_progress);
    let observer = |event: &TermEvent<'_>| {
        if event.failed {
            progress.set_message(format!("{} (failed)", event.term));
        } else {
            progress.set_message(format!("{} ({} records)", event.term, event.records));
        }
        progress.inc(1);
    };
    let result = pipeline::run(&terms, &settings, &orchestrator, today, observer).await;
    progress.finish_and_clear();
    let report = result.context("run pipeline")?;

    if let Some(path) = &args.json {
        write_json(&report, path).with_context(|| format!("write {}", path.display()))?;
        info!("Wrote run report to {}", path.display());
    }
    Ok(report)
}

fn apply_overrides(settings: &mut Settings, args: &QueryArgs) {
    if let Some(max_records) = args.max_records {
        settings.registry.max_records = max_records;
    }
    if let Some(workers) = args.workers {
        settings.run.workers = workers;
    }
    if let Some(delay_ms) = args.delay_ms {
        settings.registry.rate_limit_delay_ms = delay_ms;
    }
    if args.no_filters {
        settings.filters.apply = false;
    }
    if args.retain_raw {
        settings.run.retain_raw = true;
    }
}

/// Positional terms first, then terms from `--terms-file`.
fn collect_terms(args: &QueryArgs) -> Result<Vec<String>> {
    let mut terms: Vec<String> = args
        .terms
        .iter()
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
        .collect();
    if let Some(path) = &args.terms_file {
        let from_file =
            read_terms_file(path).with_context(|| format!("read terms file {}", path.display()))?;
        terms.extend(from_file);
    }
    if terms.is_empty() {
        bail!("no disease terms given; pass TERMS or --terms-file");
    }
    Ok(terms)
}

fn spawn_interrupt_handler(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing in-flight requests");
            cancel.cancel();
        }
    });
}

fn progress_bar(terms: usize, hidden: bool) -> ProgressBar {
    if hidden || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(terms as u64);
    let style = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn write_json(report: &RunReport, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
