mod cli;
mod summary;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate, Utc};
use clap::Parser;
use nextin_core::client::{AnalyzerClient, ApiError, ClientConfig};
use nextin_core::export::{self, ExportEnvelope};
use nextin_core::report::{ReportError, ReportOptions, render_pdf};
use nextin_core::{AnalysisResult, InputError, validate_target_url};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, ExportTargets};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("{}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Analyze { url, export } => {
            let url = validate_target_url(url)?;
            let client = connect(cli)?;
            eprintln!("Analyzing {url} ...");
            let analysis = client.analyze(&url).await?;
            print!("{}", summary::render_analysis(&analysis, &url));
            save_exports(&cli.report_options(), &analysis, &url, export, today())?;
        }
        Commands::Show { id, url, export } => {
            let url = stored_analysis_url(url.as_deref(), export)?;
            let client = connect(cli)?;
            let analysis = client
                .analysis(id)
                .await
                .with_context(|| format!("failed to load analysis {id}"))?;
            let label = url.clone().unwrap_or_else(|| format!("analysis {id}"));
            print!("{}", summary::render_analysis(&analysis, &label));

            if let Some(url) = url.filter(|_| export.json || export.pdf) {
                save_exports(&cli.report_options(), &analysis, &url, export, today())?;
            }
        }
        Commands::Export {
            file,
            url,
            pdf,
            json,
        } => {
            let saved = export::read_saved(file)?;
            let url = match url {
                Some(url) => validate_target_url(url)?,
                None => saved.url().map(str::to_string).ok_or_else(|| {
                    anyhow!("{} has no website URL; pass --url", file.display())
                })?,
            };
            let analysis = saved.into_analysis();

            // With no explicit target, write the PDF under its default name.
            let pdf = match (pdf, json) {
                (None, None) => Some(PathBuf::from(export::pdf_filename(today()))),
                (pdf, _) => pdf.clone(),
            };
            if let Some(path) = json {
                save_json(path, &analysis, &url)?;
            }
            if let Some(path) = pdf {
                save_pdf(&path, &cli.report_options(), &analysis, &url)?;
            }
        }
        Commands::Recent => {
            let client = connect(cli)?;
            let recent = client.recent().await?;
            print!("{}", summary::render_recent(&recent));
        }
        Commands::Health => {
            let client = connect(cli)?;
            let health = client.health().await?;
            print!("{}", summary::render_health(client.base_url(), &health));
            if !health.is_healthy() {
                return Err(anyhow!(
                    "analysis service reports status '{}'",
                    health.status.as_deref().unwrap_or_default()
                ));
            }
        }
    }
    Ok(())
}

fn connect(cli: &Cli) -> Result<AnalyzerClient> {
    let client = AnalyzerClient::new(ClientConfig {
        base_url: cli.api_url.clone(),
        timeout: cli.timeout(),
    })?;
    tracing::debug!(base_url = client.base_url(), "using analysis service");
    Ok(client)
}

/// Checks `show --url` before any request; exports need a valid URL
fn stored_analysis_url(url: Option<&str>, targets: &ExportTargets) -> Result<Option<String>> {
    let url = url.map(validate_target_url).transpose()?;
    if url.is_none() && (targets.json || targets.pdf) {
        return Err(anyhow!("pass --url to export a stored analysis"));
    }
    Ok(url)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Write the exports requested on the command line; returns the written paths
fn save_exports(
    options: &ReportOptions,
    analysis: &AnalysisResult,
    url: &str,
    targets: &ExportTargets,
    date: NaiveDate,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if targets.json {
        let path = targets.out_dir.join(export::json_filename(date));
        save_json(&path, analysis, url)?;
        written.push(path);
    }
    if targets.pdf {
        let path = targets.out_dir.join(export::pdf_filename(date));
        save_pdf(&path, options, analysis, url)?;
        written.push(path);
    }
    Ok(written)
}

fn save_json(path: &Path, analysis: &AnalysisResult, url: &str) -> Result<()> {
    let envelope = ExportEnvelope::new(url, analysis.clone(), Utc::now());
    export::write_json(path, &envelope)?;
    println!("\nWrote JSON export to {}", path.display());
    Ok(())
}

fn save_pdf(path: &Path, options: &ReportOptions, analysis: &AnalysisResult, url: &str) -> Result<()> {
    let bytes = render_pdf(analysis, url, options)?;
    export::write_pdf(path, &bytes)?;
    println!("\nWrote PDF report to {}", path.display());
    Ok(())
}

/// The line shown to the user for a failed command
fn user_message(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(input) = cause.downcast_ref::<InputError>() {
            return input.to_string();
        }
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return match api {
                ApiError::Rejected(message) | ApiError::Status { message, .. } => {
                    format!("Analysis failed: {message}")
                }
                ApiError::Timeout(_) | ApiError::Network(_) => {
                    format!("Network error occurred: {api}")
                }
                other => other.to_string(),
            };
        }
        if let Some(report) = cause.downcast_ref::<ReportError>() {
            return match report {
                ReportError::TableRendering { section, .. } => format!(
                    "PDF export failed: table layout engine not loaded properly while drawing '{section}'."
                ),
                ReportError::Backend(_) => format!("Error exporting PDF report: {report}"),
            };
        }
    }
    format!("Error: {err:#}")
}
