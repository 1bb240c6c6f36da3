//! Command-line surface: argument parsing and the non-interactive
//! `analyze` / `health` commands.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use crate::api::{DiagnosisBackend, HttpBackend};
use crate::core::config::ResolvedConfig;
use crate::core::effects::{self, AnalyzeError};
use crate::tui::components::report::{export_plain, wrap_plain};

/// Column width for reports printed to stdout.
const REPORT_WIDTH: usize = 100;

#[derive(Parser, Debug)]
#[command(name = "medchat", version, about = "Terminal client for a clinical-reasoning chat service")]
pub struct Args {
    /// Backend base URL (overrides MEDCHAT_API_URL and the config file)
    #[arg(long)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Analyze a free-text case description and print the report
    Analyze {
        /// File with the case text, or `-` for stdin
        file: String,
    },
    /// Check that the backend is reachable
    Health,
}

async fn read_case_text(file: &str) -> std::io::Result<String> {
    if file == "-" {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(file).await
    }
}

/// Run a one-shot analysis and format the report for the terminal.
pub async fn analyze_report(
    backend: &dyn DiagnosisBackend,
    case_text: &str,
) -> Result<String, AnalyzeError> {
    let assessment = effects::analyze_case(backend, case_text).await?;
    Ok(wrap_plain(&export_plain(&assessment), REPORT_WIDTH))
}

pub async fn analyze(config: &ResolvedConfig, file: &str) -> ExitCode {
    let case_text = match read_case_text(file).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Could not read {file}: {e}");
            return ExitCode::FAILURE;
        }
    };
    let backend = HttpBackend::new(&config.api_url, config.request_timeout);
    match analyze_report(&backend, &case_text).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::warn!("Analysis failed: {}", e);
            eprintln!("Analysis failed: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn health(config: &ResolvedConfig) -> ExitCode {
    let backend = HttpBackend::new(&config.api_url, config.request_timeout);
    match backend.health().await {
        Ok(true) => {
            println!("{}: ok", config.api_url);
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("{}: unhealthy", config.api_url);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}: {}", config.api_url, e.user_message());
            ExitCode::FAILURE
        }
    }
}
