use std::fs::File;
use std::process::ExitCode;

use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

use medchat::cli::{self, Args, Command};
use medchat::core::config;
use medchat::tui;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // The TUI owns the terminal, so logs go to medchat.log in the working directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("medchat.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let config = config::load_and_resolve(args.api_url.as_deref());
    log::info!("medchat starting up against {}", config.api_url);

    match args.command {
        None => match tui::run(config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Terminal error: {e}");
                ExitCode::FAILURE
            }
        },
        Some(Command::Analyze { file }) => cli::analyze(&config, &file).await,
        Some(Command::Health) => cli::health(&config).await,
    }
}
