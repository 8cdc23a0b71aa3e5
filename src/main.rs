mod config;
mod db;
mod error;
mod hh;
mod menu;
mod models;
mod pipeline;
mod render;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};
use crate::db::Session;
use crate::error::AppError;
use crate::hh::HhClient;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vacancydb=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let settings = config.db_settings()?;

    let (load, skip_reset, open_menu) = match config.resolved_command() {
        Command::Run => (true, false, true),
        Command::Load { skip_reset } => (true, skip_reset, false),
        Command::Menu => (false, false, true),
    };

    if load {
        let source = HhClient::new(
            &config.api_url,
            &config.user_agent,
            config.http_timeout(),
            config.http_connect_timeout(),
        )?;
        tracing::info!("Loading {} employers from {}", config.employer_ids.len(), config.api_url);

        match pipeline::run(&source, &config.employer_ids, &settings, skip_reset).await {
            Ok(report) => tracing::info!(
                "Load complete: {} employers, {} vacancies",
                report.employers.inserted,
                report.vacancies
            ),
            Err(e) => return Ok(report_failure(&e)),
        }
    }

    if open_menu {
        let session = match Session::open(&settings).await {
            Ok(session) => session,
            Err(e) => return Ok(report_failure(&e)),
        };
        menu::run(session).await?;
    }

    Ok(ExitCode::SUCCESS)
}

fn report_failure(e: &AppError) -> ExitCode {
    if e.is_connection_failure() {
        eprintln!("Unable to connect!\n{e}");
    } else {
        tracing::error!("Aborting: {e}");
    }
    ExitCode::FAILURE
}
