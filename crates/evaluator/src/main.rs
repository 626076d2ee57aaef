use std::process::ExitCode;

use anyhow::Result;
use common::error::PersonaError;
use evaluator::cli;
use evaluator::service::PersonaService;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cmd = match cli::parse_args(std::env::args()) {
        Ok(cmd) => cmd,
        Err(usage) => {
            eprintln!("{usage}");
            return Ok(ExitCode::from(2));
        }
    };

    let config = common::config::Config::load()?;
    let _otel_guard = common::observability::init("evaluator", &config.general.log_level)?;

    if let Some(port) = config.observability.prometheus_port {
        evaluator::metrics::install_prometheus(port)?;
        evaluator::metrics::describe();
    }

    let svc = PersonaService::from_config(&config.chain)?;
    tracing::debug!(endpoints = svc.client().pool().len(), ?cmd, "running command");

    match cli::run_command(&svc, cmd).await {
        Ok(out) => {
            println!("{out}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            let retryable = e
                .downcast_ref::<PersonaError>()
                .is_some_and(PersonaError::is_retryable);
            if retryable {
                eprintln!("this looks transient; try again in a moment");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
