use attrouter::cli::{run_cli, Cli};
use attrouter::logging::{init_logging_with_config, LogConfig};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if std::env::var("ATTROUTER_LOG_LEVEL").is_err() {
        log_config.log_level = cli.log_level.clone();
    }
    log_config.use_stderr = true;
    // the guard must outlive the command so buffered lines are flushed
    let _guard = match init_logging_with_config(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("warning: {e:#}");
            None
        }
    };

    match run_cli(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
