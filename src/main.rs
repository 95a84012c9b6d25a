use clap::Parser;
use plugtidy::cli::{Cli, CliContext, run_cli};
use plugtidy::config::OrganizerConfig;
use plugtidy::logging::init_logging;
use plugtidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match OrganizerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let context = CliContext::new(config, cli.record.clone());
    let _log_guard = init_logging(&context.log_path, cli.verbose);

    match run_cli(&cli.command, &context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            OutputFormatter::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}
