use std::process::ExitCode;

use acp_config::ConfigError;
use acpd::LaunchError;

fn main() -> ExitCode {
    match acpd::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        // Lets clap print usage, help or version with its own exit status.
        Err(LaunchError::Config {
            source: ConfigError::Arguments(error),
        }) => error.exit(),
        Err(error) => {
            eprintln!("acpd: {error}");
            ExitCode::FAILURE
        }
    }
}
