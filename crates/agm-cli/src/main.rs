//! `agm` binary

use agm_cli::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = cli::command().get_matches();

    let config = match cli::load_config(&matches) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::from(2);
        }
    };
    cli::init_logging(&matches, &config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli::dispatch(&matches, config, &mut out) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
