use std::process::ExitCode;

use caixa_ledger_lib::commands::{self, Cli};
use caixa_ledger_lib::settings::load_env_file;
use clap::Parser;
use tracing::{debug, error, info, warn};

fn main() -> ExitCode {
    // Before logging so a RUST_LOG kept in .env.local applies too.
    let env_file = std::env::current_dir()
        .map_err(|e| e.to_string())
        .and_then(|dir| load_env_file(&dir).map_err(|e| e.to_string()));

    let cli = Cli::parse();
    caixa_ledger_lib::init_logging(cli.verbose);
    info!("Starting Caixa Ledger v{}", env!("CARGO_PKG_VERSION"));
    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "environment file loaded"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "environment file ignored"),
    }

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(commands::exit_code(&e))
        }
    }
}
