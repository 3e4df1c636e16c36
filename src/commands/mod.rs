//! Operator CLI: one subcommand per store operation.
//!
//! Handlers print rows and configs as JSON on stdout. Failures bubble up as
//! `anyhow::Error`; [`exit_code`] maps store errors back to a stable code.

mod config;
mod sales;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::errors::{ErrorKind, StoreError};
use crate::settings::{clean_base_override, StoreSettings};

#[derive(Parser, Debug)]
#[command(
    name = "caixa-ledger",
    version,
    about = "Per-establishment monthly sales ledger"
)]
pub struct Cli {
    /// Base data directory (overrides CUSTOM_DATA_PATH)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// Log at debug level regardless of RUST_LOG
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record one row per amount in the current month
    Add {
        establishment: String,
        /// Amounts, e.g. `15,00 22.50 30`
        #[arg(required = true, num_args = 1..)]
        amounts: Vec<String>,
        /// Venda, Gasto or Outro
        #[arg(long)]
        kind: Option<String>,
        /// Payment label, e.g. `Pix` or `Crédito (Visa)`
        #[arg(long)]
        payment: Option<String>,
    },
    /// Print the rows of a month, newest first
    List {
        establishment: String,
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Print monthly totals
    Summary {
        establishment: String,
        #[arg(long)]
        month: Option<String>,
    },
    /// Mark rows as paid
    Pay {
        establishment: String,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Return rows to pending
    Unpay {
        establishment: String,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Correct the amount of one row
    SetValue {
        establishment: String,
        id: String,
        value: String,
    },
    /// Remove one row from the current month
    Delete { establishment: String, id: String },
    /// Establishment configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Check that a folder can hold the data directory
    Probe {
        /// Folder to check (defaults to the resolved data directory)
        dir: Option<String>,
        /// Remember the folder in .env.local once the check passes
        #[arg(long)]
        save: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the stored configuration (or null)
    Show { establishment: String },
    /// Create or overwrite a configuration
    Save {
        /// Display name; the storage folder is derived from it
        name: String,
        /// Client id (defaults to the current time in milliseconds)
        #[arg(long)]
        id: Option<String>,
        /// Enabled payment methods (defaults to all)
        #[arg(long, value_delimiter = ',')]
        methods: Vec<String>,
    },
    /// Remove a configuration
    Delete { establishment: String },
    /// Propose configurations for the folders found under the data directory
    Scan,
}

/// Flag first, then `CUSTOM_DATA_PATH`. A blank flag counts as absent.
pub fn resolve_settings(data_dir: Option<&str>) -> StoreSettings {
    match data_dir.and_then(clean_base_override) {
        Some(dir) => StoreSettings::from_override(Some(&dir)),
        None => StoreSettings::from_env(),
    }
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = resolve_settings(cli.data_dir.as_deref());
    debug!(
        base = %settings.base_dir.display(),
        custom = settings.custom,
        "data directory resolved"
    );

    match cli.command {
        Command::Add {
            establishment,
            amounts,
            kind,
            payment,
        } => sales::add(
            &settings,
            &establishment,
            &amounts.join(" "),
            kind.as_deref(),
            payment.as_deref(),
        ),
        Command::List {
            establishment,
            month,
        } => sales::list(&settings, &establishment, month.as_deref()),
        Command::Summary {
            establishment,
            month,
        } => sales::summary(&settings, &establishment, month.as_deref()),
        Command::Pay { establishment, ids } => sales::set_paid(&settings, &establishment, &ids, true),
        Command::Unpay { establishment, ids } => {
            sales::set_paid(&settings, &establishment, &ids, false)
        }
        Command::SetValue {
            establishment,
            id,
            value,
        } => sales::set_value(&settings, &establishment, &id, &value),
        Command::Delete { establishment, id } => sales::delete(&settings, &establishment, &id),
        Command::Config(cmd) => config::run(&settings, cmd),
        Command::Probe { dir, save } => {
            let env_dir = if save {
                Some(std::env::current_dir().context("working directory is not accessible")?)
            } else {
                None
            };
            config::probe(&settings, dir.as_deref(), env_dir.as_deref())
        }
    }
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StoreError>().map(StoreError::kind) {
        Some(ErrorKind::NotFound) => 2,
        Some(ErrorKind::WriteConflict) => 3,
        Some(ErrorKind::StorageUnavailable) => 4,
        Some(ErrorKind::Corrupt) => 5,
        Some(ErrorKind::InvalidInput) => 6,
        None => 1,
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_flags() {
        let cli = Cli::parse_from([
            "caixa-ledger",
            "--data-dir",
            "/tmp/x",
            "add",
            "loja_centro",
            "15,00",
            "22.50",
            "--payment",
            "Pix",
        ]);
        assert_eq!(cli.data_dir.as_deref(), Some("/tmp/x"));
        match cli.command {
            Command::Add {
                establishment,
                amounts,
                kind,
                payment,
            } => {
                assert_eq!(establishment, "loja_centro");
                assert_eq!(amounts, vec!["15,00", "22.50"]);
                assert_eq!(kind, None);
                assert_eq!(payment.as_deref(), Some("Pix"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_save_methods() {
        let cli = Cli::parse_from([
            "caixa-ledger",
            "config",
            "save",
            "Loja Centro",
            "--methods",
            "Pix,Dinheiro",
        ]);
        match cli.command {
            Command::Config(ConfigCommand::Save { name, methods, id }) => {
                assert_eq!(name, "Loja Centro");
                assert_eq!(methods, vec!["Pix", "Dinheiro"]);
                assert_eq!(id, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_blank_flag_falls_back_to_env() {
        std::env::set_var(crate::settings::DATA_PATH_ENV, "/srv/caixa");
        let settings = resolve_settings(Some("  \"\"  "));
        std::env::remove_var(crate::settings::DATA_PATH_ENV);
        assert_eq!(settings.base_dir, PathBuf::from("/srv/caixa"));
        assert!(settings.custom);
    }

    #[test]
    #[serial]
    fn test_flag_overrides_env() {
        std::env::set_var(crate::settings::DATA_PATH_ENV, "/srv/caixa");
        let settings = resolve_settings(Some("/mnt/other"));
        std::env::remove_var(crate::settings::DATA_PATH_ENV);
        assert_eq!(settings.base_dir, PathBuf::from("/mnt/other"));
    }

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let missing: anyhow::Error = StoreError::RowNotFound {
            id: "x".into(),
            path: PathBuf::from("vendas.xlsx"),
        }
        .into();
        assert_eq!(exit_code(&missing), 2);
        let bad_month: anyhow::Error = StoreError::InvalidMonth {
            value: "13".into(),
        }
        .into();
        assert_eq!(exit_code(&bad_month), 6);
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }

    #[test]
    fn test_parse_probe_save() {
        let cli = Cli::parse_from(["caixa-ledger", "probe", "/mnt/dados", "--save"]);
        match cli.command {
            Command::Probe { dir, save } => {
                assert_eq!(dir.as_deref(), Some("/mnt/dados"));
                assert!(save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
