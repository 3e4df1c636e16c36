//! Caixa Ledger: per-establishment monthly sales ledgers kept as spreadsheet
//! files, plus a JSON configuration per establishment.
//!
//! ```text
//! <base>/<establishment>/config.json
//! <base>/<establishment>/<yyyy>/<NN-MonthName>/vendas.xlsx
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod commands;
pub mod errors;
pub mod establishments;
pub mod ledger;
pub mod paths;
pub mod report;
pub mod rows;
pub mod settings;
pub mod xlsx;

pub use errors::{ErrorKind, Result, StoreError};
pub use establishments::{ConfigStore, EstablishmentConfig, PaymentMethod};
pub use ledger::LedgerStore;
pub use paths::StoragePaths;
pub use rows::{Amount, LedgerRow, RowPatch};
pub use settings::StoreSettings;

/// Install the global tracing subscriber. `RUST_LOG` wins unless `verbose`.
pub fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,caixa_ledger_lib=debug"))
    };

    // Logs go to stderr so stdout stays parseable JSON.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
