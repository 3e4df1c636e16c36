//! Per-establishment configuration stored as `<base>/<slug>/config.json`.
//!
//! The file is small and rewritten wholesale on every save; there is no
//! partial update and no cache, every call goes to disk.

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{Result, StoreError};
use crate::paths::StoragePaths;

/// Payment methods an establishment can offer. Serialized with the labels
/// shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Dinheiro")]
    Cash,
    #[serde(rename = "Pix")]
    Pix,
    #[serde(rename = "Crédito")]
    Credit,
    #[serde(rename = "Débito")]
    Debit,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Pix,
        PaymentMethod::Credit,
        PaymentMethod::Debit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::Pix => "Pix",
            PaymentMethod::Credit => "Crédito",
            PaymentMethod::Debit => "Débito",
        }
    }

    pub fn from_label(label: &str) -> Option<PaymentMethod> {
        let wanted = label.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(wanted))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstablishmentConfig {
    pub id: String,
    pub name: String,
    /// Storage identifier: slug of `name`, also the folder name on disk.
    pub file_name: String,
    pub enabled_methods: Vec<PaymentMethod>,
}

impl EstablishmentConfig {
    /// New config with a slugged storage identifier and every method enabled.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            file_name: crate::paths::slugify(name.trim()),
            name,
            enabled_methods: PaymentMethod::ALL.to_vec(),
        }
    }
}

/// Turn a folder name into a display name: `mercado_oasis` -> `Mercado Oasis`.
pub fn readable_name(folder: &str) -> String {
    folder
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    paths: StoragePaths,
}

impl ConfigStore {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    /// `Ok(None)` when the establishment has never been saved.
    pub fn read(&self, establishment: &str) -> Result<Option<EstablishmentConfig>> {
        let path = self.paths.config_path(establishment)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no establishment config on disk");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::unavailable(
                    format!("failed to read configuration {}", path.display()),
                    e,
                ))
            }
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| {
            warn!(path = %path.display(), error = %e, "establishment config is corrupt");
            StoreError::corrupt(&path, e)
        })
    }

    /// Overwrite the config stored under `config.file_name`.
    pub fn save(&self, config: &EstablishmentConfig) -> Result<()> {
        let path = self.paths.config_path(&config.file_name)?;
        let body = serde_json::to_string_pretty(config).map_err(|e| {
            StoreError::unavailable(
                format!("failed to encode configuration for {}", config.name),
                io::Error::new(io::ErrorKind::InvalidData, e),
            )
        })?;
        fs::write(&path, body).map_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to save establishment config");
            StoreError::unavailable(
                format!("failed to save configuration for {}", config.name),
                e,
            )
        })?;
        info!(
            establishment = %config.file_name,
            methods = config.enabled_methods.len(),
            "establishment config saved"
        );
        Ok(())
    }

    /// Remove the config file. Succeeds when there was nothing to remove.
    pub fn delete(&self, establishment: &str) -> Result<()> {
        let path = self.paths.config_path(establishment)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "establishment config deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete establishment config");
                Err(StoreError::unavailable(
                    format!("failed to delete configuration for {establishment}"),
                    e,
                ))
            }
        }
    }

    /// Propose a config for every visible folder under the base directory.
    /// Nothing is written; callers decide which proposals to save.
    pub fn scan(&self) -> Result<Vec<EstablishmentConfig>> {
        let base = self.paths.base();
        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::BaseDirMissing {
                    path: base.to_path_buf(),
                })
            }
            Err(e) => {
                return Err(StoreError::unavailable(
                    format!("failed to list {}", base.display()),
                    e,
                ))
            }
        };

        let mut folders: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        folders.sort();

        debug!(base = %base.display(), found = folders.len(), "scanned for establishments");
        Ok(folders
            .into_iter()
            .map(|folder| EstablishmentConfig {
                id: format!("scan_{folder}"),
                name: readable_name(&folder),
                file_name: folder,
                enabled_methods: PaymentMethod::ALL.to_vec(),
            })
            .collect())
    }
}
