use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing::info;

use crate::establishments::{ConfigStore, EstablishmentConfig, PaymentMethod};
use crate::settings::{
    clean_base_override, probe_writable, resolve_base_dir, save_base_override, StoreSettings,
};

use super::{print_json, ConfigCommand};

pub(super) fn run(settings: &StoreSettings, cmd: ConfigCommand) -> anyhow::Result<()> {
    let store = ConfigStore::new(settings.paths());
    match cmd {
        ConfigCommand::Show { establishment } => print_json(&store.read(&establishment)?),
        ConfigCommand::Save { name, id, methods } => {
            let mut config = EstablishmentConfig::new(
                id.unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string()),
                name.trim(),
            );
            if !methods.is_empty() {
                config.enabled_methods = parse_methods(&methods)?;
            }
            store.save(&config)?;
            print_json(&config)
        }
        ConfigCommand::Delete { establishment } => {
            store.delete(&establishment)?;
            print_json(&serde_json::json!({ "success": true }))
        }
        ConfigCommand::Scan => print_json(&store.scan()?),
    }
}

fn parse_methods(labels: &[String]) -> anyhow::Result<Vec<PaymentMethod>> {
    let mut methods = Vec::new();
    for label in labels.iter().filter(|l| !l.trim().is_empty()) {
        let method = PaymentMethod::from_label(label)
            .ok_or_else(|| anyhow!("unknown payment method {label:?}"))?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    Ok(methods)
}

/// Check the folder and, when `env_dir` is given, remember it in that
/// directory's `.env.local` for the next start.
pub(super) fn probe(
    settings: &StoreSettings,
    dir: Option<&str>,
    env_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let cleaned = dir.and_then(clean_base_override);
    let target: PathBuf = match cleaned.as_deref() {
        Some(dir) => resolve_base_dir(Some(dir)),
        None => settings.base_dir.clone(),
    };
    probe_writable(&target)
        .with_context(|| format!("probe of {} failed", target.display()))?;

    let saved = match env_dir {
        Some(env_dir) => {
            let value = cleaned.unwrap_or_else(|| target.display().to_string());
            let env_file = save_base_override(env_dir, &value)?;
            info!(path = %target.display(), env_file = %env_file.display(), "data directory saved");
            Some(env_file)
        }
        None => None,
    };
    print_json(&serde_json::json!({ "success": true, "path": target, "savedTo": saved }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DATA_PATH_ENV, ENV_FILE_NAME};

    #[test]
    fn test_parse_methods_dedups_and_rejects_unknown() {
        let labels = vec!["Pix".to_string(), "pix".to_string(), "Dinheiro".to_string()];
        assert_eq!(
            parse_methods(&labels).unwrap(),
            vec![PaymentMethod::Pix, PaymentMethod::Cash]
        );
        assert!(parse_methods(&["Cheque".to_string()]).is_err());
    }

    #[test]
    fn test_save_and_scan_through_cli_handlers() {
        let base = std::env::temp_dir().join(format!("caixa_cli_{}", uuid::Uuid::new_v4()));
        let settings = StoreSettings::with_base(&base);

        run(
            &settings,
            ConfigCommand::Save {
                name: "Loja Centro".into(),
                id: Some("1".into()),
                methods: vec!["Pix".into()],
            },
        )
        .unwrap();

        let stored = ConfigStore::new(settings.paths())
            .read("Loja_Centro")
            .unwrap()
            .unwrap();
        assert_eq!(stored.id, "1");
        assert_eq!(stored.enabled_methods, vec![PaymentMethod::Pix]);

        run(&settings, ConfigCommand::Scan).unwrap();
        let _ = std::fs::remove_dir_all(&base);
    }

    #[test]
    fn test_probe_save_remembers_checked_folder() {
        let root = std::env::temp_dir().join(format!("caixa_cli_{}", uuid::Uuid::new_v4()));
        let target = root.join("dados loja");
        let settings = StoreSettings::with_base(root.join("unused"));

        probe(&settings, Some(&target.display().to_string()), Some(&root)).unwrap();

        assert!(target.is_dir());
        let entries: Vec<(String, String)> = dotenvy::from_path_iter(root.join(ENV_FILE_NAME))
            .unwrap()
            .map(|item| item.unwrap())
            .collect();
        assert_eq!(
            entries,
            vec![(DATA_PATH_ENV.to_string(), target.display().to_string())]
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_probe_without_save_writes_no_env_file() {
        let root = std::env::temp_dir().join(format!("caixa_cli_{}", uuid::Uuid::new_v4()));
        let settings = StoreSettings::with_base(root.join("dados"));

        probe(&settings, None, None).unwrap();

        assert!(root.join("dados").is_dir());
        assert!(!root.join(ENV_FILE_NAME).exists());
        let _ = std::fs::remove_dir_all(&root);
    }
}
