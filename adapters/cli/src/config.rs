use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use progression_system_level_generation::TemplateConfig;
use serde::Deserialize;

/// Configuration file read when `--config` is not supplied.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "progression.toml";

/// Settings recognized in the configuration file.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Location of the persisted progress document.
    pub(crate) store_path: PathBuf,
    /// Seed every generated level is derived from.
    pub(crate) generator_seed: u64,
    /// Log filter used when neither `RUST_LOG` nor `--verbose` is set.
    pub(crate) log_level: String,
    /// Templates registered in addition to the built-in ones.
    pub(crate) templates: Vec<TemplateConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("progression.json"),
            generator_seed: 0x9e37_79b9_7f4a_7c15,
            log_level: "info".to_owned(),
            templates: Vec::new(),
        }
    }
}

impl Config {
    /// Reads the configuration at `path`, or defaults when the file does not exist.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read config file {}", path.display()))
            }
        };
        Self::parse(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progression_core::{LevelKind, ObjectiveKind};

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").expect("empty config parses");
        assert_eq!(config.store_path, PathBuf::from("progression.json"));
        assert_eq!(config.log_level, "info");
        assert!(config.templates.is_empty());
    }

    #[test]
    fn reads_templates_and_overrides() {
        let config = Config::parse(
            r#"
                store_path = "saves/slot-1.json"
                generator_seed = 77
                log_level = "warn"

                [[templates]]
                name = "siege"
                kind = "Defense"
                enemy_pool = ["ram", "archer"]
                objectives = ["ProtectBase", "DestroyAllEnemies"]
                enemy_count = { min = 2, max = 5 }
                time_limit = { min_ms = 90000, max_ms = 150000 }
            "#,
        )
        .expect("config parses");

        assert_eq!(config.store_path, PathBuf::from("saves/slot-1.json"));
        assert_eq!(config.generator_seed, 77);
        assert_eq!(config.templates.len(), 1);
        let siege = &config.templates[0];
        assert_eq!(siege.kind, LevelKind::Defense);
        assert_eq!(
            siege.objectives,
            vec![ObjectiveKind::ProtectBase, ObjectiveKind::DestroyAllEnemies]
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("store = \"typo.json\"").is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Config::load(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(config.generator_seed, Config::default().generator_seed);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("progression.toml");
        fs::write(&path, "generator_seed = \"many\"").expect("write config");

        let error = Config::load(&path).expect_err("seed must be numeric");

        assert!(format!("{error:#}").contains("progression.toml"));
    }
}
