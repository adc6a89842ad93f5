//! Settings for `mttast-cli`, read from `~/.config/mttast/config.toml` or the
//! file named by `MTTAST_CONFIG`.
//!
//! ```toml
//! drafts_path = "$HOME/mttast/drafts"
//!
//! [paste]
//! deep_link_schemes = ["hm"]
//! detect_markdown = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the config file location.
pub const CONFIG_ENV: &str = "MTTAST_CONFIG";

const DEFAULT_DRAFTS_DIR: &str = "~/.local/share/mttast/drafts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read mttast settings from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid mttast settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("drafts_path '{value}' in {path} cannot be expanded: {reason}")]
    DraftsPath {
        path: PathBuf,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory `mttast-cli import --out` writes draft updates to.
    #[serde(default = "default_drafts_path")]
    pub drafts_path: PathBuf,
    #[serde(default)]
    pub paste: PasteConfig,
}

/// `[paste]` table: how clipboard content is imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Link schemes pasted literally instead of being parsed. A bare name
    /// such as `hm` means `hm://`.
    pub deep_link_schemes: Vec<String>,
    pub detect_markdown: bool,
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            deep_link_schemes: vec!["hm://".to_string(), "mintter://".to_string()],
            detect_markdown: true,
        }
    }
}

impl PasteConfig {
    fn normalize_schemes(&mut self) {
        for scheme in &mut self.deep_link_schemes {
            let name = scheme.trim().trim_end_matches("://").trim_end_matches(':');
            *scheme = format!("{}://", name.to_ascii_lowercase());
        }
        self.deep_link_schemes.retain(|s| s != "://");
        self.deep_link_schemes.dedup();
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drafts_path: default_drafts_path(),
            paste: PasteConfig::default(),
        }
    }
}

fn default_drafts_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_DRAFTS_DIR).as_ref())
}

impl Config {
    pub fn with_drafts_path(drafts_path: impl Into<PathBuf>) -> Self {
        Self {
            drafts_path: drafts_path.into(),
            ..Self::default()
        }
    }

    /// Reads settings from `path`. A missing file is not an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.drafts_path = expand_drafts_path(&config.drafts_path).map_err(|reason| {
            ConfigError::DraftsPath {
                path: path.to_path_buf(),
                value: config.drafts_path.display().to_string(),
                reason,
            }
        })?;
        config.paste.normalize_schemes();

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// `$MTTAST_CONFIG` when set, else `~/.config/mttast/config.toml`.
    pub fn config_path() -> PathBuf {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(shellexpand::tilde("~/.config/mttast/config.toml").as_ref()),
        }
    }

    /// Where the draft update for `document_id` is written.
    pub fn draft_file(&self, document_id: &str) -> PathBuf {
        self.drafts_path.join(format!("{document_id}.json"))
    }
}

/// Expands `~` and environment variables in a configured drafts directory.
fn expand_drafts_path(path: &Path) -> Result<PathBuf, String> {
    let raw = path.to_string_lossy();
    shellexpand::full(&raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let (_dir, path) = write_config("");

        let config = Config::load_from_path(&path).unwrap().unwrap();

        assert_eq!(config.paste, PasteConfig::default());
        assert!(!config.drafts_path.to_string_lossy().starts_with('~'));
        assert!(config.drafts_path.ends_with(".local/share/mttast/drafts"));
    }

    #[test]
    fn test_partial_paste_table_keeps_other_defaults() {
        let (_dir, path) = write_config("[paste]\ndetect_markdown = false\n");

        let config = Config::load_from_path(&path).unwrap().unwrap();

        assert!(!config.paste.detect_markdown);
        assert_eq!(
            config.paste.deep_link_schemes,
            vec!["hm://".to_string(), "mintter://".to_string()]
        );
    }

    #[test]
    fn test_bare_scheme_names_are_normalized() {
        let (_dir, path) =
            write_config("[paste]\ndeep_link_schemes = [\"HM\", \"hm://\", \"mintter:\", \"\"]\n");

        let config = Config::load_from_path(&path).unwrap().unwrap();

        assert_eq!(
            config.paste.deep_link_schemes,
            vec!["hm://".to_string(), "mintter://".to_string()]
        );
    }

    #[test]
    fn test_wrong_type_is_a_parse_error() {
        let (_dir, path) = write_config("[paste]\ndetect_markdown = \"yes\"\n");

        let result = Config::load_from_path(&path);

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_unset_variable_in_drafts_path_is_reported() {
        let (_dir, path) = write_config("drafts_path = \"$MTTAST_TEST_UNSET_ROOT/drafts\"\n");

        let err = Config::load_from_path(&path).unwrap_err();

        assert!(matches!(err, ConfigError::DraftsPath { ref value, .. } if value.contains("MTTAST_TEST_UNSET_ROOT")));
    }

    #[test]
    fn test_drafts_path_expands_env_var() {
        unsafe {
            env::set_var("MTTAST_TEST_DRAFTS_ROOT", "/custom/root");
        }
        let (_dir, path) = write_config("drafts_path = \"$MTTAST_TEST_DRAFTS_ROOT/drafts\"\n");

        let config = Config::load_from_path(&path).unwrap().unwrap();

        assert_eq!(config.drafts_path, PathBuf::from("/custom/root/drafts"));
        assert_eq!(
            config.draft_file("d1"),
            PathBuf::from("/custom/root/drafts/d1.json")
        );
        unsafe {
            env::remove_var("MTTAST_TEST_DRAFTS_ROOT");
        }
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();

        let result = Config::load_from_path(dir.path().join("nonexistent.toml")).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::with_drafts_path("/tmp/test-drafts");
        config.paste.deep_link_schemes = vec!["hm://".to_string()];

        config.save_to_path(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap().unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_path_defaults_under_home() {
        if env::var_os(CONFIG_ENV).is_some() {
            return;
        }
        let path = Config::config_path();

        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with(".config/mttast/config.toml"));
    }
}
