//! User settings for the `piers` command.
//!
//! Settings live in `~/.config/piers/config.toml`:
//!
//! ```toml
//! documents_path = "~/piers/documents"
//! default_max_length = 20000
//! first_heading_as_title = true
//! ```
//!
//! Only `documents_path` is required. A missing file is not an error; the
//! CLI then needs `--documents` or `--mock`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid {key} in config file at {config_path}: {reason}")]
    ConfigValueError {
        config_path: PathBuf,
        key: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory of `<document id>.json` files. Applied batches are logged
    /// beside each document as `<document id>.batches.jsonl`.
    pub documents_path: PathBuf,
    /// Characters shown by `piers read` when no `--max-length` is given.
    /// Zero means no limit and is stored as `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_length: Option<usize>,
    /// Style a leading `# heading` as the document title rather than as
    /// heading 1 when translating markdown.
    #[serde(default)]
    pub first_heading_as_title: bool,
}

impl Config {
    pub fn new(documents_path: impl Into<PathBuf>) -> Self {
        Self {
            documents_path: documents_path.into(),
            default_max_length: None,
            first_heading_as_title: false,
        }
    }

    /// Reads the file at `config_path`, or `Ok(None)` when there is none.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;
        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.normalized(config_path).map(Some)
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/piers/config.toml").as_ref())
    }

    /// Expands `~` and `$VAR` in the documents path and folds a zero length
    /// limit into "no limit".
    fn normalized(mut self, config_path: &Path) -> Result<Self, ConfigError> {
        if self.documents_path.as_os_str().is_empty() {
            return Err(ConfigError::ConfigValueError {
                config_path: config_path.to_path_buf(),
                key: "documents_path",
                reason: "must not be empty",
            });
        }
        if let Some(expanded) = expand_path(&self.documents_path) {
            self.documents_path = expanded;
        }
        self.default_max_length = self.default_max_length.filter(|limit| *limit > 0);
        Ok(self)
    }
}

/// `None` when a referenced variable is unset; the path is then kept as written.
fn expand_path(path: &Path) -> Option<PathBuf> {
    shellexpand::full(&path.to_string_lossy())
        .ok()
        .map(|expanded| PathBuf::from(expanded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, content: &str) -> PathBuf {
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, content).unwrap();
        config_file
    }

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/piers/config.toml"));
    }

    #[test]
    fn test_only_documents_path_is_required() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(&temp_dir, r#"documents_path = "/tmp/docs""#);

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config, Config::new("/tmp/docs"));
    }

    #[test]
    fn test_zero_max_length_means_no_limit() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(
            &temp_dir,
            "documents_path = \"/tmp/docs\"\ndefault_max_length = 0\n",
        );

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.default_max_length, None);
    }

    #[test]
    fn test_empty_documents_path_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(&temp_dir, r#"documents_path = """#);

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::ConfigValueError {
                key: "documents_path",
                ..
            }
        ));
    }

    #[test]
    fn test_tilde_in_documents_path_is_expanded() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(&temp_dir, r#"documents_path = "~/docs""#);

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let path = config.documents_path.to_string_lossy();

        assert!(!path.starts_with('~'));
        assert!(path.ends_with("docs"));
    }

    #[test]
    fn test_unset_variable_keeps_the_path_as_written() {
        assert_eq!(
            expand_path(Path::new("$PIERS_SURELY_UNSET_VARIABLE/docs")),
            None
        );
        assert_eq!(
            expand_path(Path::new("relative/path")),
            Some(PathBuf::from("relative/path"))
        );
    }

    #[test]
    fn test_missing_config_file_is_none() {
        let temp_dir = TempDir::new().unwrap();

        let result = Config::load_from_path(temp_dir.path().join("nonexistent.toml")).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_unparseable_config_names_the_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(&temp_dir, "documents_path = [");

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            documents_path: PathBuf::from("/tmp/test-docs"),
            default_max_length: Some(2_000),
            first_heading_as_title: true,
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_env_var_in_loaded_config() {
        unsafe {
            env::set_var("PIERS_DOCS_ROOT", "/custom/docs");
        }

        let temp_dir = TempDir::new().unwrap();
        let config_file = write_config(&temp_dir, r#"documents_path = "$PIERS_DOCS_ROOT/work""#);

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        assert_eq!(config.documents_path, PathBuf::from("/custom/docs/work"));

        unsafe {
            env::remove_var("PIERS_DOCS_ROOT");
        }
    }
}
