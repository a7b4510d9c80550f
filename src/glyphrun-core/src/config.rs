//! Configuration management
//!
//! TOML file with an `[engine]` section and optional named profiles that
//! replace it wholesale.

use anyhow::{ensure, Context, Result};
use glyphrun_engine::chain::{DEFAULT_MAX_LINES, DEFAULT_MODEL_FILE, DEFAULT_MODEL_KEY};
use glyphrun_engine::{ChainConfig, DEFAULT_LIBRARY_NAME};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    /// Named profiles that can override the engine section
    #[serde(default)]
    pub profiles: HashMap<String, ProfileConfig>,
}

/// Where the engine lives and how the handle chain is set up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the engine library and its model
    /// (defaults to the directory of the running executable)
    pub library_dir: Option<PathBuf>,

    #[serde(default = "default_library_name")]
    pub library_name: String,

    #[serde(default = "default_model_file")]
    pub model_file: String,

    #[serde(default = "default_model_key")]
    pub model_key: String,

    /// Maximum number of lines the engine reports
    #[serde(default = "default_max_lines")]
    pub max_lines: i64,

    #[serde(default)]
    pub use_model_delay_load: bool,
}

/// Profile for overriding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub engine: Option<EngineConfig>,
}

fn default_library_name() -> String {
    DEFAULT_LIBRARY_NAME.to_string()
}

fn default_model_file() -> String {
    DEFAULT_MODEL_FILE.to_string()
}

fn default_model_key() -> String {
    DEFAULT_MODEL_KEY.to_string()
}

fn default_max_lines() -> i64 {
    DEFAULT_MAX_LINES
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            library_dir: None,
            library_name: default_library_name(),
            model_file: default_model_file(),
            model_key: default_model_key(),
            max_lines: default_max_lines(),
            use_model_delay_load: false,
        }
    }
}

impl EngineConfig {
    /// Configured directory, else the executable's own directory
    pub fn resolve_library_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.library_dir {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            model_file: self.model_file.clone(),
            model_key: self.model_key.clone(),
            max_lines: self.max_lines,
            use_model_delay_load: self.use_model_delay_load,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML {}", path.display()))
    }

    /// Default location: `<config dir>/glyphrun/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("glyphrun").join("config.toml"))
    }

    /// Load an explicit file, else the default file if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("using config file {:?}", path);
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Apply a named profile, merging settings
    ///
    /// Profile settings override base configuration values.
    pub fn apply_profile(mut self, profile_name: &str) -> Result<Self> {
        let profile = self
            .profiles
            .get(profile_name)
            .with_context(|| format!("Profile '{}' not found", profile_name))?
            .clone();

        if let Some(engine) = profile.engine {
            self.engine = engine;
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.engine.max_lines > 0,
            "max_lines must be positive, got {}",
            self.engine.max_lines
        );
        ensure!(!self.engine.library_name.is_empty(), "library_name must not be empty");
        ensure!(!self.engine.model_file.is_empty(), "model_file must not be empty");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.engine.chain_config(), ChainConfig::default());
    }

    #[test]
    fn test_engine_section_overrides_fields() {
        let file = write_config(
            r#"
[engine]
library_dir = "C:/tools/ocr"
max_lines = 50
use_model_delay_load = true
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.engine.library_dir, Some(PathBuf::from("C:/tools/ocr")));
        assert_eq!(config.engine.resolve_library_dir(), PathBuf::from("C:/tools/ocr"));
        assert_eq!(config.engine.library_name, "oneocr.dll");

        let chain = config.engine.chain_config();
        assert_eq!(chain.max_lines, 50);
        assert!(chain.use_model_delay_load);
        assert_eq!(chain.model_file, "oneocr.onemodel");
    }

    #[test]
    fn test_profile_replaces_engine_section() {
        let file = write_config(
            r#"
[engine]
max_lines = 10

[profiles.full]
engine = { max_lines = 5000 }
"#,
        );
        let config = Config::from_file(file.path()).unwrap();
        let config = config.apply_profile("full").unwrap();
        assert_eq!(config.engine.max_lines, 5000);
        assert!(config.clone().apply_profile("missing").is_err());
    }

    #[test]
    fn test_validation_rejects_non_positive_line_cap() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.engine.max_lines = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let file = write_config("[engine\nmax_lines = ");
        assert!(Config::from_file(file.path()).is_err());
    }
}
