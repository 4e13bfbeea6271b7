//! `nova-minimize.toml`.
//!
//! ```toml
//! root = "src/main/java"
//! output = "minimized"
//! targets = ["com.example.Foo#bar(int)"]
//! max_stub_rounds = 3
//!
//! [checker]
//! enabled = true
//! program = "javac"
//! timeout_ms = 120000
//! ```
//!
//! Relative paths are taken relative to the directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "nova-minimize.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MinimizeConfig {
    /// Directory scanned recursively for `.java` files.
    pub root: PathBuf,
    /// Where pruned and synthesized files are written.
    pub output: PathBuf,
    pub targets: Vec<String>,
    pub checker: CheckerConfig,
    /// Upper bound on finder/synthesizer rounds.
    pub max_stub_rounds: usize,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output: PathBuf::from("minimized"),
            targets: Vec::new(),
            checker: CheckerConfig::default(),
            max_stub_rounds: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    pub enabled: bool,
    pub program: PathBuf,
    pub timeout_ms: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("javac"),
            timeout_ms: 120_000,
        }
    }
}

impl MinimizeConfig {
    pub fn new(
        root: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        targets: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            targets: targets.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a config file, resolving relative paths against its directory.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            config.root = base.join(&config.root);
            config.output = base.join(&config.output);
        }
        Ok(config)
    }

    /// `nova-minimize.toml` in `root`, if there is one.
    pub fn discover(root: &Path) -> Option<PathBuf> {
        let candidate = root.join(CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let config = MinimizeConfig::from_toml_str(
            r#"
targets = ["a.B#c()"]

[checker]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(config.targets, vec!["a.B#c()"]);
        assert!(!config.checker.enabled);
        assert_eq!(config.checker.program, PathBuf::from("javac"));
        assert_eq!(config.checker.timeout_ms, 120_000);
        assert_eq!(config.max_stub_rounds, 3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MinimizeConfig::from_toml_str("rooot = \"src\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(msg) if msg.contains("rooot")));
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "root = \"src\"\noutput = \"out\"\n").unwrap();

        assert_eq!(MinimizeConfig::discover(dir.path()), Some(path.clone()));
        let config = MinimizeConfig::load_from_path(&path).unwrap();
        assert_eq!(config.root, dir.path().join("src"));
        assert_eq!(config.output, dir.path().join("out"));
    }
}
