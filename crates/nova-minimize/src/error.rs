use std::path::PathBuf;

use nova_syntax::EditError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MinimizeError {
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },
    /// Targets that matched no declaration after a full traversal.
    #[error("target methods not found: {}", .0.join(", "))]
    UnfoundTargets(Vec<String>),
    #[error(transparent)]
    DiagnosticFormat(#[from] DiagnosticFormatError),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to rewrite source: {0}")]
    Edit(#[from] EditError),
}

impl MinimizeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MinimizeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// An `incompatible types` line that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected incompatible-types diagnostic: {line}")]
pub struct DiagnosticFormatError {
    pub line: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` carries a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_string())
    }
}
