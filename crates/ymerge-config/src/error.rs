use std::fmt;
use std::path::PathBuf;

use ymerge_path::PathError;

/// Errors that can occur while loading or compiling merge configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape.
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// A rule value is not the name of any merge mode.
    #[error("invalid merge rule for {path:?}: {rule:?}")]
    InvalidRule { path: String, rule: String },

    /// A rule or key path could not be parsed or resolved.
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

impl ConfigError {
    /// Create an invalid-rule error.
    pub fn invalid_rule(path: impl Into<String>, rule: impl Into<String>) -> Self {
        Self::InvalidRule {
            path: path.into(),
            rule: rule.into(),
        }
    }
}

impl PartialEq for ConfigError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
