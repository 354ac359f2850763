use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ymerge_types::{AnchorConflictMode, AoHMergeMode, ArrayMergeMode, HashMergeMode};

use crate::error::{ConfigError, ConfigResult};

/// Modes applied wherever no per-path rule matches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeDefaults {
    /// Anchor name collisions.
    pub anchors: AnchorConflictMode,
    /// Sequences of scalars or sequences.
    pub arrays: ArrayMergeMode,
    /// Mappings below the document root.
    pub hashes: HashMergeMode,
    /// Sequences of mappings.
    pub aoh: AoHMergeMode,
}

/// On-disk shape of a merge configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub defaults: MergeDefaults,
    /// Path to mode name. The mode kind is decided by what the engine finds
    /// at that path, so one rule string may serve a mapping or a sequence.
    pub rules: BTreeMap<String, String>,
    /// Path to the identity key used for array-of-hashes deep merges.
    pub keys: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Parse and validate a TOML config.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let file: Self = toml::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    /// Read, parse, and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Every rule must name a mode of at least one kind.
    pub fn validate(&self) -> ConfigResult<()> {
        for (path, rule) in &self.rules {
            if !is_known_rule(rule) {
                return Err(ConfigError::invalid_rule(path, rule));
            }
        }
        Ok(())
    }
}

/// Returns `true` if `rule` parses as a hash, array, or array-of-hashes mode.
pub fn is_known_rule(rule: &str) -> bool {
    rule.parse::<HashMergeMode>().is_ok()
        || rule.parse::<ArrayMergeMode>().is_ok()
        || rule.parse::<AoHMergeMode>().is_ok()
}
