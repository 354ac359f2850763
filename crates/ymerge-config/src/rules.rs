use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;

use ymerge_path::{PathResolver, SlashPathResolver};
use ymerge_types::{
    AnchorConflictMode, AoHMergeMode, ArrayMergeMode, HashMergeMode, NodeCoord, NodeRef,
};

use crate::config::{is_known_rule, ConfigFile, MergeDefaults};
use crate::error::{ConfigError, ConfigResult};
use crate::policy::MergePolicy;

// ---------------------------------------------------------------------------
// MergerConfig
// ---------------------------------------------------------------------------

/// The standard [`MergePolicy`]: defaults plus per-path rules and keys.
///
/// Rules and keys are written as paths. They are resolved against each
/// incoming document in [`MergePolicy::prepare`], and from then on matched by
/// node identity, so a rule applies to exactly the nodes its path selected in
/// that document.
pub struct MergerConfig {
    defaults: MergeDefaults,
    rules: BTreeMap<String, String>,
    keys: BTreeMap<String, String>,
    resolver: Box<dyn PathResolver>,
    compiled_rules: Vec<(NodeCoord, String)>,
    compiled_keys: Vec<(NodeCoord, String)>,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self::new(MergeDefaults::default())
    }
}

impl MergerConfig {
    /// A config with the given defaults and no per-path rules.
    pub fn new(defaults: MergeDefaults) -> Self {
        Self {
            defaults,
            rules: BTreeMap::new(),
            keys: BTreeMap::new(),
            resolver: Box::new(SlashPathResolver::new()),
            compiled_rules: Vec::new(),
            compiled_keys: Vec::new(),
        }
    }

    /// Build from a parsed config file.
    pub fn from_file(file: ConfigFile) -> ConfigResult<Self> {
        file.validate()?;
        let mut config = Self::new(file.defaults);
        config.rules = file.rules;
        config.keys = file.keys;
        Ok(config)
    }

    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Self::from_file(ConfigFile::from_toml_str(text)?)
    }

    /// Load a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        Self::from_file(ConfigFile::load(path)?)
    }

    /// Use a different path language for rules and keys.
    pub fn with_resolver(mut self, resolver: Box<dyn PathResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn defaults(&self) -> &MergeDefaults {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut MergeDefaults {
        &mut self.defaults
    }

    /// Register a per-path rule. The rule must name some merge mode.
    pub fn add_rule(&mut self, path: impl Into<String>, rule: impl Into<String>) -> ConfigResult<()> {
        let (path, rule) = (path.into(), rule.into());
        if !is_known_rule(&rule) {
            return Err(ConfigError::invalid_rule(path, rule));
        }
        self.rules.insert(path, rule);
        Ok(())
    }

    /// Register an identity key for the array-of-hashes at `path`.
    pub fn add_key(&mut self, path: impl Into<String>, key: impl Into<String>) {
        self.keys.insert(path.into(), key.into());
    }

    /// Number of (coordinate, rule) pairs compiled by the last `prepare`.
    pub fn compiled_rule_count(&self) -> usize {
        self.compiled_rules.len()
    }

    fn compile(
        &self,
        incoming: &NodeRef,
        section: &BTreeMap<String, String>,
    ) -> ConfigResult<Vec<(NodeCoord, String)>> {
        let mut compiled = Vec::new();
        for (path, value) in section {
            for coord in self.resolver.resolve(incoming, path, false)? {
                compiled.push((coord, value.clone()));
            }
        }
        Ok(compiled)
    }

    fn rule_for(&self, coord: &NodeCoord) -> Option<&str> {
        lookup(&self.compiled_rules, coord)
    }

    fn key_for(&self, coord: &NodeCoord) -> Option<&str> {
        lookup(&self.compiled_keys, coord)
    }

    /// Parse the matched rule as `T`, falling back to `default` when no rule
    /// matched or the rule names a mode of another kind.
    fn mode_for<T>(&self, coord: &NodeCoord, default: T) -> T
    where
        T: FromStr + Copy,
    {
        match self.rule_for(coord) {
            Some(rule) => match rule.parse::<T>() {
                Ok(mode) => {
                    tracing::debug!(rule, "matched merge rule");
                    mode
                }
                Err(_) => {
                    tracing::warn!(
                        rule,
                        mode = std::any::type_name::<T>(),
                        "merge rule does not apply to this kind of node; using default"
                    );
                    default
                }
            },
            None => default,
        }
    }
}

fn lookup<'a>(section: &'a [(NodeCoord, String)], coord: &NodeCoord) -> Option<&'a str> {
    section
        .iter()
        .find(|(candidate, _)| candidate.same_position(coord))
        .map(|(_, value)| value.as_str())
}

impl MergePolicy for MergerConfig {
    fn prepare(&mut self, incoming: &NodeRef) -> ConfigResult<()> {
        // Rules from a previous document point at nodes that no longer matter.
        self.compiled_rules = self.compile(incoming, &self.rules)?;
        self.compiled_keys = self.compile(incoming, &self.keys)?;
        tracing::debug!(
            rules = self.compiled_rules.len(),
            keys = self.compiled_keys.len(),
            "compiled merge rules"
        );
        Ok(())
    }

    fn hash_merge_mode(&self, coord: &NodeCoord) -> HashMergeMode {
        self.mode_for(coord, self.defaults.hashes)
    }

    fn array_merge_mode(&self, coord: &NodeCoord) -> ArrayMergeMode {
        self.mode_for(coord, self.defaults.arrays)
    }

    fn aoh_merge_mode(&self, coord: &NodeCoord) -> AoHMergeMode {
        self.mode_for(coord, self.defaults.aoh)
    }

    fn aoh_identity_key(&self, coord: &NodeCoord, record: &NodeRef) -> Option<String> {
        if let Some(key) = self.key_for(coord) {
            return Some(key.to_string());
        }

        // A key registered for the enclosing sequence covers its records.
        if let Some(parent) = &coord.parent {
            let inherited = self
                .compiled_keys
                .iter()
                .find(|(candidate, _)| Rc::ptr_eq(&candidate.node, parent));
            if let Some((_, key)) = inherited {
                return Some(key.clone());
            }
        }

        // Fall back to the record's first key.
        let record = record.borrow();
        let first = record
            .value
            .as_mapping()
            .and_then(|m| m.keys().next().map(|k| k.borrow().key_label()));
        first
    }

    fn anchor_conflict_mode(&self) -> AnchorConflictMode {
        self.defaults.anchors
    }
}
