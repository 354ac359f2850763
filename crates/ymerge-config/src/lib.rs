//! Merge policy configuration for ymerge.
//!
//! The merge engine asks a [`MergePolicy`] which mode applies at every node
//! it visits. [`MergerConfig`] is the standard implementation: global
//! defaults, plus per-path rules and array-of-hashes identity keys that are
//! compiled against each incoming document before it is merged.
//!
//! # Config file
//!
//! ```toml
//! [defaults]
//! anchors = "rename"
//! arrays = "unique"
//!
//! [rules]
//! "/just/an/array" = "right"
//! "/some/records" = "deep"
//!
//! [keys]
//! "/some/records" = "name"
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use ymerge_config::{MergePolicy, MergerConfig};
//! use ymerge_types::{AnchorConflictMode, ArrayMergeMode};
//!
//! let config = MergerConfig::from_toml_str("[defaults]\narrays = \"unique\"").unwrap();
//! assert_eq!(config.defaults().arrays, ArrayMergeMode::Unique);
//! assert_eq!(config.anchor_conflict_mode(), AnchorConflictMode::Stop);
//! ```

pub mod config;
pub mod error;
pub mod policy;
pub mod rules;

pub use config::{ConfigFile, MergeDefaults};
pub use error::{ConfigError, ConfigResult};
pub use policy::MergePolicy;
pub use rules::MergerConfig;
