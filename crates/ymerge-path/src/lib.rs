//! Document paths for ymerge.
//!
//! A path addresses nodes inside a document tree. Paths are used for two
//! things: naming the nodes that per-path merge rules apply to, and locating
//! one concrete occurrence of an anchor during conflict resolution.
//!
//! # Syntax
//!
//! - `/`: the document root
//! - `/key`: the value under `key` in a mapping
//! - `[3]`: the element at index 3 of a sequence
//! - `/&name` or `[&name]`: the node carrying anchor `name`
//!
//! Inside a key, `\` escapes the next character; see [`escape_segment`].
//!
//! # Modules
//!
//! - [`error`]: Error types for path operations
//! - [`segment`]: [`DocPath`] / [`PathSegment`] parsing and rendering
//! - [`resolver`]: The [`PathResolver`] trait and [`SlashPathResolver`]

pub mod error;
pub mod resolver;
pub mod segment;

pub use error::{PathError, Result};
pub use resolver::{PathResolver, SlashPathResolver};
pub use segment::{escape_segment, DocPath, PathSegment};
