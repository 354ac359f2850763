//! Foundation types for ymerge.
//!
//! This crate provides the document model and the policy vocabulary shared by
//! every other ymerge crate.
//!
//! # Key Types
//!
//! - [`Node`] / [`NodeRef`]: A document node; `NodeRef` is the shared handle
//!   that lets several positions alias one anchored node
//! - [`Value`] / [`Scalar`] / [`Mapping`]: The closed set of node shapes
//! - [`NodeCoord`] / [`ParentRef`]: Where a node sits inside its parent
//! - [`HashMergeMode`], [`ArrayMergeMode`], [`AoHMergeMode`],
//!   [`AnchorConflictMode`]: Merge policy enums

pub mod coord;
pub mod error;
pub mod json;
pub mod mapping;
pub mod modes;
pub mod node;

pub use coord::{NodeCoord, ParentRef};
pub use error::TypeError;
pub use json::{deep_copy, from_json, from_json_str, to_json};
pub use mapping::Mapping;
pub use modes::{AnchorConflictMode, AoHMergeMode, ArrayMergeMode, HashMergeMode};
pub use node::{nodes_equal, Node, NodeKind, NodeRef, Scalar, Value};
