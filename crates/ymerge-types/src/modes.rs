//! Merge policy enums.
//!
//! Each enum parses case-insensitively from its lower-case name (plus a few
//! aliases) and renders back to the canonical lower-case name, so the same
//! spelling works on the command line, in config files, and in logs.
//! Deserialization goes through [`FromStr`], so config files accept exactly
//! what the command line accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How a mapping in the incoming document combines with the target mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum HashMergeMode {
    /// Keep the target mapping untouched.
    Left,
    /// Replace the target mapping with the incoming one.
    Right,
    /// Merge key by key, recursing into nested structures.
    #[default]
    Deep,
}

/// How a sequence of scalars (or of sequences) combines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ArrayMergeMode {
    Left,
    Right,
    /// Append only incoming elements not already present.
    Unique,
    /// Append every incoming element.
    #[default]
    All,
}

/// How a sequence of mappings ("array of hashes") combines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AoHMergeMode {
    Left,
    Right,
    /// Append only records not wholly equal to an existing record.
    Unique,
    /// Match records by identity key and merge matched pairs.
    Deep,
    /// Append every incoming record.
    #[default]
    All,
}

/// What to do when both documents define an anchor name with different values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AnchorConflictMode {
    /// Give the incoming anchor a fresh, unique name.
    Rename,
    /// The target's value wins everywhere.
    Left,
    /// The incoming value wins everywhere.
    Right,
    /// Fail the merge.
    #[default]
    Stop,
}

fn unknown(kind: &'static str, value: &str) -> TypeError {
    TypeError::UnknownMode {
        kind,
        value: value.to_string(),
    }
}

impl FromStr for HashMergeMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "deep" => Ok(Self::Deep),
            _ => Err(unknown("hash", s)),
        }
    }
}

impl FromStr for ArrayMergeMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "unique" => Ok(Self::Unique),
            "all" => Ok(Self::All),
            _ => Err(unknown("array", s)),
        }
    }
}

impl FromStr for AoHMergeMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "unique" => Ok(Self::Unique),
            "deep" => Ok(Self::Deep),
            "all" => Ok(Self::All),
            _ => Err(unknown("array-of-hashes", s)),
        }
    }
}

impl FromStr for AnchorConflictMode {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "left" | "keep_left" => Ok(Self::Left),
            "right" | "keep_right" => Ok(Self::Right),
            "stop" | "abort" => Ok(Self::Stop),
            _ => Err(unknown("anchor conflict", s)),
        }
    }
}

macro_rules! try_from_string {
    ($($mode:ty),+) => {$(
        impl TryFrom<String> for $mode {
            type Error = TypeError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )+};
}

try_from_string!(HashMergeMode, ArrayMergeMode, AoHMergeMode, AnchorConflictMode);

impl fmt::Display for HashMergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

impl fmt::Display for ArrayMergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Unique => write!(f, "unique"),
            Self::All => write!(f, "all"),
        }
    }
}

impl fmt::Display for AoHMergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Unique => write!(f, "unique"),
            Self::Deep => write!(f, "deep"),
            Self::All => write!(f, "all"),
        }
    }
}

impl fmt::Display for AnchorConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => write!(f, "rename"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Stop => write!(f, "stop"),
        }
    }
}
