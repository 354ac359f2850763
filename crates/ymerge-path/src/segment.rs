//! Path segments: parsing, escaping, and rendering.
//!
//! Rules:
//! - `/` alone (or the empty string) is the root
//! - `/` starts a key segment that runs to the next unescaped `/` or `[`
//! - `/&` starts an anchor segment
//! - `[n]` is a sequence index, `[&name]` an anchored sequence element
//! - `\` makes the next character literal inside a key or anchor name
//! - A key segment written as `""` is the empty key; `\"\"` is a literal `""`
//! - Otherwise key and anchor segments must be non-empty
//! - Whitespace before the first segment is ignored; anywhere else it is
//!   part of the key

use std::fmt;
use std::str::FromStr;

use crate::error::{PathError, Result};

/// One step of a path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    /// Value under the scalar key rendering as this string.
    Key(String),
    /// Sequence element at this index.
    Index(usize),
    /// Node carrying this anchor name.
    Anchor(String),
}

/// A parsed path: the root followed by zero or more segments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocPath {
    segments: Vec<PathSegment>,
}

impl DocPath {
    /// The root path, `/`.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// A new path extending this one by `segment`.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }
}

/// Written form of the empty key.
const EMPTY_KEY: &str = "\"\"";

/// Escape a raw key so it survives as a single key segment.
///
/// Escapes `\`, `/`, `[`, `]`, a leading `&`, and trailing whitespace. The
/// empty key becomes `""`, and a key that is literally `""` has its quotes
/// escaped.
///
/// # Examples
///
/// ```
/// use ymerge_path::escape_segment;
///
/// assert_eq!(escape_segment("plain"), "plain");
/// assert_eq!(escape_segment("a/b"), "a\\/b");
/// assert_eq!(escape_segment("&x"), "\\&x");
/// assert_eq!(escape_segment(""), "\"\"");
/// assert_eq!(escape_segment("x "), "x\\ ");
/// ```
pub fn escape_segment(raw: &str) -> String {
    if raw.is_empty() {
        return EMPTY_KEY.to_string();
    }
    if raw == EMPTY_KEY {
        return "\\\"\\\"".to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, ch) in raw.char_indices() {
        let last = i + ch.len_utf8() == raw.len();
        if matches!(ch, '\\' | '/' | '[' | ']')
            || (i == 0 && ch == '&')
            || (last && ch.is_whitespace())
        {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(path: &str) -> Result<Self> {
        if matches!(path.trim(), "" | "/") {
            return Ok(Self::root());
        }
        let text = path.trim_start();

        let mut segments = Vec::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '/' => {
                    let anchored = chars.peek() == Some(&'&');
                    if anchored {
                        chars.next();
                    }

                    let mut name = String::new();
                    let mut escaped = false;
                    while let Some(&next) = chars.peek() {
                        match next {
                            '/' | '[' => break,
                            '\\' => {
                                escaped = true;
                                chars.next();
                                match chars.next() {
                                    Some(literal) => name.push(literal),
                                    None => return Err(PathError::parse(path, "dangling escape")),
                                }
                            }
                            _ => {
                                name.push(next);
                                chars.next();
                            }
                        }
                    }

                    if name.is_empty() {
                        return Err(PathError::parse(path, "empty segment"));
                    }
                    segments.push(if anchored {
                        PathSegment::Anchor(name)
                    } else if name == EMPTY_KEY && !escaped {
                        PathSegment::Key(String::new())
                    } else {
                        PathSegment::Key(name)
                    });
                }
                '[' => {
                    let mut inner = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(ch) => inner.push(ch),
                            None => return Err(PathError::parse(path, "unterminated '['")),
                        }
                    }

                    let segment = match inner.strip_prefix('&') {
                        Some("") => return Err(PathError::parse(path, "empty anchor name")),
                        Some(name) => PathSegment::Anchor(name.to_string()),
                        None => PathSegment::Index(inner.trim().parse().map_err(|_| {
                            PathError::parse(path, format!("not an index: {inner:?}"))
                        })?),
                    };
                    segments.push(segment);
                }
                other => {
                    return Err(PathError::parse(
                        path,
                        format!("expected '/' or '[' but found {other:?}"),
                    ));
                }
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) => write!(f, "/{}", escape_segment(key))?,
                PathSegment::Index(i) => write!(f, "[{i}]")?,
                PathSegment::Anchor(name) => write!(f, "/&{}", escape_segment(name))?,
            }
        }
        Ok(())
    }
}
