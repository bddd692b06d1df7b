//! Absolute scene paths.
//!
//! A path names one prim in a stage. Paths form a tree: the absolute root
//! `/` is the pseudo-root, and every other path is its parent's path plus
//! one `/`-separated name.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An absolute path to a prim, e.g. `/World/Geo/Cube`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScenePath(String);

impl ScenePath {
    /// The absolute root path `/`.
    pub fn absolute_root() -> Self {
        Self("/".to_string())
    }

    /// Parse an absolute path.
    pub fn parse(text: &str) -> Result<Self> {
        if !text.starts_with('/') {
            return Err(CoreError::invalid_path(text, "path must be absolute"));
        }
        if text == "/" {
            return Ok(Self::absolute_root());
        }
        if text.ends_with('/') {
            return Err(CoreError::invalid_path(text, "trailing separator"));
        }
        for component in text[1..].split('/') {
            if !is_valid_name(component) {
                return Err(CoreError::invalid_path(text, "invalid prim name"));
            }
        }
        Ok(Self(text.to_string()))
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the absolute root `/`.
    pub fn is_absolute_root(&self) -> bool {
        self.0 == "/"
    }

    /// The last path component (empty for the absolute root).
    pub fn name(&self) -> &str {
        if self.is_absolute_root() {
            return "";
        }
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// The parent path, or `None` for the absolute root.
    pub fn parent(&self) -> Option<ScenePath> {
        if self.is_absolute_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) | None => Some(Self::absolute_root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
        }
    }

    /// Append a child name to this path.
    pub fn append_child(&self, name: &str) -> Result<ScenePath> {
        if !is_valid_name(name) {
            return Err(CoreError::invalid_path(name, "invalid prim name"));
        }
        if self.is_absolute_root() {
            Ok(Self(format!("/{}", name)))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// Whether `prefix` is this path or one of its ancestors.
    pub fn has_prefix(&self, prefix: &ScenePath) -> bool {
        if prefix.is_absolute_root() {
            return true;
        }
        self.0 == prefix.0
            || (self.0.starts_with(&prefix.0) && self.0.as_bytes().get(prefix.0.len()) == Some(&b'/'))
    }

    /// Number of components below the root (0 for `/`).
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Iterate the path's names from the root downwards.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Iterate this path and its ancestors, nearest first, ending at `/`.
    pub fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }
}

/// Iterator returned by [`ScenePath::ancestors`].
pub struct Ancestors {
    next: Option<ScenePath>,
}

impl Iterator for Ancestors {
    type Item = ScenePath;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

/// Prim names are identifiers: a letter or underscore, then letters,
/// digits or underscores.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for ScenePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ScenePath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ScenePath {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ScenePath> for String {
    fn from(path: ScenePath) -> Self {
        path.0
    }
}

impl AsRef<str> for ScenePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
