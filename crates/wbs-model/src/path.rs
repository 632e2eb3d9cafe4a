//! Hierarchy paths
//!
//! Provides [`HierarchyPath`], the slash-delimited address of a node in the
//! live project hierarchy (`/Project/Alpha/Design`).

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Path of a node in the live hierarchy
///
/// Segments are node names, which may contain any character except `/`.
/// The empty path is the hierarchy root.
///
/// # Examples
/// - `["Project", "Alpha"]` → `/Project/Alpha`
/// - `[]` → `` (root)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HierarchyPath(Vec<String>);

impl HierarchyPath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// The hierarchy root
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the hierarchy root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Name of the node this path points at
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(name.into());
        new
    }

    /// Replace the last segment, returning the sibling path
    #[must_use]
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        match self.parent() {
            Some(parent) => parent.child(name),
            None => Self::root(),
        }
    }

    /// Check if this path is a prefix of another (or equal to it)
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        if self.0.len() > other.0.len() {
            return false;
        }
        self.0 == other.0[..self.0.len()]
    }

    /// Check if this path is a strict ancestor of another
    #[inline]
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        self.0.len() < other.0.len() && self.is_prefix_of(other)
    }

    /// Get relative path from ancestor
    ///
    /// # Errors
    /// Returns error if `self` is not a descendant of `ancestor`
    pub fn relative_to(&self, ancestor: &Self) -> Result<Self, PathError> {
        if !ancestor.is_prefix_of(self) {
            return Err(PathError::NotDescendant {
                path: self.to_string(),
                ancestor: ancestor.to_string(),
            });
        }
        Ok(Self(self.0[ancestor.0.len()..].to_vec()))
    }

    /// Swap the `from` prefix of this path for `to`
    ///
    /// Returns `None` when `from` is not a prefix of this path.
    #[must_use]
    pub fn rebase(&self, from: &Self, to: &Self) -> Option<Self> {
        if !from.is_prefix_of(self) {
            return None;
        }
        let mut segments = to.0.clone();
        segments.extend_from_slice(&self.0[from.0.len()..]);
        Some(Self(segments))
    }

    /// Iterator over segments from root to leaf
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// This path followed by each of its ancestors, ending at the root
    pub fn self_and_ancestors(&self) -> impl Iterator<Item = HierarchyPath> + '_ {
        (0..=self.0.len()).rev().map(move |n| Self(self.0[..n].to_vec()))
    }
}

impl Display for HierarchyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for HierarchyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix('/').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = trimmed
            .split('/')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl From<Vec<String>> for HierarchyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl Serialize for HierarchyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HierarchyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to hierarchy paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Not a descendant path
    #[error("path '{path}' is not a descendant of '{ancestor}'")]
    NotDescendant { path: String, ancestor: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    #[test]
    fn path_display_is_slash_delimited() {
        assert_eq!(p("/Project/Alpha").to_string(), "/Project/Alpha");
        assert_eq!(HierarchyPath::root().to_string(), "");
    }

    #[test]
    fn path_parses_without_leading_slash() {
        assert_eq!(p("Project/Alpha"), p("/Project/Alpha"));
    }

    #[test]
    fn path_rejects_empty_segment() {
        let result: Result<HierarchyPath, _> = "/a//b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn path_names_may_hold_punctuation() {
        let path = p("/Project/Design (duplicate 2)/Code Review");
        assert_eq!(path.name(), Some("Code Review"));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn path_parent_and_child() {
        let path = p("/a/b");
        assert_eq!(path.parent(), Some(p("/a")));
        assert_eq!(path.child("c"), p("/a/b/c"));
        assert!(HierarchyPath::root().parent().is_none());
    }

    #[test]
    fn path_sibling() {
        assert_eq!(p("/a/b").sibling("c"), p("/a/c"));
    }

    #[test]
    fn path_prefix_is_segment_wise() {
        assert!(p("/a/b").is_prefix_of(&p("/a/b/c")));
        assert!(p("/a/b").is_prefix_of(&p("/a/b")));
        assert!(!p("/a/b").is_prefix_of(&p("/a/bc")));
        assert!(!p("/a/b").is_ancestor_of(&p("/a/b")));
    }

    #[test]
    fn path_relative_to() {
        let rel = p("/a/b/c").relative_to(&p("/a")).unwrap();
        assert_eq!(rel, p("/b/c"));
        assert!(p("/a").relative_to(&p("/x")).is_err());
    }

    #[test]
    fn path_rebase() {
        let moved = p("/a/old/x").rebase(&p("/a/old"), &p("/b/new"));
        assert_eq!(moved, Some(p("/b/new/x")));
        assert_eq!(p("/a/other").rebase(&p("/a/old"), &p("/b")), None);
    }

    #[test]
    fn path_ancestors_end_at_root() {
        let all: Vec<_> = p("/a/b").self_and_ancestors().collect();
        assert_eq!(all, vec![p("/a/b"), p("/a"), HierarchyPath::root()]);
    }

    #[test]
    fn path_orders_parents_before_children() {
        let mut paths = vec![p("/a/b/c"), p("/a"), p("/a/b")];
        paths.sort();
        assert_eq!(paths, vec![p("/a"), p("/a/b"), p("/a/b/c")]);
    }

    #[test]
    fn path_serde_as_string() {
        let json = serde_json::to_string(&p("/a/b")).unwrap();
        assert_eq!(json, "\"/a/b\"");
        let back: HierarchyPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("/a/b"));
    }
}
