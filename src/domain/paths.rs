//! Static output locations.
//!
//! A [`StaticPath`] is opaque to the notifier and the dispatcher: it is
//! produced by a renderable model and only interpreted by the renderer that
//! eventually writes it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one static output location that needs regeneration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticPath(String);

impl StaticPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The location part: surrounding whitespace, query and fragment removed.
    ///
    /// Every consumer that turns a path into a file or a URL starts here, so
    /// the two always agree on what a path names.
    pub fn location(&self) -> &str {
        let trimmed = self.0.trim();
        let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
        &trimmed[..end]
    }

    /// Query string without its leading `?`.
    pub fn query(&self) -> Option<&str> {
        let trimmed = self.0.trim();
        let before_fragment = trimmed
            .split_once('#')
            .map_or(trimmed, |(head, _)| head);
        before_fragment.split_once('?').map(|(_, query)| query)
    }
}

impl fmt::Display for StaticPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StaticPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StaticPath {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for StaticPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build a path list from anything string-like.
pub fn static_paths<I, S>(paths: I) -> Vec<StaticPath>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    paths.into_iter().map(StaticPath::new).collect()
}
