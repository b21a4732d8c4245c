//! Search scope.

use serde::{Deserialize, Serialize};

/// How deep under the search root a directory search descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The search root entry only.
    Base,
    /// Immediate children of the search root.
    OneLevel,
    /// The entire subtree under the search root.
    Subtree,
}

impl Default for SearchScope {
    /// Sources declared without an explicit scope search the root entry only.
    fn default() -> Self {
        SearchScope::Base
    }
}
