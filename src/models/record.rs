// file: src/models/record.rs
// description: extracted path entries and their verification records
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// One candidate filesystem location read from the spreadsheet. Not
/// validated; UNC, absolute and relative forms are all kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathEntry(String);

impl PathEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only entries are never verified.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<&str> for PathEntry {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for PathEntry {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for PathEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of checking one entry. `exists == false` covers both absent and
/// inaccessible paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub path: PathEntry,
    pub exists: bool,
}

impl VerificationRecord {
    pub fn new(path: PathEntry, exists: bool) -> Self {
        Self { path, exists }
    }

    pub fn is_missing(&self) -> bool {
        !self.exists
    }
}
