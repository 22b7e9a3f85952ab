use crate::error::{GitError, GitResult};
use crate::model::{FileKind, FileNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const SCHEME: &str = "stash-content";

/// Which snapshot of a file to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSide {
    /// Content just before the stash was taken (`stash@{i}^1`)
    Parent,
    /// Content captured in the stash (`stash@{i}`)
    Stash,
    /// Content from the untracked-files parent (`stash@{i}^3`)
    Untracked,
}

/// Address of one side of a stashed file
///
/// Hosts hand the string form to their viewer and give it back to
/// `NodeRepository::resolve_uri` to obtain bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentUri {
    pub cwd: PathBuf,
    pub index: usize,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    pub kind: FileKind,
    pub side: ContentSide,
}

impl ContentUri {
    pub fn for_file(file: &FileNode, side: ContentSide) -> Self {
        let stash = file.stash();
        Self {
            cwd: stash.repo_path.clone(),
            index: stash.index,
            path: file.name().to_string(),
            old_path: file.old_name().map(str::to_string),
            kind: file.kind(),
            side,
        }
    }

    /// Git object name, e.g. `stash@{0}^1:src/old.rs`
    ///
    /// The parent side reads the pre-rename path.
    pub fn object_name(&self) -> String {
        match self.side {
            ContentSide::Parent => format!(
                "stash@{{{}}}^1:{}",
                self.index,
                self.old_path.as_deref().unwrap_or(&self.path)
            ),
            ContentSide::Stash => format!("stash@{{{}}}:{}", self.index, self.path),
            ContentSide::Untracked => format!("stash@{{{}}}^3:{}", self.index, self.path),
        }
    }

    pub fn parse(uri: &str) -> GitResult<Self> {
        let payload = uri
            .strip_prefix(SCHEME)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| GitError::Parse(format!("not a {} URI: {}", SCHEME, uri)))?;

        serde_json::from_str(payload)
            .map_err(|e| GitError::Parse(format!("invalid {} URI: {}", SCHEME, e)))
    }
}

impl fmt::Display for ContentUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}:{}", SCHEME, payload)
    }
}
