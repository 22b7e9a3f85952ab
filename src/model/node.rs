use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Closed set of changes a stash can record for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Untracked,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FileKind::Added => "added",
            FileKind::Modified => "modified",
            FileKind::Deleted => "deleted",
            FileKind::Renamed => "renamed",
            FileKind::Untracked => "untracked",
        };
        write!(f, "{}", label)
    }
}

/// A repository root holding stashes
#[derive(Debug, Clone, PartialEq)]
pub struct RepositoryNode {
    path: PathBuf,
    name: String,
    children: Option<Vec<StashNode>>,
}

impl RepositoryNode {
    pub fn new(path: PathBuf, name: String) -> Self {
        Self {
            path,
            name,
            children: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loaded stashes; `None` until populated
    pub fn children(&self) -> Option<&[StashNode]> {
        self.children.as_deref()
    }

    pub fn set_children(&mut self, stashes: Vec<StashNode>) {
        self.children = Some(stashes);
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }
}

/// Upward key from a file to the stash that recorded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashRef {
    pub repo_path: PathBuf,
    pub index: usize,
    pub hash: String,
    pub date: DateTime<FixedOffset>,
}

impl StashRef {
    /// Revision name, valid only against the listing the index came from
    pub fn rev(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }
}

/// One stash entry of a repository
#[derive(Debug, Clone, PartialEq)]
pub struct StashNode {
    pub index: usize,
    pub hash: String,
    pub short_hash: String,
    pub date: DateTime<FixedOffset>,
    pub subject: String,
    pub description: String,
    pub branch: Option<String>,
    pub note: Option<String>,
    pub parent_hashes: Vec<String>,
    repo_path: PathBuf,
    children: Option<Vec<FileNode>>,
}

impl StashNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo_path: PathBuf,
        index: usize,
        hash: String,
        short_hash: String,
        date: DateTime<FixedOffset>,
        subject: String,
        description: String,
        branch: Option<String>,
    ) -> Self {
        Self {
            index,
            hash,
            short_hash,
            date,
            subject,
            description,
            branch,
            note: None,
            parent_hashes: Vec::new(),
            repo_path,
            children: None,
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn rev(&self) -> String {
        format!("stash@{{{}}}", self.index)
    }

    /// Whether the stash carries the third parent holding untracked files
    pub fn has_untracked_parent(&self) -> bool {
        self.parent_hashes.len() >= 3
    }

    pub fn stash_ref(&self) -> StashRef {
        StashRef {
            repo_path: self.repo_path.clone(),
            index: self.index,
            hash: self.hash.clone(),
            date: self.date,
        }
    }

    pub fn children(&self) -> Option<&[FileNode]> {
        self.children.as_deref()
    }

    pub fn set_children(&mut self, files: Vec<FileNode>) {
        self.children = Some(files);
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }
}

/// One changed path inside a stash
///
/// `old_name` is present exactly when the kind is `Renamed`; the constructors are
/// the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    name: String,
    old_name: Option<String>,
    kind: FileKind,
    stash: StashRef,
}

impl FileNode {
    /// Build a non-renamed entry; a `Renamed` kind without an old name is downgraded to `Modified`
    pub fn new(name: String, kind: FileKind, stash: StashRef) -> Self {
        let kind = match kind {
            FileKind::Renamed => FileKind::Modified,
            other => other,
        };
        Self {
            name,
            old_name: None,
            kind,
            stash,
        }
    }

    pub fn renamed(old_name: String, name: String, stash: StashRef) -> Self {
        Self {
            name,
            old_name: Some(old_name),
            kind: FileKind::Renamed,
            stash,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn stash(&self) -> &StashRef {
        &self.stash
    }

    pub fn date(&self) -> DateTime<FixedOffset> {
        self.stash.date
    }

    pub fn full_path(&self) -> PathBuf {
        self.stash.repo_path.join(&self.name)
    }

    /// Path in the working copy this entry should be compared with
    pub fn working_copy_path(&self) -> PathBuf {
        self.stash
            .repo_path
            .join(self.old_name.as_deref().unwrap_or(&self.name))
    }
}

/// Placeholder row for empty states
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    pub text: String,
}

impl MessageNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Any row of the stash tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Repository(RepositoryNode),
    Stash(StashNode),
    File(FileNode),
    Message(MessageNode),
}

/// Natural key of a node; stable across refreshes where the object is not
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Repository(PathBuf),
    Stash { repo: PathBuf, hash: String },
    File { repo: PathBuf, hash: String, name: String },
    Message(String),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Node::Repository(repo) => NodeKey::Repository(repo.path.clone()),
            Node::Stash(stash) => NodeKey::Stash {
                repo: stash.repo_path.clone(),
                hash: stash.hash.clone(),
            },
            Node::File(file) => NodeKey::File {
                repo: file.stash.repo_path.clone(),
                hash: file.stash.hash.clone(),
                name: file.name.clone(),
            },
            Node::Message(message) => NodeKey::Message(message.text.clone()),
        }
    }

    /// Whether the node can ever have children
    pub fn is_expandable(&self) -> bool {
        matches!(self, Node::Repository(_) | Node::Stash(_))
    }

    /// Single-line label used by plain-text hosts
    pub fn label(&self) -> String {
        match self {
            Node::Repository(repo) => repo.name.clone(),
            Node::Stash(stash) => match &stash.branch {
                Some(branch) => format!("#{}: {} ({})", stash.index, stash.description, branch),
                None => format!("#{}: {}", stash.index, stash.description),
            },
            Node::File(file) => match &file.old_name {
                Some(old) => format!("{} ← {}", file.name, old),
                None => file.name.clone(),
            },
            Node::Message(message) => message.text.clone(),
        }
    }
}
