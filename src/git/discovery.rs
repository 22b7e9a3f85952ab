use crate::error::{GitError, GitResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const GIT_DIR: &str = ".git";

/// Finds the git roots the stash tree should show
#[async_trait]
pub trait RepositoryDiscovery: Send + Sync {
    /// `search_depth`: 0 = workspace roots only, `-N` = up to N ancestor levels,
    /// `+N` = up to N levels of subdirectories
    async fn discover_roots(&self, search_depth: i32) -> GitResult<Vec<PathBuf>>;

    /// Display name for a discovered root
    async fn display_name(&self, root: &Path) -> String {
        base_name(root)
    }
}

/// A folder opened by the host, with the name it shows for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFolder {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceFolder {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: base_name(&path),
            path,
        }
    }

    pub fn named<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Self {
        Self {
            name: name.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Filesystem discovery over a set of workspace folders
#[derive(Debug, Clone, Default)]
pub struct WorkspaceDiscovery {
    folders: Vec<WorkspaceFolder>,
}

impl WorkspaceDiscovery {
    pub fn new(folders: Vec<WorkspaceFolder>) -> Self {
        Self { folders }
    }

    pub fn folders(&self) -> &[WorkspaceFolder] {
        &self.folders
    }

    async fn ancestors(&self, folder: &Path, levels: usize) -> Option<PathBuf> {
        for candidate in folder.ancestors().take(levels + 1) {
            if is_git_root(candidate).await {
                return Some(candidate.to_path_buf());
            }
        }
        None
    }

    /// Unreadable directories and entries are logged and skipped
    async fn descendants(&self, folder: &Path, levels: usize) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        let mut queue = VecDeque::from([(folder.to_path_buf(), 0usize)]);

        while let Some((dir, depth)) = queue.pop_front() {
            if is_git_root(&dir).await {
                roots.push(dir.clone());
            }
            if depth == levels {
                continue;
            }

            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cannot read {}: {}", dir.display(), e);
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Stopped reading {}: {}", dir.display(), e);
                        break;
                    }
                };
                if entry.file_name() == GIT_DIR {
                    continue;
                }
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    queue.push_back((entry.path(), depth + 1));
                }
            }
        }

        roots
    }
}

#[async_trait]
impl RepositoryDiscovery for WorkspaceDiscovery {
    async fn discover_roots(&self, search_depth: i32) -> GitResult<Vec<PathBuf>> {
        let mut roots = Vec::new();
        let levels = search_depth.unsigned_abs() as usize;

        for folder in &self.folders {
            let found = match search_depth {
                0 => {
                    if is_git_root(&folder.path).await {
                        vec![folder.path.clone()]
                    } else {
                        Vec::new()
                    }
                }
                d if d < 0 => self
                    .ancestors(&folder.path, levels)
                    .await
                    .into_iter()
                    .collect(),
                _ => self.descendants(&folder.path, levels).await,
            };

            debug!("{} root(s) under {}", found.len(), folder.path.display());
            roots.extend(found);
        }

        Ok(roots)
    }

    async fn display_name(&self, root: &Path) -> String {
        for folder in &self.folders {
            if folder.path == root
                || tokio::fs::canonicalize(&folder.path)
                    .await
                    .is_ok_and(|p| p == root)
            {
                return folder.name.clone();
            }
        }
        base_name(root)
    }
}

/// A `.git` directory, or a `.git` file as used by worktrees and submodules
async fn is_git_root(dir: &Path) -> bool {
    tokio::fs::try_exists(dir.join(GIT_DIR)).await.unwrap_or(false)
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Canonicalize a discovered root, failing when it is not a directory
pub async fn canonical_root(path: &Path) -> GitResult<PathBuf> {
    let canonical = tokio::fs::canonicalize(path).await?;
    if !tokio::fs::metadata(&canonical).await?.is_dir() {
        return Err(GitError::NotARepository(canonical.display().to_string()));
    }
    Ok(canonical)
}
