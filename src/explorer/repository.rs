use crate::audit::CommandHistory;
use crate::config::{Config, ExplorerConfig};
use crate::diff::uri::{ContentSide, ContentUri};
use crate::error::GitResult;
use crate::git::discovery::{self, RepositoryDiscovery};
use crate::git::executor::GitExecutor;
use crate::git::parser::{self, STASH_DETAILS_FORMAT, STASH_LIST_FORMAT};
use crate::git::StashCommands;
use crate::model::{FileKind, FileNode, RepositoryNode, StashNode};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Stderr prefixes meaning "this stash has no untracked parent"
const NO_UNTRACKED_PARENT: [&str; 2] = [
    "fatal: Not a valid object name",
    "fatal: not a tree object",
];

/// Keeps git from octal-quoting non-ASCII paths
const UNQUOTED_PATHS: [&str; 2] = ["-c", "core.quotepath=false"];

/// Single entry point that populates the stash tree from git
#[derive(Clone)]
pub struct NodeRepository {
    inner: Arc<Inner>,
}

struct Inner {
    executor: GitExecutor,
    discovery: Arc<dyn RepositoryDiscovery>,
    explorer: ExplorerConfig,
    history: Option<Arc<CommandHistory>>,
}

impl NodeRepository {
    pub fn new(config: &Config, discovery: Arc<dyn RepositoryDiscovery>) -> Self {
        let history = config.log.command_history.as_ref().and_then(|path| {
            CommandHistory::with_path(path)
                .map(Arc::new)
                .map_err(|e| warn!("Command history disabled ({}): {}", path.display(), e))
                .ok()
        });

        Self {
            inner: Arc::new(Inner {
                executor: GitExecutor::new(&config.git),
                discovery,
                explorer: config.explorer.clone(),
                history,
            }),
        }
    }

    /// Same discovery collaborator, new settings
    pub fn reconfigured(&self, config: &Config) -> Self {
        Self::new(config, Arc::clone(&self.inner.discovery))
    }

    pub fn explorer_config(&self) -> &ExplorerConfig {
        &self.inner.explorer
    }

    /// Discover repositories; with `eager`, also load each one's stashes
    ///
    /// A repository that fails to canonicalize or list is logged and left out;
    /// the others are still returned, in discovery order.
    pub async fn list_repositories(&self, eager: bool) -> GitResult<Vec<RepositoryNode>> {
        let finder = &self.inner.discovery;
        let roots = finder
            .discover_roots(self.inner.explorer.search_depth)
            .await?;

        let mut seen = HashSet::new();
        let mut repos = Vec::new();
        for root in roots {
            let path = match discovery::canonical_root(&root).await {
                Ok(path) => path,
                Err(e) => {
                    warn!("Skipping repository {}: {}", root.display(), e);
                    continue;
                }
            };
            if seen.insert(path.clone()) {
                let name = finder.display_name(&path).await;
                repos.push(RepositoryNode::new(path, name));
            }
        }

        if !eager {
            return Ok(repos);
        }

        let mut tasks = JoinSet::new();
        for (position, repo) in repos.iter().enumerate() {
            let this = self.clone();
            let path = repo.path().to_path_buf();
            tasks.spawn(async move { (position, this.list_stashes(&path).await) });
        }

        let mut loaded: Vec<Option<Vec<StashNode>>> = vec![None; repos.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((position, Ok(stashes))) => loaded[position] = Some(stashes),
                Ok((position, Err(e))) => {
                    warn!("Failed to list stashes for {}: {}", repos[position].path().display(), e);
                }
                Err(e) => warn!("Stash listing task failed: {}", e),
            }
        }

        Ok(repos
            .into_iter()
            .zip(loaded)
            .filter_map(|(mut repo, stashes)| {
                repo.set_children(stashes?);
                Some(repo)
            })
            .collect())
    }

    /// Fresh stash listing for a repository
    pub async fn list_stashes(&self, repo_path: &Path) -> GitResult<Vec<StashNode>> {
        let Some(listing) = self.get_raw_listing(repo_path).await? else {
            return Ok(Vec::new());
        };

        let entries = parser::parse_stash_list(&listing);

        let details = match self
            .inner
            .executor
            .execute(repo_path, &["stash", "list", STASH_DETAILS_FORMAT])
            .await
        {
            Ok(output) => parser::parse_stash_details(&output.stdout),
            Err(e) => {
                warn!("Stash details unavailable for {}: {}", repo_path.display(), e);
                Vec::new()
            }
        };

        let stashes = entries
            .into_iter()
            .map(|entry| {
                let detail = details.get(entry.index);
                let hash = detail
                    .map(|d| d.hash.clone())
                    .unwrap_or_else(|| entry.short_hash.clone());

                let mut stash = StashNode::new(
                    repo_path.to_path_buf(),
                    entry.index,
                    hash,
                    entry.short_hash,
                    entry.date,
                    entry.subject,
                    entry.description,
                    entry.branch,
                );
                if let Some(detail) = detail {
                    stash.parent_hashes = detail.parent_hashes.clone();
                    stash.note = detail.note.clone();
                }
                stash
            })
            .collect::<Vec<_>>();

        debug!("{} stash(es) in {}", stashes.len(), repo_path.display());
        Ok(stashes)
    }

    /// Changed files of a stash: tracked changes followed by untracked files
    pub async fn list_files(&self, stash: &StashNode) -> GitResult<Vec<FileNode>> {
        let repo_path = stash.repo_path();
        let rev = stash.rev();
        let parent = format!("{}^1", rev);
        let stash_ref = stash.stash_ref();

        let mut args: Vec<&str> = UNQUOTED_PATHS.to_vec();
        args.extend(["diff", "--name-status", "-M", parent.as_str(), rev.as_str()]);
        let output = self.inner.executor.execute(repo_path, &args).await?;

        let mut files: Vec<FileNode> = parser::parse_name_status(&output.stdout)
            .into_iter()
            .map(|changed| match changed.old_path {
                Some(old) => FileNode::renamed(old, changed.path, stash_ref.clone()),
                None => FileNode::new(changed.path, changed.kind, stash_ref.clone()),
            })
            .collect();

        for name in self.untracked_files(repo_path, &rev).await? {
            files.push(FileNode::new(name, FileKind::Untracked, stash_ref.clone()));
        }

        Ok(files)
    }

    async fn untracked_files(&self, repo_path: &Path, rev: &str) -> GitResult<Vec<String>> {
        let untracked = format!("{}^3", rev);
        let mut args: Vec<&str> = UNQUOTED_PATHS.to_vec();
        args.extend(["ls-tree", "-r", "--name-only", untracked.as_str()]);

        match self.inner.executor.execute(repo_path, &args).await {
            Ok(output) => Ok(parser::parse_tree_listing(&output.stdout)),
            Err(e) if e.is_benign(&NO_UNTRACKED_PARENT) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Raw bytes of one side of a file
    pub async fn get_content(&self, file: &FileNode, side: ContentSide) -> GitResult<Vec<u8>> {
        self.resolve_uri(&ContentUri::for_file(file, side)).await
    }

    /// Bytes addressed by a content URI; the only place file content enters
    pub async fn resolve_uri(&self, uri: &ContentUri) -> GitResult<Vec<u8>> {
        let object = uri.object_name();
        let output = self
            .inner
            .executor
            .execute_raw(&uri.cwd, &["show", &object])
            .await?;
        Ok(output.stdout)
    }

    /// Unparsed stash listing, `None` when there are no stashes
    pub async fn get_raw_listing(&self, repo_path: &Path) -> GitResult<Option<String>> {
        let output = self
            .inner
            .executor
            .execute(repo_path, &["stash", "list", STASH_LIST_FORMAT])
            .await?;

        if output.stdout.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(output.stdout))
        }
    }

    /// Re-resolve a stash by index against a fresh listing
    pub async fn stash_at(&self, repo_path: &Path, index: usize) -> GitResult<Option<StashNode>> {
        Ok(self
            .list_stashes(repo_path)
            .await?
            .into_iter()
            .find(|stash| stash.index == index))
    }

    /// Mutating stash commands bound to a repository
    pub fn commands(&self, repo_path: &Path) -> StashCommands {
        StashCommands::new(
            self.inner.executor.clone(),
            repo_path.to_path_buf(),
            self.inner.history.clone(),
        )
    }
}
