use crate::config::DiffConfig;
use crate::diff::materialize::Materializer;
use crate::diff::uri::{ContentSide, ContentUri};
use crate::error::{GitError, GitResult};
use crate::explorer::NodeRepository;
use crate::model::{FileKind, FileNode};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Something a viewer can open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// Stashed content, fetched lazily through the content URI
    Content(ContentUri),
    /// A file on disk: working copy or materialized temp file
    File(PathBuf),
    /// A working-copy path that does not exist
    Missing(PathBuf),
}

impl Resource {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resource::Missing(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLayout {
    /// Only one side exists; shown in a plain file viewer
    Single(Resource),
    TwoPane { left: Resource, right: Resource },
}

/// What the host should open for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffView {
    pub title: String,
    pub layout: DiffLayout,
    /// Non-fatal problems met while resolving
    pub warnings: Vec<String>,
}

/// Sides of a change: `(before, after)`
pub fn sides(kind: FileKind) -> (Option<ContentSide>, Option<ContentSide>) {
    match kind {
        FileKind::Added => (None, Some(ContentSide::Stash)),
        FileKind::Untracked => (None, Some(ContentSide::Untracked)),
        FileKind::Deleted => (Some(ContentSide::Parent), None),
        FileKind::Modified | FileKind::Renamed => {
            (Some(ContentSide::Parent), Some(ContentSide::Stash))
        }
    }
}

pub fn has_two_sides(kind: FileKind) -> bool {
    matches!(sides(kind), (Some(_), Some(_)))
}

/// Chooses the content to compare for a stashed file
pub struct DiffResolver {
    repository: NodeRepository,
    config: DiffConfig,
    materializer: Materializer,
}

impl DiffResolver {
    pub fn new(repository: NodeRepository, config: DiffConfig) -> Self {
        Self {
            repository,
            config,
            materializer: Materializer::new(),
        }
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    /// Stash against its parent: two panes when both sides exist, otherwise the lone side
    pub async fn show_stash_diff(&self, file: &FileNode) -> GitResult<DiffView> {
        let layout = match sides(file.kind()) {
            (Some(before), Some(after)) => DiffLayout::TwoPane {
                left: self.resource(file, before).await?,
                right: self.resource(file, after).await?,
            },
            (Some(side), None) | (None, Some(side)) => {
                DiffLayout::Single(self.resource(file, side).await?)
            }
            (None, None) => return Err(invalid_node(file)),
        };

        let title = match &layout {
            DiffLayout::TwoPane { .. } => format!("{} ({})", label(file), file.stash().rev()),
            DiffLayout::Single(_) => {
                format!("{} ({}, {})", label(file), file.stash().rev(), file.kind())
            }
        };

        Ok(DiffView {
            title,
            layout,
            warnings: Vec::new(),
        })
    }

    /// Stashed content against the file currently on disk
    ///
    /// `working_copy_on_left` only decides placement. A missing working-copy file
    /// becomes a warning and a `Resource::Missing` pane.
    pub async fn compare_with_working_copy(
        &self,
        file: &FileNode,
        working_copy_on_left: bool,
    ) -> GitResult<DiffView> {
        let (before, after) = sides(file.kind());
        let side = after.or(before).ok_or_else(|| invalid_node(file))?;
        let stashed = self.resource(file, side).await?;

        let mut warnings = Vec::new();
        let path = file.working_copy_path();
        let current = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Resource::File(path)
        } else {
            let message = format!("{} does not exist in the working copy", path.display());
            warn!("{}", message);
            warnings.push(message);
            Resource::Missing(path)
        };

        let rev = file.stash().rev();
        let (left, right, title) = if working_copy_on_left {
            (current, stashed, format!("{} (working copy ↔ {})", label(file), rev))
        } else {
            (stashed, current, format!("{} ({} ↔ working copy)", label(file), rev))
        };

        Ok(DiffView {
            title,
            layout: DiffLayout::TwoPane { left, right },
            warnings,
        })
    }

    /// Address one side; image content is fetched now and written to a temp file
    async fn resource(&self, file: &FileNode, side: ContentSide) -> GitResult<Resource> {
        let uri = ContentUri::for_file(file, side);
        let path = match side {
            ContentSide::Parent => uri.old_path.as_deref().unwrap_or(&uri.path),
            ContentSide::Stash | ContentSide::Untracked => &uri.path,
        };

        if !self.config.is_image(path) {
            return Ok(Resource::Content(uri));
        }

        debug!("Materializing {} for {:?}", uri.object_name(), side);
        let bytes = self.repository.resolve_uri(&uri).await?;
        let temp = self.materializer.write(&uri.to_string(), path, &bytes)?;
        Ok(Resource::File(temp))
    }
}

fn label(file: &FileNode) -> String {
    match file.old_name() {
        Some(old) => format!("{} → {}", old, file.name()),
        None => file.name().to_string(),
    }
}

fn invalid_node(file: &FileNode) -> GitError {
    GitError::InvalidNode(format!("{} ({})", file.name(), file.kind()))
}
