pub mod audit;
pub mod config;
pub mod diff;
pub mod error;
pub mod explorer;
pub mod git;
pub mod logging;
pub mod model;
pub mod refresh;

// Re-export commonly used types for convenience
pub use config::Config;
pub use diff::{ContentSide, ContentUri, DiffLayout, DiffResolver, DiffView, Resource};
pub use error::{AppError, AppResult, GitError, GitResult, Result};
pub use explorer::{NodeRepository, StashTree};
pub use git::{StashCommands, StashPushOptions, WorkspaceDiscovery, WorkspaceFolder};
pub use model::{FileKind, FileNode, MessageNode, Node, RepositoryNode, StashNode};
pub use refresh::{RefreshEvent, RefreshScheduler, RefreshTrigger};
