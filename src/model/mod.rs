pub mod decoration;
pub mod node;

pub use decoration::Decoration;
pub use node::{FileKind, FileNode, MessageNode, Node, NodeKey, RepositoryNode, StashNode, StashRef};
