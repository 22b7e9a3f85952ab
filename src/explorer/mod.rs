pub mod repository;
pub mod tree;

pub use repository::NodeRepository;
pub use tree::StashTree;
