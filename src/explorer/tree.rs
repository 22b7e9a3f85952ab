use crate::error::GitResult;
use crate::explorer::repository::NodeRepository;
use crate::model::{MessageNode, Node};

pub const NO_REPOSITORIES: &str = "No repositories found.";
pub const NO_STASHES: &str = "No stashes.";

/// Tree-children callback for hosts rendering the stash tree
#[derive(Clone)]
pub struct StashTree {
    repository: NodeRepository,
}

impl StashTree {
    pub fn new(repository: NodeRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &NodeRepository {
        &self.repository
    }

    /// Children of `parent`, or the root level when `None`
    ///
    /// Already loaded children are returned as is; everything else is fetched.
    /// Empty levels become a single message row.
    pub async fn children(&self, parent: Option<&Node>) -> GitResult<Vec<Node>> {
        let nodes = match parent {
            None => {
                let eager = self.repository.explorer_config().eager_load;
                let repos = self.repository.list_repositories(eager).await?;
                if repos.is_empty() {
                    return Ok(vec![Node::Message(MessageNode::new(NO_REPOSITORIES))]);
                }
                repos.into_iter().map(Node::Repository).collect()
            }
            Some(Node::Repository(repo)) => {
                let stashes = match repo.children() {
                    Some(stashes) => stashes.to_vec(),
                    None => self.repository.list_stashes(repo.path()).await?,
                };
                if stashes.is_empty() {
                    return Ok(vec![Node::Message(MessageNode::new(NO_STASHES))]);
                }
                stashes.into_iter().map(Node::Stash).collect()
            }
            Some(Node::Stash(stash)) => {
                let files = match stash.children() {
                    Some(files) => files.to_vec(),
                    None => self.repository.list_files(stash).await?,
                };
                files.into_iter().map(Node::File).collect()
            }
            Some(Node::File(_)) | Some(Node::Message(_)) => Vec::new(),
        };

        Ok(nodes)
    }
}
