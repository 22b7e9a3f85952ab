use stashview::config::Config;
use stashview::error::AppResult;
use stashview::model::Node;
use stashview::{StashTree, NodeRepository, WorkspaceDiscovery, WorkspaceFolder, logging};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let config = Config::load_or_default()?;
    logging::init(&config.log);

    let folder = match env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => env::current_dir()?,
    };

    let discovery = WorkspaceDiscovery::new(vec![WorkspaceFolder::new(&folder)]);
    let repository = NodeRepository::new(&config, Arc::new(discovery));
    let tree = StashTree::new(repository);

    for repo in tree.children(None).await? {
        println!("{}", repo.label());
        if !repo.is_expandable() {
            continue;
        }

        for stash in tree.children(Some(&repo)).await? {
            println!("  {}", stash.label());
            if !stash.is_expandable() {
                continue;
            }

            for file in tree.children(Some(&stash)).await? {
                match &file {
                    Node::File(entry) => {
                        println!("    [{}] {}", entry.kind().decoration().badge, file.label());
                    }
                    other => println!("    {}", other.label()),
                }
            }
        }
    }

    Ok(())
}
