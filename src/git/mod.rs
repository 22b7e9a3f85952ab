pub mod commands;
pub mod discovery;
pub mod executor;
pub mod outcome;
pub mod parser;

// Re-export commonly used types
pub use commands::{StashCommands, StashPushOptions};
pub use discovery::{RepositoryDiscovery, WorkspaceDiscovery, WorkspaceFolder};
pub use executor::{CommandOutput, GitExecutor, RawOutput};
pub use outcome::{Caveat, OperationReport, Outcome, StashOperation, Transcript};
pub use parser::{
    ChangedFile, StashDetails, StashEntry, parse_name_status, parse_stash_details,
    parse_stash_list, parse_tree_listing, split_subject, unquote_path,
};
