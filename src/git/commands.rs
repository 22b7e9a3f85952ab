use crate::audit::CommandHistory;
use crate::git::executor::GitExecutor;
use crate::git::outcome::{OperationReport, StashOperation, Transcript};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Options for `git stash push`
#[derive(Debug, Clone, Default)]
pub struct StashPushOptions {
    pub message: Option<String>,
    pub keep_index: bool,
    pub include_untracked: bool,
    /// Also stash ignored files; supersedes `include_untracked`
    pub all: bool,
    pub staged: bool,
    pub paths: Vec<String>,
}

impl StashPushOptions {
    fn to_args(&self) -> Vec<String> {
        let mut args = vec!["stash".to_string(), "push".to_string()];

        if self.keep_index {
            args.push("--keep-index".to_string());
        }
        if self.all {
            args.push("--all".to_string());
        } else if self.include_untracked {
            args.push("--include-untracked".to_string());
        }
        if self.staged {
            args.push("--staged".to_string());
        }
        if let Some(message) = self.message.as_deref().filter(|m| !m.trim().is_empty()) {
            args.push("--message".to_string());
            args.push(message.to_string());
        }
        if !self.paths.is_empty() {
            args.push("--".to_string());
            args.extend(self.paths.iter().cloned());
        }

        args
    }
}

/// State-changing stash commands for one repository
///
/// Indices are used as given; callers holding a node across a refresh should
/// re-resolve it first (see `NodeRepository::stash_at`).
#[derive(Debug, Clone)]
pub struct StashCommands {
    executor: GitExecutor,
    repo_path: PathBuf,
    history: Option<Arc<CommandHistory>>,
}

impl StashCommands {
    pub fn new(
        executor: GitExecutor,
        repo_path: PathBuf,
        history: Option<Arc<CommandHistory>>,
    ) -> Self {
        Self {
            executor,
            repo_path,
            history,
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub async fn push(&self, options: &StashPushOptions) -> OperationReport {
        let args = options.to_args();
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(StashOperation::Push, &args).await
    }

    pub async fn pop(&self, index: usize, reinstate_index: bool) -> OperationReport {
        let rev = stash_rev(index);
        let mut args = vec!["stash", "pop"];
        if reinstate_index {
            args.push("--index");
        }
        args.push(&rev);
        self.run(StashOperation::Pop, &args).await
    }

    pub async fn apply(&self, index: usize, reinstate_index: bool) -> OperationReport {
        let rev = stash_rev(index);
        let mut args = vec!["stash", "apply"];
        if reinstate_index {
            args.push("--index");
        }
        args.push(&rev);
        self.run(StashOperation::Apply, &args).await
    }

    pub async fn drop(&self, index: usize) -> OperationReport {
        let rev = stash_rev(index);
        self.run(StashOperation::Drop, &["stash", "drop", &rev]).await
    }

    pub async fn branch(&self, index: usize, name: &str) -> OperationReport {
        let rev = stash_rev(index);
        self.run(StashOperation::Branch, &["stash", "branch", name, &rev]).await
    }

    pub async fn clear(&self) -> OperationReport {
        self.run(StashOperation::Clear, &["stash", "clear"]).await
    }

    async fn run(&self, operation: StashOperation, args: &[&str]) -> OperationReport {
        let result = self.executor.execute(&self.repo_path, args).await;
        let transcript = Transcript::from_result(&self.repo_path, args, &result);

        if let Some(history) = &self.history
            && let Err(e) = history.record(&transcript)
        {
            warn!("Failed to record command history: {}", e);
        }

        let report = OperationReport::classify(operation, &result, transcript);
        info!(
            "git {} in {}: {:?} ({})",
            args.join(" "),
            self.repo_path.display(),
            report.outcome,
            report.summary
        );
        report
    }
}

fn stash_rev(index: usize) -> String {
    format!("stash@{{{}}}", index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_args_default() {
        let args = StashPushOptions::default().to_args();
        assert_eq!(args, vec!["stash", "push"]);
    }

    #[test]
    fn test_push_args_full() {
        let options = StashPushOptions {
            message: Some("half done".to_string()),
            keep_index: true,
            include_untracked: true,
            all: false,
            staged: false,
            paths: vec!["src/a.rs".to_string(), "b c.txt".to_string()],
        };
        assert_eq!(
            options.to_args(),
            vec![
                "stash", "push", "--keep-index", "--include-untracked",
                "--message", "half done", "--", "src/a.rs", "b c.txt",
            ]
        );
    }

    #[test]
    fn test_push_all_supersedes_untracked() {
        let options = StashPushOptions {
            include_untracked: true,
            all: true,
            message: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(options.to_args(), vec!["stash", "push", "--all"]);
    }

    #[test]
    fn test_stash_rev() {
        assert_eq!(stash_rev(3), "stash@{3}");
    }
}
