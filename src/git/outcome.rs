use crate::error::{GitError, GitResult};
use crate::git::executor::CommandOutput;
use std::fmt;
use std::path::{Path, PathBuf};

const CONFLICT_MARKERS: [&str; 2] = ["CONFLICT (", "Merge conflict"];
const NOTHING_TO_STASH: &str = "No local changes to save";

/// State-changing stash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StashOperation {
    Push,
    Pop,
    Apply,
    Drop,
    Branch,
    Clear,
}

impl StashOperation {
    fn past_tense(self) -> &'static str {
        match self {
            StashOperation::Push => "Changes stashed",
            StashOperation::Pop => "Stash popped",
            StashOperation::Apply => "Stash applied",
            StashOperation::Drop => "Stash dropped",
            StashOperation::Branch => "Branch created from stash",
            StashOperation::Clear => "All stashes cleared",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            StashOperation::Push => "stash",
            StashOperation::Pop => "pop",
            StashOperation::Apply => "apply",
            StashOperation::Drop => "drop",
            StashOperation::Branch => "branch",
            StashOperation::Clear => "clear",
        }
    }
}

/// Full record of one command run, available on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub command: String,
    pub cwd: PathBuf,
    /// `None` when the process never started or was killed
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Transcript {
    pub fn from_result(cwd: &Path, args: &[&str], result: &GitResult<CommandOutput>) -> Self {
        let command = args.join(" ");
        let cwd = cwd.to_path_buf();

        match result {
            Ok(output) => Transcript {
                command,
                cwd,
                exit_code: Some(output.exit_code),
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
            },
            Err(GitError::Command { exit_code, stdout, stderr, .. }) => Transcript {
                command,
                cwd,
                exit_code: Some(*exit_code),
                stdout: stdout.clone(),
                stderr: stderr.clone(),
            },
            Err(other) => Transcript {
                command,
                cwd,
                exit_code: None,
                stdout: String::new(),
                stderr: other.to_string(),
            },
        }
    }

    fn contains_any(&self, needles: &[&str]) -> bool {
        needles
            .iter()
            .any(|n| self.stdout.contains(n) || self.stderr.contains(n))
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "$ git {}", self.command)?;
        writeln!(f, "  (in {})", self.cwd.display())?;
        if !self.stdout.is_empty() {
            writeln!(f, "{}", self.stdout.trim_end())?;
        }
        if !self.stderr.is_empty() {
            writeln!(f, "{}", self.stderr.trim_end())?;
        }
        match self.exit_code {
            Some(code) => write!(f, "[exit {}]", code),
            None => write!(f, "[not started]"),
        }
    }
}

/// Reason a completed operation still needs the user's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caveat {
    Conflicts,
    NothingToStash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Caveat(Caveat),
    Failure,
}

/// User-facing result of a mutating stash command
#[derive(Debug, Clone)]
pub struct OperationReport {
    pub operation: StashOperation,
    pub outcome: Outcome,
    pub summary: String,
    pub suggestion: Option<String>,
    pub transcript: Transcript,
}

impl OperationReport {
    /// Classify a finished command into exactly one outcome
    pub fn classify(
        operation: StashOperation,
        result: &GitResult<CommandOutput>,
        transcript: Transcript,
    ) -> Self {
        // Conflicts exit non-zero but the stash was still applied
        let conflicted = transcript.contains_any(&CONFLICT_MARKERS);
        let nothing = transcript.stdout.trim_start().starts_with(NOTHING_TO_STASH)
            || transcript.stderr.trim_start().starts_with(NOTHING_TO_STASH);

        let applies_changes = matches!(
            operation,
            StashOperation::Pop | StashOperation::Apply | StashOperation::Branch
        );

        let (outcome, summary, suggestion) = match result {
            _ if conflicted && applies_changes => (
                Outcome::Caveat(Caveat::Conflicts),
                format!("{} with conflicts.", operation.past_tense()),
                Some(match operation {
                    StashOperation::Pop => {
                        "Resolve the conflicts; the stash was kept and can be dropped afterwards."
                            .to_string()
                    }
                    _ => "Resolve the conflicts in the listed files.".to_string(),
                }),
            ),
            Ok(_) if nothing => (
                Outcome::Caveat(Caveat::NothingToStash),
                "No local changes to stash.".to_string(),
                None,
            ),
            Ok(_) => (Outcome::Success, format!("{}.", operation.past_tense()), None),
            Err(err) => {
                let (summary, suggestion) = Self::match_error_patterns(operation, err);
                (Outcome::Failure, summary, suggestion)
            }
        };

        OperationReport {
            operation,
            outcome,
            summary,
            suggestion,
            transcript,
        }
    }

    /// Match common failure patterns and provide short messages
    fn match_error_patterns(
        operation: StashOperation,
        error: &GitError,
    ) -> (String, Option<String>) {
        match error {
            GitError::Launch { program, .. } => {
                return (
                    format!("Could not run '{}'.", program),
                    Some("Check git.executable in config.toml.".to_string()),
                );
            }
            GitError::Timeout { seconds, .. } => {
                return (
                    format!("git did not finish within {}s.", seconds),
                    Some("Raise git.timeout_seconds in config.toml.".to_string()),
                );
            }
            _ => {}
        }

        let lower = match error {
            GitError::Command { stdout, stderr, .. } => {
                format!("{}\n{}", stdout, stderr).to_lowercase()
            }
            other => other.to_string().to_lowercase(),
        };

        if lower.contains("would be overwritten") {
            return (
                "Local changes would be overwritten by the stash.".to_string(),
                Some("Commit or stash your current changes first.".to_string()),
            );
        }

        if lower.contains("already exists") {
            return (
                "A branch with that name already exists.".to_string(),
                Some("Use a different name.".to_string()),
            );
        }

        if lower.contains("is not a valid reference")
            || lower.contains("not a stash-like commit")
            || lower.contains("no stash entries found")
        {
            return (
                "That stash no longer exists.".to_string(),
                Some("Refresh the stash list and try again.".to_string()),
            );
        }

        if lower.contains("pathspec") && lower.contains("did not match") {
            return (
                "File path not found in the repository.".to_string(),
                None,
            );
        }

        if lower.contains("not a git repository") {
            return (
                "Not a git repository.".to_string(),
                None,
            );
        }

        (format!("Failed to {} stash.", operation.verb()), None)
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }
}
