use crate::config::{GitConfig, TextEncoding};
use crate::error::{GitError, Result};
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Result of executing a git command, decoded to text
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Result of executing a git command with stdout left as bytes
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub stdout: Vec<u8>,
    pub stderr: String,
    pub exit_code: i32,
}

/// Runs git commands against arbitrary working directories
#[derive(Debug, Clone)]
pub struct GitExecutor {
    program: String,
    encoding: TextEncoding,
    timeout: Duration,
}

impl GitExecutor {
    pub fn new(config: &GitConfig) -> Self {
        Self {
            program: config.executable.clone(),
            encoding: config.encoding,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    /// Execute a git command in `cwd` and decode its output
    ///
    /// Arguments are passed straight to the process, never through a shell.
    /// Example: `executor.execute(repo, &["stash", "list"])`
    pub async fn execute(&self, cwd: &Path, args: &[&str]) -> Result<CommandOutput> {
        let output = self.spawn(cwd, args).await?;
        let command = args.join(" ");

        let cmd_output = CommandOutput {
            stdout: self.encoding.decode(&output.stdout),
            stderr: self.encoding.decode(&output.stderr),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        };

        if !cmd_output.success {
            return Err(GitError::Command {
                command,
                exit_code: cmd_output.exit_code,
                stdout: cmd_output.stdout,
                stderr: cmd_output.stderr,
            });
        }

        Ok(cmd_output)
    }

    /// Execute a git command and keep stdout undecoded (blob content)
    pub async fn execute_raw(&self, cwd: &Path, args: &[&str]) -> Result<RawOutput> {
        let output = self.spawn(cwd, args).await?;
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = self.encoding.decode(&output.stderr);

        if !output.status.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                exit_code,
                stdout: self.encoding.decode(&output.stdout),
                stderr,
            });
        }

        Ok(RawOutput {
            stdout: output.stdout,
            stderr,
            exit_code,
        })
    }

    async fn spawn(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
        if args.is_empty() {
            return Err(GitError::Launch {
                program: self.program.clone(),
                message: "Empty command".to_string(),
            });
        }

        debug!("{} {} (in {})", self.program, args.join(" "), cwd.display());

        let child = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(GitError::Launch {
                program: self.program.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(GitError::Timeout {
                command: args.join(" "),
                seconds: self.timeout.as_secs(),
            }),
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new(&crate::config::Config::default_config().git)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::Command as StdCommand;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        StdCommand::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    #[tokio::test]
    async fn test_execute_status() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::default();

        let output = executor
            .execute(&repo_path, &["status", "--porcelain"])
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.exit_code, 0);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_command_error() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::default();

        // Log fails in an empty repo
        let result = executor.execute(&repo_path, &["log", "--oneline"]).await;
        match result {
            Err(GitError::Command { exit_code, stderr, .. }) => {
                assert_ne!(exit_code, 0);
                assert!(!stderr.is_empty());
            }
            other => panic!("expected command error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let (_temp, repo_path) = create_test_repo();
        let mut config = crate::config::Config::default_config().git;
        config.executable = "definitely-not-a-real-git-binary".to_string();
        let executor = GitExecutor::new(&config);

        let result = executor.execute(&repo_path, &["status"]).await;
        assert!(matches!(result, Err(GitError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_empty_command() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::default();

        let result = executor.execute(&repo_path, &[]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_arguments_are_not_shell_expanded() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::default();

        // Passed verbatim as a pathspec, so nothing matches and nothing runs
        let output = executor
            .execute(&repo_path, &["status", "--porcelain", "--", "$(whoami)"])
            .await
            .unwrap();
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_execute_raw_keeps_bytes() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::default();

        let blob = repo_path.join("blob.bin");
        std::fs::write(&blob, [0u8, 159, 146, 150, 255]).unwrap();
        let hash = executor
            .execute(&repo_path, &["hash-object", "-w", "blob.bin"])
            .await
            .unwrap();

        let raw = executor
            .execute_raw(&repo_path, &["cat-file", "blob", hash.stdout.trim()])
            .await
            .unwrap();
        assert_eq!(raw.stdout, vec![0u8, 159, 146, 150, 255]);
    }
}
