use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepository(String),

    #[error("Failed to launch {program}: {message}")]
    Launch { program: String, message: String },

    #[error("Command 'git {command}' failed with exit code {exit_code}: {}", stderr.trim())]
    Command {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Command 'git {command}' timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to parse git output: {0}")]
    Parse(String),

    #[error("Invalid node type: {0}")]
    InvalidNode(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl GitError {
    /// Stderr of a failed command, if this error carries one
    pub fn stderr(&self) -> Option<&str> {
        match self {
            GitError::Command { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// True when a command ran but exited non-zero with stderr starting with any of `prefixes`
    pub fn is_benign(&self, prefixes: &[&str]) -> bool {
        self.stderr()
            .map(str::trim_start)
            .is_some_and(|stderr| prefixes.iter().any(|p| stderr.starts_with(p)))
    }
}

/// Top-level application error that wraps all module-specific errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;

pub type Result<T> = GitResult<T>;
