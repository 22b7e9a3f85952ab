use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::Utc;

use crate::git::outcome::Transcript;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Append-only history of state-changing stash commands
#[derive(Debug)]
pub struct CommandHistory {
    log_path: PathBuf,
}

impl CommandHistory {
    /// Create a history at the default path
    pub fn new() -> std::io::Result<Self> {
        Self::with_path(Self::default_log_path()?)
    }

    /// Create a history at a custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let log_path = path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }

        Ok(Self { log_path })
    }

    /// Default path: ~/.config/stashview/history.log
    fn default_log_path() -> std::io::Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "HOME environment variable not set"
            ))?;

        Ok(PathBuf::from(home)
            .join(".config")
            .join("stashview")
            .join("history.log"))
    }

    /// Append one command transcript
    ///
    /// The header line is `[time] [cwd] [exit:N] git <args>`; captured output
    /// follows, indented, so the entry reads back as a unit.
    pub fn record(&self, transcript: &Transcript) -> std::io::Result<()> {
        self.rotate_if_needed()?;

        let timestamp = Utc::now().to_rfc3339();
        let exit = transcript
            .exit_code
            .map_or_else(|| "none".to_string(), |code| code.to_string());

        let mut entry = format!(
            "[{}] [{}] [exit:{}] git {}\n",
            timestamp,
            transcript.cwd.display(),
            exit,
            transcript.command
        );
        for line in transcript.stdout.lines().chain(transcript.stderr.lines()) {
            entry.push_str("    ");
            entry.push_str(line);
            entry.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;

        file.write_all(entry.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    /// Rotate log file if it exceeds MAX_LOG_SIZE
    fn rotate_if_needed(&self) -> std::io::Result<()> {
        if !self.log_path.exists() {
            return Ok(());
        }

        let metadata = fs::metadata(&self.log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = self.log_path.with_extension("log.1");
            fs::rename(&self.log_path, backup_path)?;
        }

        Ok(())
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn transcript(command: &str, exit_code: Option<i32>) -> Transcript {
        Transcript {
            command: command.to_string(),
            cwd: PathBuf::from("/test/repo"),
            exit_code,
            stdout: "Saved working directory".to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_create_history() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("sub").join("history.log");

        let history = CommandHistory::with_path(&log_path).unwrap();
        assert_eq!(history.log_path(), log_path);
        assert!(log_path.parent().unwrap().exists());
    }

    #[test]
    fn test_record_command() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("history.log");

        let history = CommandHistory::with_path(&log_path).unwrap();
        history.record(&transcript("stash push", Some(0))).unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("git stash push"));
        assert!(content.contains("/test/repo"));
        assert!(content.contains("exit:0"));
        assert!(content.contains("    Saved working directory"));
    }

    #[test]
    fn test_launch_failure_has_no_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("history.log");

        let history = CommandHistory::with_path(&log_path).unwrap();
        history.record(&transcript("stash clear", None)).unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("exit:none"));
    }

    #[test]
    fn test_multiple_entries_append() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("history.log");

        let history = CommandHistory::with_path(&log_path).unwrap();
        history.record(&transcript("stash push", Some(0))).unwrap();
        history.record(&transcript("stash pop stash@{0}", Some(1))).unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        let headers = content.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(headers, 2);
        assert!(content.contains("exit:1"));
    }

    #[test]
    fn test_log_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("history.log");

        let history = CommandHistory::with_path(&log_path).unwrap();

        let large = "x".repeat(MAX_LOG_SIZE as usize);
        history.record(&transcript(&large, Some(0))).unwrap();
        history.record(&transcript("stash list", Some(0))).unwrap();

        let backup_path = log_path.with_extension("log.1");
        assert!(backup_path.exists());

        let metadata = fs::metadata(&log_path).unwrap();
        assert!(metadata.len() < MAX_LOG_SIZE);
    }
}
