#![allow(dead_code)]

use stashview::config::Config;
use stashview::{NodeRepository, WorkspaceDiscovery, WorkspaceFolder};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a test git repository
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().canonicalize().unwrap();

    git(&repo_path, &["init"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Run git in `repo_path`, panicking on failure
pub fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    write_file(repo_path, file, content);
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

pub fn write_file(repo_path: &Path, file: &str, content: impl AsRef<[u8]>) {
    let file_path = repo_path.join(file);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create directory");
    }
    fs::write(&file_path, content).expect("Failed to write file");
}

/// Repository with one stash covering every kind of change:
/// modified `keep.txt`, deleted `gone.txt`, renamed `old.txt` → `new.txt`,
/// added `added.txt` and untracked `extra/loose.txt`.
pub fn create_repo_with_mixed_stash() -> (TempDir, PathBuf) {
    let (temp, repo_path) = create_test_repo();
    create_commit(&repo_path, "keep.txt", "original\n", "Add keep");
    create_commit(&repo_path, "gone.txt", "doomed\n", "Add gone");
    create_commit(
        &repo_path,
        "old.txt",
        "a file that will be renamed\nwith enough lines\nto be detected\n",
        "Add old",
    );

    write_file(&repo_path, "keep.txt", "changed\n");
    git(&repo_path, &["rm", "-q", "gone.txt"]);
    git(&repo_path, &["mv", "old.txt", "new.txt"]);
    write_file(&repo_path, "added.txt", "brand new\n");
    git(&repo_path, &["add", "added.txt"]);
    write_file(&repo_path, "extra/loose.txt", "untracked\n");

    git(&repo_path, &["stash", "push", "--include-untracked", "-m", "mixed bag"]);

    (temp, repo_path)
}

/// Node repository over a single workspace folder with default settings
pub fn node_repository(folder: &Path) -> NodeRepository {
    node_repository_with(folder, Config::default_config())
}

pub fn node_repository_with(folder: &Path, config: Config) -> NodeRepository {
    let discovery = WorkspaceDiscovery::new(vec![WorkspaceFolder::new(folder)]);
    NodeRepository::new(&config, Arc::new(discovery))
}
