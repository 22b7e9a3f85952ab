use crate::error::GitError;
use crate::model::FileKind;
use chrono::{DateTime, FixedOffset};
use tracing::warn;

/// `git stash list` format consumed by [`parse_stash_list`]
pub const STASH_LIST_FORMAT: &str = "--format=%ci %h %s";

/// `git stash list` format consumed by [`parse_stash_details`]
pub const STASH_DETAILS_FORMAT: &str = "--format=%H%x1f%P%x1f%N%x1e";

/// Width of `%ci` output: `2024-01-01 10:00:00 +0000`
const DATE_WIDTH: usize = 25;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

/// Parse `git stash list --format=%ci %h %s` output
///
/// Slices on fixed offsets instead of splitting on spaces: the subject is free text
/// and may contain anything. Lines with the wrong shape are skipped with a warning
/// but still occupy their position, so `index` always matches `stash@{index}`.
pub fn parse_stash_list(output: &str) -> Vec<StashEntry> {
    let mut stashes = Vec::new();

    for (index, line) in output.lines().filter(|l| !l.is_empty()).enumerate() {
        match parse_stash_line(index, line) {
            Ok(entry) => stashes.push(entry),
            Err(e) => warn!("Skipping stash line {}: {}", index, e),
        }
    }

    stashes
}

fn parse_stash_line(index: usize, line: &str) -> Result<StashEntry, GitError> {
    let malformed = || GitError::Parse(format!("malformed stash line '{}'", line));

    let date_str = line.get(..DATE_WIDTH).ok_or_else(malformed)?;
    let date = DateTime::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|e| GitError::Parse(format!("invalid stash date '{}': {}", date_str, e)))?;

    let rest = line
        .get(DATE_WIDTH..)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(malformed)?;

    let (short_hash, subject) = match rest.split_once(' ') {
        Some((hash, subject)) => (hash, subject.trim()),
        None => (rest.trim_end(), ""),
    };

    if short_hash.is_empty() || !short_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed());
    }

    let (description, branch) = split_subject(subject);

    Ok(StashEntry {
        index,
        short_hash: short_hash.to_string(),
        date,
        subject: subject.to_string(),
        description,
        branch,
    })
}

/// Split a stash subject into description and branch
///
/// `"WIP on <branch>: <desc>"` and `"On <branch>: <desc>"` yield the branch; any
/// other subject is returned unchanged as the description.
pub fn split_subject(subject: &str) -> (String, Option<String>) {
    for prefix in ["WIP on ", "On "] {
        if let Some(rest) = subject.strip_prefix(prefix)
            && let Some((branch, description)) = rest.split_once(':')
            && !branch.is_empty()
            && !branch.contains(char::is_whitespace)
        {
            return (description.trim_start().to_string(), Some(branch.to_string()));
        }
    }

    (subject.to_string(), None)
}

/// Parse `git stash list --format=%H%x1f%P%x1f%N%x1e` output
pub fn parse_stash_details(output: &str) -> Vec<StashDetails> {
    output
        .split(RECORD_SEP)
        .map(|record| record.trim_start_matches(['\n', '\r']))
        .filter(|record| !record.is_empty())
        .filter_map(|record| {
            let mut fields = record.split(FIELD_SEP);
            let hash = fields.next()?.trim();
            if hash.is_empty() {
                warn!("Skipping stash details record without hash");
                return None;
            }

            let parents = fields
                .next()
                .map(|p| p.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default();

            let note = fields
                .next()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string);

            Some(StashDetails {
                hash: hash.to_string(),
                parent_hashes: parents,
                note,
            })
        })
        .collect()
}

/// Parse `git diff --name-status -M` output
///
/// Only `A`, `M`, `D` and `R<score>` lines are recognised; other status codes are
/// ignored. Rename lines read `R<score><TAB><old><TAB><new>`. Quoted path fields
/// are unquoted with [`unquote_path`].
pub fn parse_name_status(output: &str) -> Vec<ChangedFile> {
    let mut files = Vec::new();

    for line in output.lines() {
        let mut chars = line.chars();
        let Some(code) = chars.next() else {
            continue;
        };
        let rest = chars.as_str();

        let kind = match code {
            'A' => FileKind::Added,
            'M' => FileKind::Modified,
            'D' => FileKind::Deleted,
            'R' => FileKind::Renamed,
            _ => continue,
        };

        if kind == FileKind::Renamed {
            let paths = path_field(rest.trim_start_matches(|c: char| c.is_ascii_digit()));

            match paths.split_once('\t') {
                Some((old, new)) if !old.is_empty() && !new.is_empty() => {
                    files.push(ChangedFile {
                        kind,
                        path: unquote_path(new),
                        old_path: Some(unquote_path(old)),
                    });
                }
                _ => warn!("Skipping malformed rename line '{}'", line),
            }
            continue;
        }

        let path = path_field(rest);
        if path.is_empty() {
            warn!("Skipping status line without path '{}'", line);
            continue;
        }

        files.push(ChangedFile {
            kind,
            path: unquote_path(path),
            old_path: None,
        });
    }

    files
}

/// Parse `git ls-tree -r --name-only` output, keeping the tool's order
pub fn parse_tree_listing(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.is_empty())
        .map(unquote_path)
        .collect()
}

/// Text after the status code; exactly one TAB separates it from the path,
/// since the path itself may start with spaces
fn path_field(rest: &str) -> &str {
    rest.strip_prefix('\t').unwrap_or_else(|| rest.trim_start())
}

/// Undo git's C-style quoting of a path
///
/// Even with `core.quotepath=false`, git quotes paths containing `"`, `\\` or
/// control characters: `"a\"b.txt"`. Octal escapes are raw bytes and are decoded
/// as UTF-8. Unquoted paths are returned unchanged.
pub fn unquote_path(field: &str) -> String {
    let Some(inner) = field
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return field.to_string();
    };

    let raw = inner.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let byte = raw[i];
        i += 1;
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }

        let Some(&escape) = raw.get(i) else {
            bytes.push(byte);
            break;
        };
        i += 1;

        let decoded = match escape {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'0'..=b'3' => match raw.get(i..i + 2) {
                Some(&[d1, d2]) if is_octal(d1) && is_octal(d2) => {
                    i += 2;
                    (escape - b'0') * 64 + (d1 - b'0') * 8 + (d2 - b'0')
                }
                _ => escape,
            },
            other => other,
        };
        bytes.push(decoded);
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

fn is_octal(byte: u8) -> bool {
    (b'0'..=b'7').contains(&byte)
}

/// Represents one line of the stash listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    pub index: usize,
    pub short_hash: String,
    pub date: DateTime<FixedOffset>,
    pub subject: String,
    pub description: String,
    pub branch: Option<String>,
}

/// Full identity of a stash commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashDetails {
    pub hash: String,
    pub parent_hashes: Vec<String>,
    pub note: Option<String>,
}

/// Represents one changed path reported for a stash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub kind: FileKind,
    pub path: String,
    pub old_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stash_list_scenario() {
        let output = "2024-01-01 10:00:00 +0000 abc1234 On main: wip";
        let stashes = parse_stash_list(output);

        assert_eq!(stashes.len(), 1);
        assert_eq!(stashes[0].index, 0);
        assert_eq!(stashes[0].short_hash, "abc1234");
        assert_eq!(stashes[0].branch.as_deref(), Some("main"));
        assert_eq!(stashes[0].description, "wip");
        assert_eq!(stashes[0].subject, "On main: wip");
    }

    #[test]
    fn test_parse_stash_list_indices_follow_lines() {
        let output = "2024-01-03 09:00:00 +0100 aaaaaaa WIP on dev: one\n\
                      2024-01-02 09:00:00 +0100 bbbbbbb On dev: two\n\
                      2024-01-01 09:00:00 +0100 ccccccc three";
        let stashes = parse_stash_list(output);

        assert_eq!(stashes.len(), 3);
        for (position, stash) in stashes.iter().enumerate() {
            assert_eq!(stash.index, position);
        }
        assert_eq!(stashes[2].branch, None);
        assert_eq!(stashes[2].description, "three");
    }

    #[test]
    fn test_subject_with_delimiters() {
        let output = "2024-01-01 10:00:00 +0000 abc1234 On main: fix {stash@{1}}: a b  c";
        let stashes = parse_stash_list(output);

        assert_eq!(stashes[0].description, "fix {stash@{1}}: a b  c");
        assert_eq!(stashes[0].branch.as_deref(), Some("main"));
    }

    #[test]
    fn test_parse_date_with_offset() {
        let stashes = parse_stash_list("2024-06-30 23:15:42 -0700 1234abcd On x: y");
        assert_eq!(stashes[0].date.to_rfc3339(), "2024-06-30T23:15:42-07:00");
    }

    #[test]
    fn test_malformed_line_keeps_position() {
        let output = "garbage\n2024-01-01 10:00:00 +0000 abc1234 On main: wip";
        let stashes = parse_stash_list(output);

        assert_eq!(stashes.len(), 1);
        assert_eq!(stashes[0].index, 1);
    }

    #[test]
    fn test_split_subject() {
        assert_eq!(
            split_subject("On feature-x: fix thing"),
            ("fix thing".to_string(), Some("feature-x".to_string()))
        );
        assert_eq!(
            split_subject("WIP on main: 1a2b3c4 initial"),
            ("1a2b3c4 initial".to_string(), Some("main".to_string()))
        );
        assert_eq!(split_subject("plain message"), ("plain message".to_string(), None));
        assert_eq!(split_subject("On no colon"), ("On no colon".to_string(), None));
    }

    #[test]
    fn test_parse_stash_details() {
        let output = concat!(
            "aaa111\x1fbase1 idx1 untracked1\x1freview later\n\x1e\n",
            "bbb222\x1fbase2 idx2\x1f\x1e\n",
        );
        let details = parse_stash_details(output);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].hash, "aaa111");
        assert_eq!(details[0].parent_hashes, vec!["base1", "idx1", "untracked1"]);
        assert_eq!(details[0].note.as_deref(), Some("review later"));
        assert_eq!(details[1].parent_hashes.len(), 2);
        assert_eq!(details[1].note, None);
    }

    #[test]
    fn test_parse_name_status_rename_scenario() {
        let files = parse_name_status("R100  src/old.ts\tsrc/new.ts");

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].kind, FileKind::Renamed);
        assert_eq!(files[0].path, "src/new.ts");
        assert_eq!(files[0].old_path.as_deref(), Some("src/old.ts"));
    }

    #[test]
    fn test_parse_name_status_git_tab_layout() {
        let output = concat!(
            "M\tREADME.md\nA\tsrc/new file.rs\nD\tgone.txt\n",
            "R087\told/path.txt\tnew/path.txt",
        );
        let files = parse_name_status(output);

        assert_eq!(files.len(), 4);
        assert_eq!(files[0].kind, FileKind::Modified);
        assert_eq!(files[1].path, "src/new file.rs");
        assert_eq!(files[2].kind, FileKind::Deleted);
        assert_eq!(files[3].old_path.as_deref(), Some("old/path.txt"));
        assert_eq!(files[3].path, "new/path.txt");
    }

    #[test]
    fn test_unknown_status_ignored() {
        let files = parse_name_status("T\tlink\nC75\ta\tb\nX\tweird\nM\tkept.rs");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "kept.rs");
    }

    #[test]
    fn test_parse_tree_listing() {
        let files = parse_tree_listing("b.txt\na/c.txt\n\n");
        assert_eq!(files, vec!["b.txt", "a/c.txt"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_stash_list("").is_empty());
        assert!(parse_stash_details("").is_empty());
        assert!(parse_name_status("").is_empty());
        assert!(parse_tree_listing("").is_empty());
    }

    #[test]
    fn test_name_status_keeps_leading_spaces_in_path() {
        let files = parse_name_status("M\t lead.txt\nR100\t  old.txt\t new.txt\n");

        assert_eq!(files[0].path, " lead.txt");
        assert_eq!(files[1].old_path.as_deref(), Some("  old.txt"));
        assert_eq!(files[1].path, " new.txt");
    }

    #[test]
    fn test_name_status_unquotes_paths() {
        let output = "M\t\"a\\\"b.txt\"\nR100\t\"tab\\there\"\t\"back\\\\slash\"\n";
        let files = parse_name_status(output);

        assert_eq!(files[0].path, "a\"b.txt");
        assert_eq!(files[1].old_path.as_deref(), Some("tab\there"));
        assert_eq!(files[1].path, "back\\slash");
    }

    #[test]
    fn test_tree_listing_unquotes_paths() {
        let files = parse_tree_listing("plain.txt\n\"line\\nbreak\"\n\"caf\\303\\251.txt\"\n");
        assert_eq!(files, vec!["plain.txt", "line\nbreak", "café.txt"]);
    }

    #[test]
    fn test_unquote_path_edge_cases() {
        assert_eq!(unquote_path("plain"), "plain");
        assert_eq!(unquote_path("\"unterminated"), "\"unterminated");
        assert_eq!(unquote_path("\"\\a\\b\\f\\v\\r\""), "\x07\x08\x0c\x0b\r");
        // Not a full octal escape: kept as the digit
        assert_eq!(unquote_path("\"x\\19\""), "x19");
    }
}
