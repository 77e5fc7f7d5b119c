//! The in-memory file/git world one replay session operates on.
//!
//! Files live in a single normalized namespace (see [`super::path`]). The git
//! model tracks `head` (last committed content per path), a `staged` path set
//! and a commit log. Every operation reports failures as `ToolResult::error`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::path;
use super::result::ToolResult;

/// One synthetic commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    /// Sequential synthetic id: the commit ordinal as 7 hex digits.
    pub hash: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Working tree vs. head, with staged paths reported separately.
///
/// A path appears in at most one of the lists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GitStatus {
    pub staged: Vec<String>,
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.created.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Created,
    Modified,
    Deleted,
}

/// A git operation, whether it came from a `git_*` tool or a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCommand {
    Status,
    Add(Vec<String>),
    Commit { message: Option<String> },
    Diff { cached: bool },
    Log { max_count: Option<usize> },
    Push,
}

/// Session-scoped virtual filesystem plus git model.
#[derive(Debug, Clone)]
pub struct VirtualWorld {
    cwd: String,
    raw_cwd: String,
    /// Keys that entered the world through a drive-letter path.
    drive_keys: BTreeSet<String>,
    files: BTreeMap<String, String>,
    directories: BTreeSet<String>,
    head: BTreeMap<String, String>,
    staged: BTreeSet<String>,
    commits: Vec<Commit>,
}

impl VirtualWorld {
    pub fn new(cwd: &str) -> Self {
        Self {
            cwd: path::normalize(cwd, "/"),
            raw_cwd: cwd.to_string(),
            drive_keys: BTreeSet::new(),
            files: BTreeMap::new(),
            directories: BTreeSet::new(),
            head: BTreeMap::new(),
            staged: BTreeSet::new(),
            commits: Vec::new(),
        }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    // -----------------------------------------------------------------------
    // Path resolution
    // -----------------------------------------------------------------------

    fn exists(&self, key: &str) -> bool {
        self.files.contains_key(key)
            || self.head.contains_key(key)
            || self.directories.contains(key)
            || self.files.keys().any(|p| path::is_under(p, key))
            || self.directories.iter().any(|d| path::is_under(d, key))
    }

    /// Map a raw path to the key it names in this world.
    ///
    /// An existing key wins. Otherwise a drive path resolves to an existing
    /// drive-less path with the same remainder, and a drive-less path to a
    /// key recorded from a drive path, so `C:\work\a.txt` and `/work/a.txt`
    /// address the same entry. Plain posix directories such as `/a` are never
    /// taken for drives.
    pub fn resolve(&self, raw: &str) -> String {
        self.locate(raw).key
    }

    fn locate(&self, raw: &str) -> path::NormalizedPath {
        let target = path::normalize_path(raw, &self.raw_cwd);
        if self.exists(&target.key) {
            return target;
        }
        if target.from_drive {
            return match path::strip_drive(&target.key) {
                Some(stripped) if self.exists(&stripped) => path::NormalizedPath {
                    key: stripped,
                    from_drive: false,
                },
                _ => target,
            };
        }
        let key = &target.key;
        let alias = self
            .drive_keys
            .iter()
            .filter(|known| self.exists(known))
            .filter_map(|known| {
                let stripped = path::strip_drive(known)?;
                if &stripped == key {
                    return Some(known.clone());
                }
                // `key` may name a directory that only exists under a drive.
                if path::is_under(&stripped, key) {
                    let drive_len = known.len() - stripped.len();
                    return Some(format!("{}{}", &known[..drive_len], key));
                }
                None
            })
            .min();
        match alias {
            Some(key) => path::NormalizedPath {
                key,
                from_drive: true,
            },
            None => target,
        }
    }

    /// Resolve `raw` for a write, remembering drive-derived keys.
    fn claim(&mut self, raw: &str) -> String {
        let located = self.locate(raw);
        if located.from_drive {
            self.drive_keys.insert(located.key.clone());
        }
        located.key
    }

    // -----------------------------------------------------------------------
    // Filesystem
    // -----------------------------------------------------------------------

    pub fn read_file(&self, raw: &str) -> ToolResult {
        let key = self.resolve(raw);
        match self.files.get(&key) {
            Some(content) => ToolResult::text(content.clone()),
            None if self.is_directory(&key) => {
                ToolResult::error(format!("EISDIR: {raw} is a directory"))
            }
            None => ToolResult::error(format!("ENOENT: no such file: {raw}")),
        }
    }

    pub fn write_file(&mut self, raw: &str, content: &str) -> ToolResult {
        let key = self.claim(raw);
        if key == "/" || self.is_directory(&key) {
            return ToolResult::error(format!("EISDIR: {raw} is a directory"));
        }
        let bytes = content.len();
        self.files.insert(key.clone(), content.to_string());
        ToolResult::text(format!("wrote {bytes} bytes to {key}"))
    }

    pub fn create_directory(&mut self, raw: &str) -> ToolResult {
        let key = self.claim(raw);
        if self.files.contains_key(&key) {
            return ToolResult::error(format!("EEXIST: {raw} is a file"));
        }
        if key != "/" {
            self.directories.insert(key.clone());
        }
        ToolResult::text(format!("created directory {key}"))
    }

    pub fn delete_file(&mut self, raw: &str) -> ToolResult {
        let key = self.resolve(raw);
        match self.files.remove(&key) {
            Some(_) => ToolResult::text(format!("deleted {key}")),
            None => ToolResult::error(format!("ENOENT: no such file: {raw}")),
        }
    }

    pub fn move_file(&mut self, raw_from: &str, raw_to: &str) -> ToolResult {
        let from = self.resolve(raw_from);
        let to = self.claim(raw_to);
        if self.is_directory(&to) {
            return ToolResult::error(format!("EISDIR: {raw_to} is a directory"));
        }
        match self.files.remove(&from) {
            Some(content) => {
                self.files.insert(to.clone(), content);
                ToolResult::text(format!("moved {from} to {to}"))
            }
            None => ToolResult::error(format!("ENOENT: no such file: {raw_from}")),
        }
    }

    fn is_directory(&self, key: &str) -> bool {
        key == "/"
            || self.directories.contains(key)
            || self.files.keys().any(|p| path::is_under(p, key))
            || self.directories.iter().any(|d| path::is_under(d, key))
    }

    /// Immediate children of a directory as `(name, is_dir)`, sorted by name.
    ///
    /// A name with anything nested below it is a directory even if a file of
    /// the same name was also recorded.
    pub fn children(&self, dir: &str) -> BTreeMap<String, bool> {
        let mut entries: BTreeMap<String, bool> = BTreeMap::new();
        let known = self
            .files
            .keys()
            .map(|p| (p, false))
            .chain(self.directories.iter().map(|d| (d, true)));
        for (known_path, explicit_dir) in known {
            if !path::is_under(known_path, dir) {
                continue;
            }
            let rest = if dir == "/" {
                &known_path[1..]
            } else {
                &known_path[dir.len() + 1..]
            };
            let (name, nested) = match rest.split_once('/') {
                Some((name, _)) => (name, true),
                None => (rest, explicit_dir),
            };
            let entry = entries.entry(name.to_string()).or_insert(false);
            *entry |= nested;
        }
        entries
    }

    pub fn list_directory(&self, raw: &str) -> ToolResult {
        let key = self.resolve(raw);
        if self.files.contains_key(&key) && !self.is_directory(&key) {
            return ToolResult::error(format!("ENOTDIR: {raw} is not a directory"));
        }
        if !self.is_directory(&key) {
            return ToolResult::error(format!("ENOENT: no such directory: {raw}"));
        }
        let lines: Vec<String> = self
            .children(&key)
            .into_iter()
            .map(|(name, is_dir)| {
                if is_dir {
                    format!("[DIR] {name}")
                } else {
                    format!("[FILE] {name}")
                }
            })
            .collect();
        ToolResult::text(lines.join("\n"))
    }

    // -----------------------------------------------------------------------
    // Git
    // -----------------------------------------------------------------------

    fn change_of(&self, key: &str) -> Option<Change> {
        match (self.files.get(key), self.head.get(key)) {
            (Some(_), None) => Some(Change::Created),
            (Some(now), Some(then)) if now != then => Some(Change::Modified),
            (None, Some(_)) => Some(Change::Deleted),
            _ => None,
        }
    }

    /// Every path that differs from head, staged or not.
    fn pending(&self) -> BTreeMap<String, Change> {
        self.files
            .keys()
            .chain(self.head.keys())
            .filter_map(|k| self.change_of(k).map(|c| (k.clone(), c)))
            .collect()
    }

    /// Staged paths that still differ from head.
    fn effective_staged(&self) -> Vec<String> {
        self.staged
            .iter()
            .filter(|k| self.change_of(k).is_some())
            .cloned()
            .collect()
    }

    pub fn status(&self) -> GitStatus {
        let mut status = GitStatus {
            staged: self.effective_staged(),
            ..GitStatus::default()
        };
        for (key, change) in self.pending() {
            if self.staged.contains(&key) {
                continue;
            }
            match change {
                Change::Created => status.created.push(key),
                Change::Modified => status.modified.push(key),
                Change::Deleted => status.deleted.push(key),
            }
        }
        status
    }

    /// Stage pending changes. `.` stages everything; other specs stage the
    /// changes at or below the named path.
    pub fn add(&mut self, specs: &[String]) -> ToolResult {
        if specs.is_empty() {
            return ToolResult::error("Nothing specified, nothing added.");
        }
        let pending = self.pending();
        let mut newly_staged = Vec::new();
        for spec in specs {
            let matched: Vec<String> = if spec.trim() == "." || spec.trim() == "-A" {
                pending.keys().cloned().collect()
            } else {
                let key = self.resolve(spec);
                let matched: Vec<String> = pending
                    .keys()
                    .filter(|p| path::is_within(p, &key))
                    .cloned()
                    .collect();
                if matched.is_empty() && !self.exists(&key) {
                    return ToolResult::error(format!(
                        "fatal: pathspec '{spec}' did not match any files"
                    ));
                }
                matched
            };
            for key in matched {
                if self.staged.insert(key.clone()) {
                    newly_staged.push(key);
                }
            }
        }
        ToolResult::text(format!("staged {} path(s)", newly_staged.len()))
    }

    pub fn commit(&mut self, message: Option<&str>) -> ToolResult {
        let message = message.map(str::trim).unwrap_or("");
        if message.is_empty() {
            return ToolResult::error("Aborting commit due to empty commit message.");
        }
        let staged = self.effective_staged();
        if staged.is_empty() {
            return ToolResult::error("nothing to commit, working tree has no staged changes");
        }
        for key in &staged {
            match self.files.get(key) {
                Some(content) => {
                    self.head.insert(key.clone(), content.clone());
                }
                None => {
                    self.head.remove(key);
                }
            }
        }
        self.staged.clear();
        let hash = format!("{:07x}", self.commits.len() + 1);
        self.commits.push(Commit {
            hash: hash.clone(),
            message: message.to_string(),
            created_at: Utc::now(),
        });
        ToolResult::text(format!(
            "[{hash}] {message}\n {} file(s) changed",
            staged.len()
        ))
    }

    /// Changed paths as opaque markers; content is never diffed.
    pub fn diff(&self, cached: bool) -> ToolResult {
        let paths: Vec<String> = if cached {
            self.effective_staged()
        } else {
            self.pending()
                .into_keys()
                .filter(|k| !self.staged.contains(k))
                .collect()
        };
        let markers: Vec<String> = paths
            .iter()
            .map(|p| {
                let p = path::display(p);
                format!("diff --git a/{p} b/{p}")
            })
            .collect();
        ToolResult::text(markers.join("\n"))
    }

    pub fn log(&self, max_count: Option<usize>) -> ToolResult {
        let limit = max_count.unwrap_or(usize::MAX);
        let lines: Vec<String> = self
            .commits
            .iter()
            .rev()
            .take(limit)
            .map(|c| format!("{} {}", c.hash, c.message))
            .collect();
        ToolResult::text(lines.join("\n"))
    }

    pub fn run_git(&mut self, command: &GitCommand) -> ToolResult {
        match command {
            GitCommand::Status => match serde_json::to_string(&self.status()) {
                Ok(json) => ToolResult::text(json),
                Err(e) => ToolResult::error(format!("failed to render status: {e}")),
            },
            GitCommand::Add(specs) => self.add(specs),
            GitCommand::Commit { message } => self.commit(message.as_deref()),
            GitCommand::Diff { cached } => self.diff(*cached),
            GitCommand::Log { max_count } => self.log(*max_count),
            GitCommand::Push => ToolResult::text(format!(
                "pushed {} commit(s) (simulated)",
                self.commits.len()
            )),
        }
    }
}
