//! Path normalization into the sandbox's single posix namespace.
//!
//! Absolute posix paths, Windows paths and relative paths all land in one
//! namespace: backslashes become slashes, `.`/`..`/empty segments resolve,
//! relative paths join the session cwd, and a drive letter `C:` becomes the
//! synthetic top segment `/c`.

/// Split a leading `X:` drive designator off `path`.
fn split_drive(path: &str) -> (Option<char>, &str) {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        (Some(char::from(bytes[0]).to_ascii_lowercase()), &path[2..])
    } else {
        (None, path)
    }
}

fn push_segments(stack: &mut Vec<String>, path: &str, floor: usize) {
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if stack.len() > floor {
                    stack.pop();
                }
            }
            other => stack.push(other.to_string()),
        }
    }
}

/// A normalized key and whether its top segment came from a drive letter.
///
/// `C:\work` and `/c/work` share the key `/c/work`; only the first has
/// `from_drive` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    pub key: String,
    pub from_drive: bool,
}

/// Normalize `raw` relative to `cwd`, keeping track of drive origin.
///
/// A relative path inherits the drive origin of `cwd`, and `..` never climbs
/// above a drive segment.
pub fn normalize_path(raw: &str, cwd: &str) -> NormalizedPath {
    let unified = raw.trim().replace('\\', "/");
    let (drive, rest) = split_drive(&unified);

    let mut stack: Vec<String> = Vec::new();
    let (floor, from_drive) = match drive {
        Some(letter) => {
            stack.push(letter.to_string());
            (1, true)
        }
        None if rest.starts_with('/') => (0, false),
        None => {
            let base = normalize_path(cwd, "/");
            push_segments(&mut stack, &base.key, 0);
            (usize::from(base.from_drive), base.from_drive)
        }
    };
    push_segments(&mut stack, rest, floor);

    NormalizedPath {
        key: format!("/{}", stack.join("/")),
        from_drive,
    }
}

/// Normalize `raw` relative to `cwd` into an absolute posix key.
pub fn normalize(raw: &str, cwd: &str) -> String {
    normalize_path(raw, cwd).key
}

/// `/c/work/a.txt` → `/work/a.txt`: the path with a drive segment removed.
///
/// Only meaningful for keys known to be drive-derived; a posix `/a/...` has
/// the same shape. Returns `None` when the first segment cannot be a drive
/// letter or nothing would remain after removing it.
pub fn strip_drive(key: &str) -> Option<String> {
    let trimmed = key.strip_prefix('/')?;
    let (first, rest) = trimmed.split_once('/')?;
    let is_drive = first.len() == 1 && first.chars().all(|c| c.is_ascii_lowercase());
    if is_drive && !rest.is_empty() {
        Some(format!("/{rest}"))
    } else {
        None
    }
}

/// Whether `path` lies strictly below directory `dir`.
pub fn is_under(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return path != "/";
    }
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

/// `path` equals `dir` or lies below it.
pub fn is_within(path: &str, dir: &str) -> bool {
    path == dir || is_under(path, dir)
}

/// Path without its leading slash, as git prints it.
pub fn display(key: &str) -> &str {
    key.strip_prefix('/').unwrap_or(key)
}
