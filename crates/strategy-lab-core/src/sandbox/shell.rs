//! The small shell grammar the sandbox can simulate.
//!
//! Commands outside this grammar (or using pipes, redirection or chaining)
//! parse to `None` and fall through to trace replay.

use super::world::GitCommand;

/// A shell command the sandbox knows how to simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Pwd,
    List(Option<String>),
    Cat(String),
    Echo(String),
    Git(GitCommand),
}

const UNSUPPORTED: &[&str] = &["|", ">", "<", "&&", "||", ";", "`", "$("];

/// Split on whitespace, honoring single and double quotes.
///
/// Backslashes are literal so Windows paths survive untouched. Returns `None`
/// on an unterminated quote.
fn tokenize(command: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for ch in command.chars() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => current.push(ch),
            None if ch == '"' || ch == '\'' => {
                quote = Some(ch);
                in_token = true;
            }
            None if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            None => {
                current.push(ch);
                in_token = true;
            }
        }
    }
    if quote.is_some() {
        return None;
    }
    if in_token {
        tokens.push(current);
    }
    Some(tokens)
}

fn parse_git(args: &[String]) -> Option<GitCommand> {
    let (sub, rest) = args.split_first()?;
    match sub.as_str() {
        "status" => Some(GitCommand::Status),
        "push" => Some(GitCommand::Push),
        "add" => {
            if rest.is_empty() {
                return None;
            }
            Some(GitCommand::Add(rest.to_vec()))
        }
        "commit" => {
            let mut message = None;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "-m" | "--message" => message = Some(iter.next()?.clone()),
                    other => {
                        if let Some(inline) = other.strip_prefix("--message=") {
                            message = Some(inline.to_string());
                        } else {
                            return None;
                        }
                    }
                }
            }
            Some(GitCommand::Commit { message })
        }
        "diff" => {
            let mut cached = false;
            for arg in rest {
                match arg.as_str() {
                    "--cached" | "--staged" => cached = true,
                    _ => return None,
                }
            }
            Some(GitCommand::Diff { cached })
        }
        "log" => {
            let mut max_count = None;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                let count = match arg.as_str() {
                    "-n" | "--max-count" => iter.next()?.parse().ok()?,
                    "--oneline" => continue,
                    other => {
                        let inline = other
                            .strip_prefix("--max-count=")
                            .or_else(|| other.strip_prefix("-n"))
                            .or_else(|| other.strip_prefix('-'))?;
                        inline.parse().ok()?
                    }
                };
                max_count = Some(count);
            }
            Some(GitCommand::Log { max_count })
        }
        _ => None,
    }
}

/// Parse `command` into a simulated shell command.
pub fn parse(command: &str) -> Option<ShellCommand> {
    if UNSUPPORTED.iter().any(|op| command.contains(op)) {
        return None;
    }
    let tokens = tokenize(command)?;
    let (program, args) = tokens.split_first()?;
    match (program.as_str(), args) {
        ("pwd", []) => Some(ShellCommand::Pwd),
        ("ls" | "dir", []) => Some(ShellCommand::List(None)),
        ("ls" | "dir", [target]) => Some(ShellCommand::List(Some(target.clone()))),
        ("cat" | "type", [target]) => Some(ShellCommand::Cat(target.clone())),
        ("echo", words) => Some(ShellCommand::Echo(words.join(" "))),
        ("git", rest) => parse_git(rest).map(ShellCommand::Git),
        _ => None,
    }
}
