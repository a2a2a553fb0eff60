//! Pure path arithmetic: separator normalization, absolute and relative paths
//!
//! Paths are handled as strings so that both `/`-rooted and drive-letter-rooted
//! (`C:\`) forms resolve the same way on every host. Nothing here touches the
//! filesystem; only [`absolute`] and [`relative`] read the working directory.

use crate::error::{PackagerError, Result};

/// Characters recognized as path separators
pub const SEPARATORS: [char; 2] = ['/', '\\'];

/// Replace every run of separator characters with a single `separator`
pub fn normalize(path: &str, separator: char) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_was_separator = false;

    for c in path.chars() {
        if SEPARATORS.contains(&c) {
            if !previous_was_separator {
                out.push(separator);
            }
            previous_was_separator = true;
        } else {
            out.push(c);
            previous_was_separator = false;
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Slash,
    Drive(char),
}

/// A fully resolved path: a root plus `.`/`..`-free segments
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    root: Root,
    segments: Vec<String>,
}

impl Resolved {
    fn render(&self, separator: char) -> String {
        let mut out = match self.root {
            Root::Slash => String::new(),
            Root::Drive(letter) => format!("{}:", letter),
        };
        out.push(separator);
        out.push_str(&self.segments.join(&separator.to_string()));
        out
    }
}

/// Split off the root of a path, if it has one
fn split_root(path: &str) -> Option<(Root, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let letter = (bytes[0] as char).to_ascii_uppercase();
        return Some((Root::Drive(letter), &path[2..]));
    }
    if path.starts_with(&SEPARATORS[..]) {
        return Some((Root::Slash, path));
    }
    None
}

fn push_segments(path: &str, original: &str, segments: &mut Vec<String>) -> Result<()> {
    for segment in path.split(&SEPARATORS[..]) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PackagerError::InvalidPath {
                        path: original.to_string(),
                        reason: "climbs above the filesystem root",
                    });
                }
            }
            other => segments.push(other.to_string()),
        }
    }
    Ok(())
}

fn resolve(path: &str, cwd: &str) -> Result<Resolved> {
    if path.contains('\0') {
        return Err(PackagerError::InvalidPath {
            path: path.escape_default().to_string(),
            reason: "contains a NUL byte",
        });
    }

    let mut segments = Vec::new();
    let root = match split_root(path) {
        Some((root, rest)) => {
            push_segments(rest, path, &mut segments)?;
            root
        }
        None => {
            let (root, rest) = split_root(cwd).ok_or_else(|| PackagerError::InvalidPath {
                path: cwd.to_string(),
                reason: "working directory is not absolute",
            })?;
            push_segments(rest, cwd, &mut segments)?;
            push_segments(path, path, &mut segments)?;
            root
        }
    };

    Ok(Resolved { root, segments })
}

fn current_dir() -> Result<String> {
    std::env::current_dir()
        .map(|dir| dir.to_string_lossy().into_owned())
        .map_err(|e| PackagerError::io(".", e))
}

/// Resolve `path` against `cwd`, collapsing `.` and `..` segments
pub fn absolute_from(path: &str, cwd: &str, separator: char) -> Result<String> {
    Ok(resolve(path, cwd)?.render(separator))
}

/// Resolve `path` against the process working directory
pub fn absolute(path: &str) -> Result<String> {
    absolute_from(path, &current_dir()?, std::path::MAIN_SEPARATOR)
}

/// Relative path from `from` to `to`, both resolved against `cwd`
///
/// When the two paths live under different roots (e.g. different drives)
/// there is no relative form and `to` is returned unchanged.
pub fn relative_from(from: &str, to: &str, cwd: &str, separator: char) -> Result<String> {
    let from_resolved = resolve(from, cwd)?;
    let to_resolved = resolve(to, cwd)?;

    if from_resolved.root != to_resolved.root {
        return Ok(to.to_string());
    }

    let common = from_resolved
        .segments
        .iter()
        .zip(&to_resolved.segments)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from_resolved.segments.len() - common];
    parts.extend(to_resolved.segments[common..].iter().map(String::as_str));

    Ok(parts.join(&separator.to_string()))
}

/// Relative path from `from` to `to`, resolved against the working directory
pub fn relative(from: &str, to: &str, separator: char) -> Result<String> {
    relative_from(from, to, &current_dir()?, separator)
}
