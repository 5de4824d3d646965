//! Path resolution: walking relative and absolute patterns, with glob
//! expansion against live lookups.

use kubesh_types::{KubePath, Result};
use regex::Regex;

use crate::session::Session;

/// Whether a segment contains glob metacharacters.
pub fn has_magic(segment: &str) -> bool {
    segment.contains(['*', '?', '['])
}

/// Shell-style glob match of one path segment (`*`, `?`, `[...]`).
pub fn glob_match(pattern: &str, name: &str) -> bool {
    match glob_regex(pattern) {
        Some(re) => re.is_match(name),
        None => pattern == name,
    }
}

fn glob_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    if c == '\\' {
                        class.push('\\');
                    }
                    class.push(c);
                }
                if !closed {
                    return None;
                }
                re.push('[');
                re.push_str(&class);
                re.push(']');
            }
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

/// Resolve `pattern` against `base`, returning every matching path.
///
/// Empty segments are skipped, `..` pops (stopping at the root), a
/// leading `/` restarts at the cluster, glob segments expand against the
/// children of each candidate, and literal segments must name an existing
/// child. An empty result is not an error here; `cd` treats it as one.
pub fn resolve(session: &Session, base: &KubePath, pattern: &str) -> Result<Vec<KubePath>> {
    let mut candidates = vec![base.clone()];
    let mut rest = pattern;
    if let Some(stripped) = pattern.strip_prefix('/') {
        let mut cluster_root = base.clone();
        cluster_root.reset();
        candidates = vec![cluster_root];
        rest = stripped;
    }

    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            for path in &mut candidates {
                if !path.is_root() {
                    path.pop()?;
                }
            }
            candidates.dedup();
            continue;
        }
        let mut next = Vec::new();
        for path in &candidates {
            for child in session.children(path)? {
                let matched = if has_magic(segment) {
                    glob_match(segment, &child)
                } else {
                    segment == child
                };
                if matched {
                    let mut deeper = path.clone();
                    deeper.push(&child)?;
                    next.push(deeper);
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }
    Ok(candidates)
}

/// Render a resolved path relative to `base` (as `ls` prints it); a path
/// at or above the base falls back to its absolute display form.
pub fn display_relative(base: &KubePath, path: &KubePath) -> String {
    let base_len = base.fragments().len();
    let frags = path.fragments();
    if frags.len() > base_len && frags[..base_len] == *base.fragments() {
        frags[base_len..].join("/")
    } else {
        path.display_path()
    }
}
