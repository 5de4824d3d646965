//! Error taxonomy shared by the kubesh crates.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command was issued at a layer it does not apply to.
    #[error("{command} can only be used at the {expected} level")]
    WrongLayer {
        command: &'static str,
        expected: &'static str,
    },

    /// A path entry did not resolve to an existing child.
    #[error("could not find {entry} in {layer} {parent}")]
    NotFound {
        entry: String,
        layer: &'static str,
        parent: String,
    },

    /// Navigation above the root of the hierarchy.
    #[error("cannot go back further than the root context")]
    AtRoot,

    /// An external process could not be spawned.
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// An external process exited with a non-zero status.
    #[error("{command} exited with code {code}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// `kubectl -o json` produced output we could not decode.
    #[error("error decoding json output of {command}: {source}")]
    JsonDecode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
