//! Minimal ANSI styling for the prompt and error output.

pub fn red(text: &str) -> String {
    format!("\x1b[1;31m{text}\x1b[0m")
}

pub fn blue(text: &str) -> String {
    format!("\x1b[1;34m{text}\x1b[0m")
}
