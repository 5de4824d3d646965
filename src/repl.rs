//! The interactive shell: line editing, prompt, completion, piping.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};
use std::rc::Rc;

use anyhow::Result;
use rustyline::Editor;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use tracing::debug;

use crate::commands::{self, Command};
use crate::nav;
use crate::session::Session;
use crate::style::{blue, red};

const COMMAND_NAMES: &[&str] = &[
    "use", "cd", "ls", "exec", "rootexec", "nsenter", "ps", "tail", "events", "info", "delete",
    "help", "clear", "exit", "quit",
];

/// Interactive REPL over a shared session.
pub struct Repl {
    editor: Editor<ShellHelper, FileHistory>,
    session: Rc<RefCell<Session>>,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(session: Session) -> Result<Self> {
        let session = Rc::new(RefCell::new(session));
        let mut editor = Editor::new()?;
        editor.set_helper(Some(ShellHelper {
            session: Rc::clone(&session),
        }));

        let history_path = kubesh_config::history_path();
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        Ok(Self {
            editor,
            session,
            history_path,
        })
    }

    /// Run the main loop until `exit` or Ctrl-D.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = format_prompt(&self.session.borrow());
            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);
                    if self.dispatch(line) {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    println!();
                    println!("Bye! Keep navigating!");
                    break;
                }
                Err(e) => {
                    eprintln!("{}", red(&format!("error: {e}")));
                    break;
                }
            }
        }
        self.save_history();
        Ok(())
    }

    /// Execute one line; returns true when the shell should exit.
    fn dispatch(&mut self, line: &str) -> bool {
        let (own_part, pipeline) = if line.starts_with('!') {
            // The whole line goes to the local shell, pipes included.
            (line.to_string(), None)
        } else {
            split_pipe(line)
        };

        let cmd = match commands::parse(&own_part) {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("{}", red(&e.to_string()));
                return false;
            }
        };
        if cmd == Command::Quit {
            println!("Bye! Keep navigating!");
            return true;
        }

        let result = match pipeline {
            Some(pipeline) => self.run_piped(&cmd, &pipeline),
            None => {
                let mut stdout = std::io::stdout();
                let res =
                    commands::execute(&cmd, &mut self.session.borrow_mut(), &mut stdout);
                let _ = stdout.flush();
                res.map_err(anyhow::Error::from)
            }
        };
        if let Err(e) = result {
            eprintln!("{}", red(&e.to_string()));
        }
        false
    }

    /// Stream a command's output through a local shell pipeline.
    fn run_piped(&mut self, cmd: &Command, pipeline: &str) -> Result<()> {
        debug!("piping into: {pipeline}");
        let mut child = ProcessCommand::new("sh")
            .arg("-c")
            .arg(pipeline)
            .stdin(Stdio::piped())
            .spawn()?;
        let result = match child.stdin.take() {
            Some(mut stdin) => {
                commands::execute(cmd, &mut self.session.borrow_mut(), &mut stdin)
            }
            None => Ok(()),
        };
        let status = child.wait()?;
        result?;
        if !status.success() {
            anyhow::bail!("pipeline exited with code {}", status.code().unwrap_or(-1));
        }
        Ok(())
    }

    fn save_history(&mut self) {
        if let Some(path) = &self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }
    }
}

/// `cluster:/path (layer)$ `, or a NONE marker before `use`.
pub fn format_prompt(session: &Session) -> String {
    let layer = session.path.layer().name();
    if session.path.is_root() {
        return format!("NONE ({layer}) $ ");
    }
    let cluster = red(session.path.cluster().unwrap_or_default());
    let path = blue(&session.path.display_path());
    format!("{cluster}:{path} ({layer})$ ")
}

/// Split a line at the first unquoted `|` into the shell's own command and
/// the local pipeline it feeds.
pub fn split_pipe(line: &str) -> (String, Option<String>) {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '\'' | '"' => quote = Some(c),
                '|' => {
                    let own = line[..i].trim().to_string();
                    let rest = line[i + 1..].trim().to_string();
                    return (own, Some(rest));
                }
                _ => {}
            },
        }
    }
    (line.trim().to_string(), None)
}

/// Completes command names and, for `cd`/`ls`, path arguments with live
/// lookups against the cluster.
struct ShellHelper {
    session: Rc<RefCell<Session>>,
}

impl ShellHelper {
    fn complete_path(&self, text: &str) -> Vec<String> {
        let session = self.session.borrow();
        let (base, partial) = match text.rsplit_once('/') {
            Some((base, partial)) => (base, partial),
            None => ("", text),
        };
        // Re-anchor absolute patterns whose base was consumed by the split.
        let base_pattern = if base.is_empty() && text.starts_with('/') {
            "/"
        } else {
            base
        };
        let Ok(resolved) = nav::resolve(&session, &session.path, base_pattern) else {
            return Vec::new();
        };
        let Some(anchor) = resolved.first() else {
            return Vec::new();
        };
        let Ok(children) = session.children(anchor) else {
            return Vec::new();
        };
        children
            .into_iter()
            .filter(|c| c.starts_with(partial))
            .map(|c| {
                if base.is_empty() && !text.starts_with('/') {
                    c
                } else {
                    format!("{base}/{c}")
                }
            })
            .collect()
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let before = &line[..pos];
        let word_start = before
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &before[word_start..];

        let candidates: Vec<String> = if word_start == 0 {
            COMMAND_NAMES
                .iter()
                .filter(|c| c.starts_with(word))
                .map(|c| c.to_string())
                .collect()
        } else {
            let command = before.split_whitespace().next().unwrap_or("");
            match command {
                "cd" | "ls" => self.complete_path(word),
                _ => Vec::new(),
            }
        };

        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: c.clone(),
                replacement: c,
            })
            .collect();
        Ok((word_start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl rustyline::Helper for ShellHelper {}
