//! Test doubles for the subprocess seam.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Arc;

use kubesh_exec::{CommandSpec, Runner};
use kubesh_types::Result;

/// Records every spec it is asked to run and replies with canned output,
/// in order. Exit code and stdout per call; stderr mirrors stdout on
/// failure so error paths have something to show.
pub struct FakeRunner {
    calls: RefCell<Vec<Vec<String>>>,
    responses: RefCell<VecDeque<(i32, String)>>,
}

impl FakeRunner {
    pub fn with_outputs(responses: Vec<(i32, &str)>) -> Arc<Self> {
        Arc::new(Self {
            calls: RefCell::new(Vec::new()),
            responses: RefCell::new(
                responses
                    .into_iter()
                    .map(|(code, out)| (code, out.to_string()))
                    .collect(),
            ),
        })
    }

    /// Every command line executed so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    fn next_response(&self) -> (i32, String) {
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or((0, String::new()))
    }
}

impl Runner for FakeRunner {
    fn output(&self, spec: &CommandSpec) -> Result<Output> {
        self.calls.borrow_mut().push(spec.command_line());
        let (code, stdout) = self.next_response();
        let stderr = if code == 0 { String::new() } else { stdout.clone() };
        Ok(Output {
            status: ExitStatus::from_raw(code << 8),
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
        })
    }

    fn stream(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<i32> {
        self.calls.borrow_mut().push(spec.command_line());
        let (code, stdout) = self.next_response();
        if !stdout.is_empty() {
            sink.write_all(stdout.as_bytes())?;
        }
        Ok(code)
    }
}
