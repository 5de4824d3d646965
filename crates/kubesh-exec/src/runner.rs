//! The execution seam between command construction and the operating system.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use kubesh_types::{Error, Result};
use tracing::debug;

use crate::spec::CommandSpec;

/// Executes command specs. Production uses [`SystemRunner`]; tests record
/// the specs and return canned output instead.
pub trait Runner {
    /// Run to completion with captured stdout/stderr.
    fn output(&self, spec: &CommandSpec) -> Result<Output>;

    /// Stream stdout line by line into `sink`, returning the exit code.
    fn stream(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<i32>;
}

/// Runs specs through `std::process::Command`.
///
/// The interrupt flag is shared with the Ctrl-C handler: pressing Ctrl-C
/// during a streamed command kills the foreground child (it shares our
/// process group) and we report success, so the shell itself survives a
/// stopped `tail -f`.
pub struct SystemRunner {
    interrupt: Arc<AtomicBool>,
}

impl SystemRunner {
    pub fn new(interrupt: Arc<AtomicBool>) -> Self {
        Self { interrupt }
    }

    fn build(&self, spec: &CommandSpec) -> Command {
        let tokens = spec.command_line();
        // Remote specs and sudo both pass the KUBECONFIG=... token through
        // as-is (the remote shell resp. sudo interpret it); a plain local
        // command gets a real environment variable instead.
        if spec.host.is_none() && !spec.sudo {
            let mut cmd = Command::new(&spec.argv[0]);
            cmd.args(&spec.argv[1..]);
            if let Some(path) = &spec.kubeconfig {
                cmd.env("KUBECONFIG", path);
            }
            cmd
        } else {
            let mut cmd = Command::new(&tokens[0]);
            cmd.args(&tokens[1..]);
            cmd
        }
    }
}

impl Runner for SystemRunner {
    fn output(&self, spec: &CommandSpec) -> Result<Output> {
        debug!("running: {}", spec.display());
        self.build(spec).output().map_err(|e| Error::Spawn {
            command: spec.display(),
            source: e,
        })
    }

    fn stream(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<i32> {
        debug!("streaming: {}", spec.display());
        self.interrupt.store(false, Ordering::SeqCst);
        let mut child = self
            .build(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Spawn {
                command: spec.display(),
                source: e,
            })?;

        // The child always has a stdout handle here, we just piped it.
        if let Some(stdout) = child.stdout.take() {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                if self.interrupt.load(Ordering::SeqCst) {
                    let _ = child.kill();
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if writeln!(sink, "{line}").is_err() {
                    // Downstream pipe closed (e.g. `| head`); stop streaming.
                    let _ = child.kill();
                    break;
                }
            }
        }

        let status = child.wait()?;
        if self.interrupt.swap(false, Ordering::SeqCst) {
            // The operator asked for the stop, no reason to signal error.
            return Ok(0);
        }
        Ok(status.code().unwrap_or(-1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> SystemRunner {
        SystemRunner::new(Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_output_captures_stdout() {
        let spec = CommandSpec::local(["echo", "hello"]);
        let out = runner().output(&spec).unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }

    #[test]
    fn test_stream_writes_lines_and_reports_exit_code() {
        let spec = CommandSpec::local(["sh", "-c", "echo one; echo two; exit 3"]);
        let mut sink = Vec::new();
        let rc = runner().stream(&spec, &mut sink).unwrap();
        assert_eq!(rc, 3);
        assert_eq!(String::from_utf8_lossy(&sink), "one\ntwo\n");
    }

    #[test]
    fn test_interrupted_stream_kills_child_and_reports_success() {
        let flag = Arc::new(AtomicBool::new(false));
        let runner = SystemRunner::new(Arc::clone(&flag));
        // Stands in for the Ctrl-C handler: raise the flag while the
        // child is still producing output.
        let setter = std::thread::spawn({
            let flag = Arc::clone(&flag);
            move || {
                std::thread::sleep(std::time::Duration::from_millis(300));
                flag.store(true, Ordering::SeqCst);
            }
        });
        let spec = CommandSpec::local(["sh", "-c", "while true; do echo tick; sleep 0.1; done"]);
        let mut sink = Vec::new();
        let rc = runner.stream(&spec, &mut sink).unwrap();
        setter.join().unwrap();
        assert_eq!(rc, 0);
        assert!(!sink.is_empty());
        // The flag was consumed; the next stream starts clean.
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let spec = CommandSpec::local(["kubesh-no-such-binary"]);
        let err = runner().output(&spec).unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_local_kubeconfig_becomes_env_var() {
        let spec = CommandSpec::local(["sh", "-c", "printf %s \"$KUBECONFIG\""])
            .with_kubeconfig("/tmp/kube.config".to_string());
        let out = runner().output(&spec).unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout), "/tmp/kube.config");
    }
}
