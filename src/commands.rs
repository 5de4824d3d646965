//! Command parsing and execution for the REPL.

use std::io::Write;

use kubesh_exec::{docker_exec_root, docker_inspect_pid, docker_top, nsenter};
use kubesh_types::{Error, Layer, Result, ServiceDetail};

use crate::nav;
use crate::session::Session;

/// Default sort key for the event log.
const EVENT_SORT_KEY: &str = ".lastTimestamp";

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Select the cluster to operate on
    Use { cluster: String },
    /// Change layer of the hierarchy; None resets to the cluster level
    Cd { path: Option<String> },
    /// List entries at the current (or resolved) level
    Ls { pattern: Option<String> },
    /// Run a command inside the container
    Exec { cmdline: String },
    /// Run a command inside the container as root, via the node
    RootExec { cmdline: String },
    /// Run a command inside the container's namespaces on the node
    Nsenter { cmdline: String },
    /// Show processes running in the container
    Ps,
    /// Show the container's logs, optionally following
    Tail { follow: bool },
    /// Show the event log at cluster or namespace level
    Events { sort_by: Option<String> },
    /// Show service details (name and ports)
    Info,
    /// Delete the current object
    Delete,
    /// Run a local shell command
    Shell { cmdline: String },
    Help { topic: Option<String> },
    Clear,
    Quit,
    Unknown { input: String },
}

/// Parse one input line into a Command.
pub fn parse(input: &str) -> Result<Command> {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix('!') {
        return Ok(Command::Shell {
            cmdline: rest.trim().to_string(),
        });
    }

    let (cmd, rest) = match input.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (input, ""),
    };
    let arg = || {
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    };

    let parsed = match cmd {
        "" => Command::Unknown {
            input: String::new(),
        },
        "use" => {
            if rest.is_empty() || rest.contains(char::is_whitespace) {
                return Err(Error::Usage("usage: use <cluster>".into()));
            }
            Command::Use {
                cluster: rest.to_string(),
            }
        }
        "cd" => Command::Cd { path: arg() },
        "ls" => Command::Ls { pattern: arg() },
        "exec" => {
            if rest.is_empty() {
                return Err(Error::Usage("usage: exec <command>".into()));
            }
            Command::Exec {
                cmdline: rest.to_string(),
            }
        }
        "rootexec" => {
            if rest.is_empty() {
                return Err(Error::Usage("usage: rootexec <command>".into()));
            }
            Command::RootExec {
                cmdline: rest.to_string(),
            }
        }
        "nsenter" => {
            if rest.is_empty() {
                return Err(Error::Usage("usage: nsenter [FLAGS] <command>".into()));
            }
            Command::Nsenter {
                cmdline: rest.to_string(),
            }
        }
        "ps" => Command::Ps,
        // Anything other than -f is ignored, as tail always prints the log.
        "tail" => Command::Tail { follow: rest == "-f" },
        "events" | "eventlog" => Command::Events { sort_by: arg() },
        "info" => Command::Info,
        "delete" => Command::Delete,
        "help" | "?" => Command::Help { topic: arg() },
        "clear" => Command::Clear,
        "exit" | "quit" => Command::Quit,
        _ => Command::Unknown {
            input: input.to_string(),
        },
    };
    Ok(parsed)
}

/// Execute a command, writing its output to `out`.
pub fn execute(cmd: &Command, session: &mut Session, out: &mut dyn Write) -> Result<()> {
    match cmd {
        Command::Use { cluster } => {
            session.use_cluster(cluster);
            Ok(())
        }
        Command::Cd { path } => cd(session, path.as_deref()),
        Command::Ls { pattern } => ls(session, pattern.as_deref(), out),
        Command::Exec { cmdline } => exec(session, cmdline, out),
        Command::RootExec { cmdline } => rootexec(session, cmdline, out),
        Command::Nsenter { cmdline } => run_nsenter(session, cmdline, out),
        Command::Ps => ps(session, out),
        Command::Tail { follow } => tail(session, *follow, out),
        Command::Events { sort_by } => events(session, sort_by.as_deref(), out),
        Command::Info => info(session, out),
        Command::Delete => delete(session),
        Command::Shell { cmdline } => shell_escape(cmdline),
        Command::Help { topic } => {
            write!(out, "{}", help_text(topic.as_deref()))?;
            Ok(())
        }
        Command::Clear => {
            write!(out, "\x1B[2J\x1B[1;1H")?;
            Ok(())
        }
        Command::Quit => Ok(()),
        Command::Unknown { input } => {
            if input.is_empty() {
                Ok(())
            } else {
                Err(Error::Usage(format!(
                    "unknown command: {}, try `help`",
                    input.split_whitespace().next().unwrap_or(input)
                )))
            }
        }
    }
}

fn cd(session: &mut Session, path: Option<&str>) -> Result<()> {
    let Some(pattern) = path else {
        session.path.reset();
        return Ok(());
    };
    // Unlike ls, cd takes literal paths only; a glob that happened to
    // match several entries could not land anywhere sensible.
    if pattern.split('/').any(nav::has_magic) {
        return Err(Error::Usage(format!(
            "cd: glob patterns are not allowed: {pattern}"
        )));
    }
    let matches = nav::resolve(session, &session.path, pattern)?;
    match matches.len() {
        0 => Err(Error::NotFound {
            entry: pattern.to_string(),
            layer: session.path.layer().name(),
            parent: session.path.to_string(),
        }),
        1 => {
            session.path = matches.into_iter().next().unwrap_or_default();
            Ok(())
        }
        _ => Err(Error::Usage(format!(
            "cd: {pattern} is ambiguous ({} matches)",
            matches.len()
        ))),
    }
}

fn ls(session: &Session, pattern: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let Some(pattern) = pattern else {
        for child in session.children(&session.path)? {
            writeln!(out, "{child}")?;
        }
        return Ok(());
    };
    // A trailing slash lists the contents of each match instead of the
    // matches themselves, like `ls dir/` in a filesystem.
    let list_contents = pattern.ends_with('/') && pattern.len() > 1;
    for path in nav::resolve(session, &session.path, pattern)? {
        if list_contents {
            for child in session.children(&path)? {
                writeln!(out, "{child}")?;
            }
        } else {
            writeln!(out, "{}", nav::display_relative(&session.path, &path))?;
        }
    }
    Ok(())
}

fn require_container(session: &Session, command: &'static str) -> Result<()> {
    if session.path.layer() != Layer::Container {
        return Err(Error::WrongLayer {
            command,
            expected: "container",
        });
    }
    Ok(())
}

fn exec(session: &mut Session, cmdline: &str, out: &mut dyn Write) -> Result<()> {
    require_container(session, "exec")?;
    let pod = session.path.pod().unwrap_or_default().to_string();
    let container = session.path.container().unwrap_or_default().to_string();
    let mut args = vec![
        "exec".to_string(),
        pod,
        "-c".to_string(),
        container,
        "--".to_string(),
    ];
    args.extend(split_cmdline(cmdline)?);
    // Exec needs cluster credentials, so it runs as admin.
    session.kubectl()?.stream(session.runner(), args, true, out)
}

fn rootexec(session: &mut Session, cmdline: &str, out: &mut dyn Write) -> Result<()> {
    require_container(session, "rootexec")?;
    let (node, id) = session.container_runtime()?;
    let args = split_cmdline(cmdline)?;
    let spec = docker_exec_root(&node, session.ssh_opts(), &id, &args);
    let rc = session.runner().stream(&spec, out)?;
    exit_ok(spec.display(), rc)
}

fn run_nsenter(session: &mut Session, cmdline: &str, out: &mut dyn Write) -> Result<()> {
    require_container(session, "nsenter")?;
    let (node, id) = session.container_runtime()?;

    // Find the main PID of the container first.
    let inspect = docker_inspect_pid(&node, session.ssh_opts(), &id);
    let output = session.runner().output(&inspect)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: inspect.display(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    let pid = String::from_utf8_lossy(&output.stdout).trim().to_string();

    let args = split_cmdline(cmdline)?;
    let spec = nsenter(&node, session.ssh_opts(), &pid, &args);
    let rc = session.runner().stream(&spec, out)?;
    exit_ok(spec.display(), rc)
}

fn ps(session: &mut Session, out: &mut dyn Write) -> Result<()> {
    require_container(session, "ps")?;
    let (node, id) = session.container_runtime()?;
    let spec = docker_top(&node, session.ssh_opts(), &id);
    let rc = session.runner().stream(&spec, out)?;
    exit_ok(spec.display(), rc)
}

fn tail(session: &mut Session, follow: bool, out: &mut dyn Write) -> Result<()> {
    require_container(session, "tail")?;
    let pod = session.path.pod().unwrap_or_default().to_string();
    let container = session.path.container().unwrap_or_default().to_string();
    let mut args = vec!["logs".to_string()];
    if follow {
        args.push("-f".to_string());
    }
    args.push(pod);
    args.push(container);
    session.kubectl()?.stream(session.runner(), args, false, out)
}

fn events(session: &mut Session, sort_by: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let sort_key = sort_by.unwrap_or(EVENT_SORT_KEY);
    let sort_flag = format!("--sort-by={sort_key}");
    match session.path.layer() {
        // Cluster-wide events span all namespaces, so run as admin with -A.
        Layer::Cluster => session.kubectl()?.stream(
            session.runner(),
            vec!["get".to_string(), "events".to_string(), sort_flag, "-A".to_string()],
            true,
            out,
        ),
        Layer::Namespace => session.kubectl()?.stream(
            session.runner(),
            vec!["get".to_string(), "events".to_string(), sort_flag],
            false,
            out,
        ),
        _ => Err(Error::WrongLayer {
            command: "events",
            expected: "cluster or namespace",
        }),
    }
}

fn info(session: &mut Session, out: &mut dyn Write) -> Result<()> {
    let Some(service) = session.path.service() else {
        return Err(Error::WrongLayer {
            command: "info",
            expected: "service",
        });
    };
    let service = service.to_string();
    let detail: ServiceDetail =
        session
            .kubectl()?
            .json(session.runner(), ["get", "services", service.as_str()], false)?;
    writeln!(
        out,
        "{}/services/{}",
        detail.metadata.namespace.as_deref().unwrap_or_default(),
        detail.metadata.name
    )?;
    for port in &detail.spec.ports {
        let target = port
            .target_port
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default();
        let nodeport = port
            .node_port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{}\ttarget:{}\tnodeport:{}",
            port.name.as_deref().unwrap_or("-"),
            target,
            nodeport
        )?;
    }
    Ok(())
}

fn delete(session: &mut Session) -> Result<()> {
    let (kind, name) = match session.path.layer() {
        Layer::Namespace => ("namespace", session.path.namespace().unwrap_or_default()),
        Layer::Pod => ("pod", session.path.pod().unwrap_or_default()),
        Layer::Service => ("service", session.path.service().unwrap_or_default()),
        layer => {
            return Err(Error::Usage(format!(
                "objects of kind '{}' cannot be deleted",
                layer.name()
            )));
        }
    };
    let name = name.to_string();
    let spec = session
        .kubectl()?
        .spec(vec!["delete".to_string(), kind.to_string(), name], true);
    let output = session.runner().output(&spec)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: spec.display(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    // The object is gone; land on its parent.
    session.path.pop()?;
    Ok(())
}

fn shell_escape(cmdline: &str) -> Result<()> {
    if cmdline.is_empty() {
        return Err(Error::Usage("usage: !<command>".into()));
    }
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(cmdline)
        .status()
        .map_err(|e| Error::Spawn {
            command: format!("sh -c {cmdline}"),
            source: e,
        })?;
    if !status.success() {
        return Err(Error::CommandFailed {
            command: cmdline.to_string(),
            code: status.code().unwrap_or(-1),
            stderr: String::new(),
        });
    }
    Ok(())
}

fn split_cmdline(cmdline: &str) -> Result<Vec<String>> {
    shell_words::split(cmdline).map_err(|e| Error::Usage(format!("bad command line: {e}")))
}

fn exit_ok(command: String, rc: i32) -> Result<()> {
    if rc != 0 {
        return Err(Error::CommandFailed {
            command,
            code: rc,
            stderr: String::new(),
        });
    }
    Ok(())
}

/// Help text: the overview or one command's usage.
pub fn help_text(topic: Option<&str>) -> String {
    let entries: &[(&str, &str)] = &[
        ("use", "use <cluster>\n  Select the cluster to operate on.\n"),
        (
            "cd",
            "cd [path]\n  Change layer of the kubernetes hierarchy. Supports multi-segment\n  paths, `..` and absolute `/...` paths. With no argument, resets to\n  the cluster level.\n",
        ),
        (
            "ls",
            "ls [pattern]\n  List the entries at the current level, or those matching a glob\n  pattern (e.g. `ls default/pod.*`). A trailing `/` lists contents.\n",
        ),
        (
            "exec",
            "exec <command>\n  Context: container. Run a command within the container.\n",
        ),
        (
            "rootexec",
            "rootexec <command>\n  Context: container. Run a command within the container as root.\n",
        ),
        (
            "nsenter",
            "nsenter [FLAGS] <command>\n  Context: container. Run a command from the worker node inside the\n  container's namespaces selected with FLAGS, e.g. `nsenter -n tcpdump`.\n",
        ),
        ("ps", "ps\n  Context: container. Show processes running in the container.\n"),
        (
            "tail",
            "tail [-f]\n  Context: container. Show the container's logs; -f follows them.\n",
        ),
        (
            "events",
            "events [sort-key]\n  Context: cluster or namespace. Show the event log, sorted by the\n  given JSONPath key (default .lastTimestamp).\n",
        ),
        ("info", "info\n  Context: service. Show the service's name and port table.\n"),
        (
            "delete",
            "delete\n  Delete the current namespace, pod or service.\n",
        ),
        ("exit", "exit\n  Exit the program (Ctrl+D works too).\n"),
    ];
    if let Some(topic) = topic {
        for (name, text) in entries {
            if *name == topic {
                return (*text).to_string();
            }
        }
        return format!("no help for {topic}\n");
    }
    let mut text = String::from(
        "Navigate the cluster like a filesystem; prefix a line with `!` to run\na local shell command, or pipe output with `|`.\n\nCommands:\n",
    );
    for (name, _) in entries {
        text.push_str("  ");
        text.push_str(name);
        text.push('\n');
    }
    text.push_str("Type `help <command>` for details.\n");
    text
}
