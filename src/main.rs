//! kubesh - an interactive shell for navigating Kubernetes clusters.
//!
//! Drill down from cluster to namespace, to pods and services, and from
//! there to individual containers; inspect them, read their logs and run
//! commands in their namespaces. Everything is delegated to `kubectl` and
//! `ssh`/`nsenter`/`docker` on the relevant hosts.

mod commands;
mod nav;
mod repl;
mod session;
mod style;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::Parser;

use kubesh_config::Profiles;
use kubesh_exec::SystemRunner;

use crate::session::Session;

#[derive(Parser, Debug)]
#[command(name = "kubesh")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cluster to select on startup (as with `use`)
    #[arg(value_name = "CLUSTER")]
    cluster: Option<String>,

    /// Configuration file (default: the per-user config path)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Execute a single command and exit
    #[arg(short, long, value_name = "LINE")]
    command: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Ctrl-C stops the foreground child (it shares our process group) and
    // flags the runner, leaving the shell itself alive.
    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = Arc::clone(&interrupt);
        ctrlc::set_handler(move || {
            interrupt.store(true, Ordering::SeqCst);
        })?;
    }

    let config_path = args
        .config
        .unwrap_or_else(kubesh_config::config_path);
    let profiles = Profiles::load(&config_path);

    let runner = Arc::new(SystemRunner::new(interrupt));
    let mut session = Session::new(profiles, runner);
    if let Some(cluster) = &args.cluster {
        session.use_cluster(cluster);
    }

    if let Some(line) = &args.command {
        let cmd = commands::parse(line)?;
        let mut stdout = std::io::stdout();
        commands::execute(&cmd, &mut session, &mut stdout)?;
        return Ok(());
    }

    repl::Repl::new(session)?.run()
}
