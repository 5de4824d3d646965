//! Subprocess plumbing for kubesh
//!
//! Every external action kubesh takes — kubectl queries, streamed logs,
//! `docker`/`nsenter` on a worker node — is described by a [`CommandSpec`]
//! and executed through the [`Runner`] seam. Production code uses
//! [`SystemRunner`]; tests substitute a recording fake.

mod kubectl;
mod node;
mod runner;
mod spec;

pub use kubectl::Kubectl;
pub use node::{docker_exec_root, docker_inspect_pid, docker_top, nsenter};
pub use runner::{Runner, SystemRunner};
pub use spec::CommandSpec;
