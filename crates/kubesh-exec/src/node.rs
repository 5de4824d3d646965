//! Diagnostic commands that run on the pod's worker node.
//!
//! These all go through ssh to the node and sudo there: the container
//! runtime socket and the namespaces of other processes are root-only.

use crate::spec::CommandSpec;

/// `sudo docker top <id>` — the container's process list.
pub fn docker_top(node: &str, ssh_opts: &[String], container_id: &str) -> CommandSpec {
    CommandSpec::remote(node, ssh_opts, ["docker", "top", container_id]).with_sudo()
}

/// `sudo docker inspect -f '{{.State.Pid}}' <id>` — the container's main PID.
pub fn docker_inspect_pid(node: &str, ssh_opts: &[String], container_id: &str) -> CommandSpec {
    CommandSpec::remote(
        node,
        ssh_opts,
        ["docker", "inspect", "-f", "{{.State.Pid}}", container_id],
    )
    .with_sudo()
}

/// `sudo nsenter -t <pid> <args...>` — run inside the container's namespaces.
pub fn nsenter(node: &str, ssh_opts: &[String], pid: &str, args: &[String]) -> CommandSpec {
    let mut argv = vec!["nsenter".to_string(), "-t".to_string(), pid.to_string()];
    argv.extend(args.iter().cloned());
    CommandSpec::remote(node, ssh_opts, argv).with_sudo()
}

/// `sudo docker exec --user root <id> <args...>` — a root shell bypassing
/// the container's own user.
pub fn docker_exec_root(
    node: &str,
    ssh_opts: &[String],
    container_id: &str,
    args: &[String],
) -> CommandSpec {
    let mut argv = vec![
        "docker".to_string(),
        "exec".to_string(),
        "--user".to_string(),
        "root".to_string(),
        container_id.to_string(),
    ];
    argv.extend(args.iter().cloned());
    CommandSpec::remote(node, ssh_opts, argv).with_sudo()
}
