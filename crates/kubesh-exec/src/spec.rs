//! Description of one external command invocation.

/// Everything needed to run one external command: where it runs, how it is
/// escalated, which kubeconfig it sees, and the argv itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandSpec {
    /// Host to run on via ssh; None means run locally.
    pub host: Option<String>,
    /// Extra ssh options, only relevant with a host.
    pub ssh_opts: Vec<String>,
    /// Prefix the command with sudo.
    pub sudo: bool,
    /// KUBECONFIG path exported to the command.
    pub kubeconfig: Option<String>,
    /// The command and its arguments.
    pub argv: Vec<String>,
}

impl CommandSpec {
    /// A plain local command.
    pub fn local<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A command on a remote host via ssh.
    pub fn remote<I, S>(host: &str, ssh_opts: &[String], argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            host: Some(host.to_string()),
            ssh_opts: ssh_opts.to_vec(),
            ..Self::local(argv)
        }
    }

    pub fn with_sudo(mut self) -> Self {
        self.sudo = true;
        self
    }

    pub fn with_kubeconfig(mut self, path: String) -> Self {
        self.kubeconfig = Some(path);
        self
    }

    /// The full token list as executed. For a remote spec:
    /// `ssh -T <host> <opts...> [sudo] [KUBECONFIG=<path>] <argv...>`;
    /// a local spec is the same without the ssh prefix.
    pub fn command_line(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        if let Some(host) = &self.host {
            tokens.push("ssh".to_string());
            tokens.push("-T".to_string());
            tokens.push(host.clone());
            tokens.extend(self.ssh_opts.iter().cloned());
        }
        if self.sudo {
            tokens.push("sudo".to_string());
        }
        if let Some(path) = &self.kubeconfig {
            tokens.push(format!("KUBECONFIG={path}"));
        }
        tokens.extend(self.argv.iter().cloned());
        tokens
    }

    /// One-line rendering for traces and error messages.
    pub fn display(&self) -> String {
        self.command_line().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_command_line() {
        let spec = CommandSpec::local(["kubectl", "get", "pods"]);
        assert_eq!(spec.command_line(), vec!["kubectl", "get", "pods"]);
    }

    #[test]
    fn test_remote_wraps_in_ssh() {
        let opts = vec!["-o".to_string(), "ConnectTimeout=5".to_string()];
        let spec = CommandSpec::remote("kubemaster", &opts, ["kubectl", "get", "pods"]);
        assert_eq!(
            spec.command_line(),
            vec![
                "ssh",
                "-T",
                "kubemaster",
                "-o",
                "ConnectTimeout=5",
                "kubectl",
                "get",
                "pods"
            ]
        );
    }

    #[test]
    fn test_sudo_and_kubeconfig_ordering() {
        let spec = CommandSpec::local(["kubectl", "get", "namespaces"])
            .with_sudo()
            .with_kubeconfig("/etc/kubernetes/admin-prod.config".to_string());
        assert_eq!(
            spec.command_line(),
            vec![
                "sudo",
                "KUBECONFIG=/etc/kubernetes/admin-prod.config",
                "kubectl",
                "get",
                "namespaces"
            ]
        );
    }
}
