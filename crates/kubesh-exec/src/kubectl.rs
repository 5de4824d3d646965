//! Builder for kubectl invocations.

use kubesh_types::{Error, Result};
use serde::de::DeserializeOwned;

use crate::runner::Runner;
use crate::spec::CommandSpec;

/// The namespace whose kubeconfig carries cluster-wide credentials.
const ADMIN_NAMESPACE: &str = "admin";

/// Builds `kubectl` command specs for one cluster/namespace pair.
///
/// The kubeconfig path comes from a format string with `{cluster}` and
/// `{namespace}` placeholders; admin invocations substitute the `admin`
/// namespace and run under sudo.
#[derive(Clone, Debug)]
pub struct Kubectl {
    pub cluster: String,
    pub namespace: Option<String>,
    kubeconfig_format: String,
    host: Option<String>,
    ssh_opts: Vec<String>,
}

impl Kubectl {
    pub fn new(
        cluster: &str,
        namespace: Option<&str>,
        kubeconfig_format: &str,
        host: Option<&str>,
        ssh_opts: &[String],
    ) -> Self {
        Self {
            cluster: cluster.to_string(),
            namespace: namespace.map(str::to_string),
            kubeconfig_format: kubeconfig_format.to_string(),
            host: host.map(str::to_string),
            ssh_opts: ssh_opts.to_vec(),
        }
    }

    fn kubeconfig(&self, admin: bool) -> String {
        let namespace = if admin {
            ADMIN_NAMESPACE
        } else {
            self.namespace.as_deref().unwrap_or(ADMIN_NAMESPACE)
        };
        self.kubeconfig_format
            .replace("{cluster}", &self.cluster)
            .replace("{namespace}", namespace)
    }

    /// The spec for `kubectl [-n <namespace>] <args...>`.
    pub fn spec<I, S>(&self, args: I, admin: bool) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = vec!["kubectl".to_string()];
        if let Some(ns) = &self.namespace {
            argv.push("-n".to_string());
            argv.push(ns.clone());
        }
        argv.extend(args.into_iter().map(Into::into));

        let spec = match &self.host {
            Some(host) => CommandSpec::remote(host, &self.ssh_opts, argv),
            None => CommandSpec::local(argv),
        };
        let spec = spec.with_kubeconfig(self.kubeconfig(admin));
        if admin { spec.with_sudo() } else { spec }
    }

    /// Run with `-o=json` appended and decode the output.
    pub fn json<T, I, S>(&self, runner: &dyn Runner, args: I, admin: bool) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv: Vec<String> = args.into_iter().map(Into::into).collect();
        argv.push("-o=json".to_string());
        let spec = self.spec(argv, admin);
        let out = runner.output(&spec)?;
        if !out.status.success() {
            return Err(Error::CommandFailed {
                command: spec.display(),
                code: out.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&out.stderr).to_string(),
            });
        }
        serde_json::from_slice(&out.stdout).map_err(|e| Error::JsonDecode {
            command: spec.display(),
            source: e,
        })
    }

    /// Run streaming output into `sink`; errors on a non-zero exit.
    pub fn stream<I, S>(
        &self,
        runner: &dyn Runner,
        args: I,
        admin: bool,
        sink: &mut dyn std::io::Write,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = self.spec(args, admin);
        let rc = runner.stream(&spec, sink)?;
        if rc != 0 {
            return Err(Error::CommandFailed {
                command: spec.display(),
                code: rc,
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kubectl() -> Kubectl {
        Kubectl::new(
            "cluster",
            Some("namespace"),
            "/etc/kubernetes/{namespace}-{cluster}.config",
            None,
            &[],
        )
    }

    #[test]
    fn test_spec_includes_namespace_and_kubeconfig() {
        let spec = kubectl().spec(["get", "pods"], false);
        assert_eq!(
            spec.command_line(),
            vec![
                "KUBECONFIG=/etc/kubernetes/namespace-cluster.config",
                "kubectl",
                "-n",
                "namespace",
                "get",
                "pods"
            ]
        );
    }

    #[test]
    fn test_admin_spec_uses_admin_kubeconfig_and_sudo() {
        let spec = kubectl().spec(["get", "namespaces"], true);
        assert_eq!(
            spec.command_line(),
            vec![
                "sudo",
                "KUBECONFIG=/etc/kubernetes/admin-cluster.config",
                "kubectl",
                "-n",
                "namespace",
                "get",
                "namespaces"
            ]
        );
    }

    #[test]
    fn test_spec_without_namespace() {
        let ctl = Kubectl::new("prod", None, "/srv/{namespace}-{cluster}.conf", None, &[]);
        let spec = ctl.spec(["get", "nodes"], false);
        assert_eq!(
            spec.command_line(),
            vec!["KUBECONFIG=/srv/admin-prod.conf", "kubectl", "get", "nodes"]
        );
    }

    #[test]
    fn test_remote_spec_goes_through_ssh() {
        let opts = vec!["-q".to_string()];
        let ctl = Kubectl::new(
            "prod",
            Some("web"),
            "/etc/kubernetes/{namespace}-{cluster}.config",
            Some("kubemaster"),
            &opts,
        );
        let line = ctl.spec(["get", "pods"], false).command_line();
        assert_eq!(
            line,
            vec![
                "ssh",
                "-T",
                "kubemaster",
                "-q",
                "KUBECONFIG=/etc/kubernetes/web-prod.config",
                "kubectl",
                "-n",
                "web",
                "get",
                "pods"
            ]
        );
    }
}
