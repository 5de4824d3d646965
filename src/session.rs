//! The shell's state: loaded profiles, the current path, and the lookups
//! that turn a path into kubectl invocations.

use std::sync::Arc;

use kubesh_config::{Config, Profiles};
use kubesh_exec::{Kubectl, Runner};
use kubesh_types::{
    Error, KubePath, Layer, NamedList, PodDetail, Result, POD_PREFIX, SERVICE_PREFIX,
};

pub struct Session {
    profiles: Profiles,
    /// Effective config for the selected cluster.
    active: Config,
    pub path: KubePath,
    runner: Arc<dyn Runner>,
}

impl Session {
    pub fn new(profiles: Profiles, runner: Arc<dyn Runner>) -> Self {
        let active = profiles.default.clone();
        Self {
            profiles,
            active,
            path: KubePath::new(),
            runner,
        }
    }

    /// Select a cluster: reset the path and switch to its profile.
    pub fn use_cluster(&mut self, cluster: &str) {
        self.active = self.profiles.for_cluster(cluster);
        self.path.use_cluster(cluster);
    }

    pub fn runner(&self) -> &dyn Runner {
        self.runner.as_ref()
    }

    pub fn ssh_opts(&self) -> &[String] {
        &self.active.ssh_opts
    }

    /// A kubectl builder scoped to the given path's cluster and namespace.
    pub fn kubectl_for(&self, path: &KubePath) -> Result<Kubectl> {
        let cluster = path
            .cluster()
            .ok_or(Error::Usage("no cluster selected, see `use`".into()))?;
        Ok(Kubectl::new(
            cluster,
            path.namespace(),
            &self.active.kubeconfig_format,
            self.active.kubectl_host.as_deref(),
            &self.active.ssh_opts,
        ))
    }

    pub fn kubectl(&self) -> Result<Kubectl> {
        self.kubectl_for(&self.path)
    }

    /// The fragments one level below `path`.
    pub fn children(&self, path: &KubePath) -> Result<Vec<String>> {
        match path.layer() {
            Layer::Root | Layer::Service | Layer::Container => Ok(Vec::new()),
            Layer::Cluster => {
                let ctl = self.kubectl_for(path)?;
                let list: NamedList =
                    ctl.json(self.runner(), ["get", "namespaces"], true)?;
                Ok(list.names())
            }
            Layer::Namespace => {
                let ctl = self.kubectl_for(path)?;
                let pods: NamedList = ctl.json(self.runner(), ["get", "pods"], false)?;
                let services: NamedList =
                    ctl.json(self.runner(), ["get", "services"], false)?;
                let mut frags: Vec<String> = pods
                    .names()
                    .into_iter()
                    .map(|n| format!("{POD_PREFIX}{n}"))
                    .collect();
                frags.extend(
                    services
                        .names()
                        .into_iter()
                        .map(|n| format!("{SERVICE_PREFIX}{n}")),
                );
                Ok(frags)
            }
            Layer::Pod => {
                let detail = self.pod_detail(path)?;
                Ok(detail
                    .status
                    .container_statuses
                    .into_iter()
                    .map(|c| c.name)
                    .collect())
            }
        }
    }

    /// Full pod JSON for the pod named in `path`.
    pub fn pod_detail(&self, path: &KubePath) -> Result<PodDetail> {
        let pod = path.pod().ok_or(Error::WrongLayer {
            command: "pod lookup",
            expected: "pod",
        })?;
        let ctl = self.kubectl_for(path)?;
        ctl.json(self.runner(), ["get", "pods", pod], false)
    }

    /// The current container's node hostname and bare runtime ID.
    pub fn container_runtime(&self) -> Result<(String, String)> {
        let container = self.path.container().ok_or(Error::WrongLayer {
            command: "container lookup",
            expected: "container",
        })?;
        let detail = self.pod_detail(&self.path)?;
        let node = detail.spec.node_name;
        for status in &detail.status.container_statuses {
            if status.name == container {
                return Ok((node, status.bare_id().to_string()));
            }
        }
        Err(Error::NotFound {
            entry: container.to_string(),
            layer: "pod",
            parent: self.path.pod().unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRunner;
    use kubesh_types::KubePath;

    fn session(runner: &Arc<FakeRunner>) -> Session {
        let mut s = Session::new(Profiles::default(), runner.clone());
        s.use_cluster("minikube");
        s
    }

    fn at(frags: &[&str]) -> KubePath {
        let mut p = KubePath::new();
        for f in frags {
            p.push(f).unwrap();
        }
        p
    }

    const POD_JSON: &str = r#"{
        "spec": {"nodeName": "node1.example.com"},
        "status": {"containerStatuses": [
            {"name": "nginx", "containerID": "docker://123abc"},
            {"name": "envoy", "containerID": "docker://456def"}
        ]}
    }"#;

    #[test]
    fn test_children_at_cluster_level_uses_admin() {
        let runner = FakeRunner::with_outputs(vec![(
            0,
            r#"{"items": [{"metadata": {"name": "default"}}, {"metadata": {"name": "kube-system"}}]}"#,
        )]);
        let s = session(&runner);
        let children = s.children(&at(&["minikube"])).unwrap();
        assert_eq!(children, vec!["default", "kube-system"]);
        assert_eq!(
            runner.calls()[0],
            vec![
                "sudo",
                "KUBECONFIG=/etc/kubernetes/admin-minikube.config",
                "kubectl",
                "get",
                "namespaces",
                "-o=json"
            ]
        );
    }

    #[test]
    fn test_children_at_namespace_level_merges_pods_and_services() {
        let runner = FakeRunner::with_outputs(vec![
            (0, r#"{"items": [{"metadata": {"name": "web"}}]}"#),
            (0, r#"{"items": [{"metadata": {"name": "web-svc"}}]}"#),
        ]);
        let s = session(&runner);
        let children = s.children(&at(&["minikube", "default"])).unwrap();
        assert_eq!(children, vec!["pod.web", "service.web-svc"]);
        assert_eq!(
            runner.calls()[0],
            vec![
                "KUBECONFIG=/etc/kubernetes/default-minikube.config",
                "kubectl",
                "-n",
                "default",
                "get",
                "pods",
                "-o=json"
            ]
        );
    }

    #[test]
    fn test_children_at_pod_level_lists_containers() {
        let runner = FakeRunner::with_outputs(vec![(0, POD_JSON)]);
        let s = session(&runner);
        let children = s.children(&at(&["minikube", "default", "pod.web"])).unwrap();
        assert_eq!(children, vec!["nginx", "envoy"]);
        assert_eq!(
            runner.calls()[0],
            vec![
                "KUBECONFIG=/etc/kubernetes/default-minikube.config",
                "kubectl",
                "-n",
                "default",
                "get",
                "pods",
                "web",
                "-o=json"
            ]
        );
    }

    #[test]
    fn test_children_failure_carries_stderr() {
        let runner = FakeRunner::with_outputs(vec![(1, "")]);
        let s = session(&runner);
        let err = s.children(&at(&["minikube", "default"])).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: 1, .. }));
    }

    #[test]
    fn test_leaf_layers_have_no_children() {
        let runner = FakeRunner::with_outputs(vec![]);
        let s = session(&runner);
        assert!(s.children(&KubePath::new()).unwrap().is_empty());
        assert!(
            s.children(&at(&["minikube", "default", "service.web-svc"]))
                .unwrap()
                .is_empty()
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_container_runtime() {
        let runner = FakeRunner::with_outputs(vec![(0, POD_JSON)]);
        let mut s = session(&runner);
        s.path = at(&["minikube", "default", "pod.web", "envoy"]);
        let (node, id) = s.container_runtime().unwrap();
        assert_eq!(node, "node1.example.com");
        assert_eq!(id, "456def");
    }

    #[test]
    fn test_container_runtime_unknown_container() {
        let runner = FakeRunner::with_outputs(vec![(0, POD_JSON)]);
        let mut s = session(&runner);
        s.path = at(&["minikube", "default", "pod.web", "ghost"]);
        assert!(matches!(
            s.container_runtime().unwrap_err(),
            Error::NotFound { .. }
        ));
    }

    #[test]
    fn test_use_cluster_switches_profile() {
        let runner = FakeRunner::with_outputs(vec![]);
        let mut s = Session::new(Profiles::default(), runner.clone());
        assert!(s.kubectl().is_err());
        s.use_cluster("staging");
        assert_eq!(s.path.cluster(), Some("staging"));
        assert!(s.kubectl().is_ok());
    }
}
