//! The current-path model for the kubernetes hierarchy.
//!
//! A path is a flat sequence of string fragments; its depth determines the
//! layer. Pods and services share the third level and are told apart by a
//! `pod.` / `service.` fragment prefix, the same form `ls` prints.

use std::fmt;

use crate::error::{Error, Result};

/// Fragment prefix for pods at the namespace level.
pub const POD_PREFIX: &str = "pod.";
/// Fragment prefix for services at the namespace level.
pub const SERVICE_PREFIX: &str = "service.";

/// A layer of the kubernetes hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Root,
    Cluster,
    Namespace,
    Pod,
    Service,
    Container,
}

impl Layer {
    /// Lowercase name, used in prompts and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Layer::Root => "root",
            Layer::Cluster => "cluster",
            Layer::Namespace => "namespace",
            Layer::Pod => "pod",
            Layer::Service => "service",
            Layer::Container => "container",
        }
    }
}

/// The REPL's current position in the hierarchy.
///
/// Invariant: deeper levels require shallower ones to be set; `push`
/// rejects fragments that would break the hierarchy shape.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KubePath {
    frags: Vec<String>,
}

impl KubePath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current layer, derived from depth (and the fragment prefix at the
    /// pod/service level).
    pub fn layer(&self) -> Layer {
        match self.frags.len() {
            0 => Layer::Root,
            1 => Layer::Cluster,
            2 => Layer::Namespace,
            3 => {
                if self.frags[2].starts_with(SERVICE_PREFIX) {
                    Layer::Service
                } else {
                    Layer::Pod
                }
            }
            _ => Layer::Container,
        }
    }

    pub fn cluster(&self) -> Option<&str> {
        self.frags.first().map(String::as_str)
    }

    pub fn namespace(&self) -> Option<&str> {
        self.frags.get(1).map(String::as_str)
    }

    pub fn pod(&self) -> Option<&str> {
        self.frags.get(2)?.strip_prefix(POD_PREFIX)
    }

    pub fn service(&self) -> Option<&str> {
        self.frags.get(2)?.strip_prefix(SERVICE_PREFIX)
    }

    pub fn container(&self) -> Option<&str> {
        self.frags.get(3).map(String::as_str)
    }

    /// The raw fragments, cluster first.
    pub fn fragments(&self) -> &[String] {
        &self.frags
    }

    /// Append one fragment, validating the hierarchy shape.
    pub fn push(&mut self, frag: &str) -> Result<()> {
        let invalid = |entry: &str| Error::NotFound {
            entry: entry.to_string(),
            layer: self.layer().name(),
            parent: self.frags.last().cloned().unwrap_or_default(),
        };
        match self.layer() {
            Layer::Namespace => {
                if !frag.starts_with(POD_PREFIX) && !frag.starts_with(SERVICE_PREFIX) {
                    return Err(invalid(frag));
                }
            }
            Layer::Service | Layer::Container => return Err(invalid(frag)),
            _ => {}
        }
        if frag.is_empty() || frag.contains('/') {
            return Err(invalid(frag));
        }
        self.frags.push(frag.to_string());
        Ok(())
    }

    /// Drop the deepest fragment.
    pub fn pop(&mut self) -> Result<()> {
        if self.frags.pop().is_none() {
            return Err(Error::AtRoot);
        }
        Ok(())
    }

    /// Reset to the cluster level, or to the root when no cluster is set.
    pub fn reset(&mut self) {
        self.frags.truncate(1);
    }

    /// Replace the whole path with a bare cluster.
    pub fn use_cluster(&mut self, cluster: &str) {
        self.frags = vec![cluster.to_string()];
    }

    pub fn is_root(&self) -> bool {
        self.frags.is_empty()
    }

    /// The path below the cluster, as shown in the prompt.
    pub fn display_path(&self) -> String {
        if self.frags.is_empty() {
            return "/".to_string();
        }
        format!("/{}", self.frags[1..].join("/"))
    }
}

impl fmt::Display for KubePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frags.is_empty() {
            return write!(f, "/");
        }
        write!(f, "{}", self.frags.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(frags: &[&str]) -> KubePath {
        let mut p = KubePath::new();
        for f in frags {
            p.push(f).unwrap();
        }
        p
    }

    #[test]
    fn test_layer_per_depth() {
        assert_eq!(KubePath::new().layer(), Layer::Root);
        assert_eq!(path(&["minikube"]).layer(), Layer::Cluster);
        assert_eq!(path(&["minikube", "default"]).layer(), Layer::Namespace);
        assert_eq!(
            path(&["minikube", "default", "pod.web"]).layer(),
            Layer::Pod
        );
        assert_eq!(
            path(&["minikube", "default", "service.web"]).layer(),
            Layer::Service
        );
        assert_eq!(
            path(&["minikube", "default", "pod.web", "nginx"]).layer(),
            Layer::Container
        );
    }

    #[test]
    fn test_accessors_strip_prefixes() {
        let p = path(&["minikube", "default", "pod.web", "nginx"]);
        assert_eq!(p.cluster(), Some("minikube"));
        assert_eq!(p.namespace(), Some("default"));
        assert_eq!(p.pod(), Some("web"));
        assert_eq!(p.service(), None);
        assert_eq!(p.container(), Some("nginx"));

        let s = path(&["minikube", "default", "service.web"]);
        assert_eq!(s.service(), Some("web"));
        assert_eq!(s.pod(), None);
    }

    #[test]
    fn test_push_rejects_bad_shapes() {
        // Bare name at namespace level: neither pod. nor service.
        let mut p = path(&["minikube", "default"]);
        assert!(p.push("web").is_err());

        // Services have no children.
        let mut p = path(&["minikube", "default", "service.web"]);
        assert!(p.push("nginx").is_err());

        // Containers have no children.
        let mut p = path(&["minikube", "default", "pod.web", "nginx"]);
        assert!(p.push("deeper").is_err());
    }

    #[test]
    fn test_pop_stops_at_root() {
        let mut p = path(&["minikube"]);
        p.pop().unwrap();
        assert!(p.is_root());
        assert!(matches!(p.pop(), Err(Error::AtRoot)));
    }

    #[test]
    fn test_reset_keeps_cluster() {
        let mut p = path(&["minikube", "default", "pod.web"]);
        p.reset();
        assert_eq!(p, path(&["minikube"]));
        let mut root = KubePath::new();
        root.reset();
        assert!(root.is_root());
    }

    #[test]
    fn test_display_path() {
        let p = path(&["minikube", "default", "pod.web", "nginx"]);
        assert_eq!(p.display_path(), "/default/pod.web/nginx");
        assert_eq!(p.to_string(), "minikube/default/pod.web/nginx");
    }
}
