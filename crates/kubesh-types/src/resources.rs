//! Value structs matching the `kubectl ... -o json` shapes kubesh consumes.
//!
//! Only the fields we read are modeled; everything else in the kubectl
//! output is ignored during deserialization.

use std::fmt;

use serde::Deserialize;

/// Any `kubectl get <kind>` list; we only ever need the names.
#[derive(Debug, Deserialize)]
pub struct NamedList {
    pub items: Vec<NamedItem>,
}

#[derive(Debug, Deserialize)]
pub struct NamedItem {
    pub metadata: Metadata,
}

#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl NamedList {
    pub fn names(self) -> Vec<String> {
        self.items.into_iter().map(|i| i.metadata.name).collect()
    }
}

/// `kubectl get pods <name>`: the node the pod runs on plus its containers.
#[derive(Debug, Deserialize)]
pub struct PodDetail {
    pub spec: PodSpec,
    pub status: PodStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub node_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodStatus {
    #[serde(default)]
    pub container_statuses: Vec<ContainerStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    // kubectl emits "containerID", not the camelCase "containerId".
    #[serde(rename = "containerID", default)]
    pub container_id: String,
}

impl ContainerStatus {
    /// The container ID without the runtime scheme
    /// (`docker://abc` and `containerd://abc` both yield `abc`).
    pub fn bare_id(&self) -> &str {
        match self.container_id.split_once("://") {
            Some((_, id)) => id,
            None => &self.container_id,
        }
    }
}

/// `kubectl get services <name>`: name and port table.
#[derive(Debug, Deserialize)]
pub struct ServiceDetail {
    pub metadata: Metadata,
    pub spec: ServiceSpec,
}

#[derive(Debug, Deserialize)]
pub struct ServiceSpec {
    #[serde(default)]
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
    #[serde(default)]
    pub name: Option<String>,
    pub target_port: Option<PortTarget>,
    pub node_port: Option<i32>,
}

/// A service target port is either a number or a named container port.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PortTarget {
    Number(i64),
    Name(String),
}

impl fmt::Display for PortTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortTarget::Number(n) => write!(f, "{n}"),
            PortTarget::Name(s) => write!(f, "{s}"),
        }
    }
}
