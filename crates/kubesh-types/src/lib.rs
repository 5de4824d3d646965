//! Shared types for kubesh
//!
//! This crate contains the hierarchy path model, the resource value structs
//! decoded from `kubectl -o json` output, and the error taxonomy used across
//! the kubesh crates.

mod error;
mod path;
mod resources;

pub use error::{Error, Result};
pub use path::{KubePath, Layer, POD_PREFIX, SERVICE_PREFIX};
pub use resources::{
    ContainerStatus, Metadata, NamedItem, NamedList, PodDetail, PodSpec, PodStatus, PortTarget,
    ServiceDetail, ServicePort, ServiceSpec,
};
