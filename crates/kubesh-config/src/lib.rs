//! Configuration loading for kubesh
//!
//! The configuration is a YAML document at the per-user config path with a
//! default profile at the top level and optional per-cluster overrides under
//! `profiles`:
//!
//! ```yaml
//! kubectl_host: kubemaster.example.com
//! kubeconfig_format: "/etc/kubernetes/{namespace}-{cluster}.config"
//! ssh_opts: ["-o", "ConnectTimeout=5"]
//! profiles:
//!   staging:
//!     kubectl_host: kubemaster.staging.example.com
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Default kubeconfig location pattern on the kubectl host.
pub const DEFAULT_KUBECONFIG_FORMAT: &str = "/etc/kubernetes/{namespace}-{cluster}.config";

const CONFIG_FILENAME: &str = "config.yaml";
const LEGACY_FILENAME: &str = ".kubeshrc.yaml";

/// Settings for talking to one cluster.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Host to run kubectl on via ssh; None means run it locally.
    pub kubectl_host: Option<String>,
    /// Format string with `{cluster}` / `{namespace}` placeholders yielding
    /// the kubeconfig path.
    pub kubeconfig_format: String,
    /// Extra options passed to ssh.
    pub ssh_opts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kubectl_host: None,
            kubeconfig_format: DEFAULT_KUBECONFIG_FORMAT.to_string(),
            ssh_opts: Vec::new(),
        }
    }
}

/// The default config plus per-cluster overrides.
#[derive(Clone, Debug, Default)]
pub struct Profiles {
    pub default: Config,
    overrides: HashMap<String, ConfigOverride>,
}

impl Profiles {
    /// The effective config for a cluster: the default with the matching
    /// profile's overrides applied.
    pub fn for_cluster(&self, cluster: &str) -> Config {
        let mut config = self.default.clone();
        if let Some(over) = self.overrides.get(cluster) {
            if let Some(host) = &over.kubectl_host {
                config.kubectl_host = Some(host.clone());
            }
            if let Some(fmt) = &over.kubeconfig_format {
                config.kubeconfig_format = normalize_format(fmt);
            }
            if let Some(opts) = &over.ssh_opts {
                config.ssh_opts = opts.clone();
            }
        }
        config
    }

    /// Load from the given file. A missing file yields defaults; a broken
    /// one is warned about and ignored, never fatal.
    pub fn load(path: &Path) -> Self {
        if !path.is_file() {
            return Self::default();
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("could not read {}: {e}, ignoring it", path.display());
                return Self::default();
            }
        };
        match serde_yaml::from_str::<RawConfig>(&raw) {
            Ok(raw) => raw.into(),
            Err(e) => {
                warn!("bad configuration file {}: {e}, ignoring it", path.display());
                Self::default()
            }
        }
    }
}

/// On-disk shape: the default profile inline, overrides under `profiles`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    kubectl_host: Option<String>,
    kubeconfig_format: Option<String>,
    ssh_opts: Option<Vec<String>>,
    #[serde(default)]
    profiles: HashMap<String, ConfigOverride>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ConfigOverride {
    kubectl_host: Option<String>,
    kubeconfig_format: Option<String>,
    ssh_opts: Option<Vec<String>>,
}

impl From<RawConfig> for Profiles {
    fn from(raw: RawConfig) -> Self {
        Self {
            default: Config {
                kubectl_host: raw.kubectl_host,
                kubeconfig_format: raw
                    .kubeconfig_format
                    .as_deref()
                    .map(normalize_format)
                    .unwrap_or_else(|| DEFAULT_KUBECONFIG_FORMAT.to_string()),
                ssh_opts: raw.ssh_opts.unwrap_or_default(),
            },
            overrides: raw.profiles,
        }
    }
}

/// Older configs carried a `KUBECONFIG=` prefix in the format string; accept
/// it and keep only the path pattern.
fn normalize_format(fmt: &str) -> String {
    fmt.strip_prefix("KUBECONFIG=").unwrap_or(fmt).to_string()
}

/// The per-user configuration file path: the XDG location if it exists,
/// otherwise the legacy dotfile in the home directory, otherwise the XDG
/// location (so a fresh setup gets the modern path).
pub fn config_path() -> PathBuf {
    let xdg = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kubesh")
        .join(CONFIG_FILENAME);
    if xdg.is_file() {
        return xdg;
    }
    if let Some(home) = dirs::home_dir() {
        let legacy = home.join(LEGACY_FILENAME);
        if legacy.is_file() {
            warn!(
                "config path {} is deprecated, please use {} instead",
                legacy.display(),
                xdg.display()
            );
            return legacy;
        }
    }
    xdg
}

/// Where the shell history lives.
pub fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("kubesh").join("history"))
}
