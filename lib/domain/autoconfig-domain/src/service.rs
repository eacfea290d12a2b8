use std::collections::BTreeMap;
use std::fmt;

use http::Uri;
use serde::{Deserialize, Serialize};

pub const DETECTOR_LABEL_KEY: &str = "trustyai/guardrails";
pub const DETECTOR_LABEL_VALUE: &str = "true";

/// A discoverable network endpoint registered in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    /// Set once the backing workload is ready.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_ref: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.resolved_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime_ref = Some(runtime.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Host component of the resolved URL, if the service is ready and the
    /// URL carries a host.
    pub fn hostname(&self) -> Option<String> {
        self.resolved_url.as_deref().and_then(hostname_of)
    }
}

/// Container-level networking for one or more services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSpec {
    pub name: String,
    /// The first entry is the externally reachable port.
    #[serde(default)]
    pub container_ports: Vec<u16>,
}

impl RuntimeSpec {
    pub fn new(name: impl Into<String>, container_ports: Vec<u16>) -> Self {
        Self {
            name: name.into(),
            container_ports,
        }
    }

    pub fn primary_port(&self) -> Option<u16> {
        self.container_ports.first().copied()
    }
}

/// Exact-match label selector. Pairs are AND-combined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    pairs: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detectors() -> Self {
        Self::new().with(DETECTOR_LABEL_KEY, DETECTOR_LABEL_VALUE)
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.pairs
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }
}

/// Renders in the `k=v,k2=v2` form understood by the Kubernetes API.
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.pairs {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}

/// Extracts the host component of an absolute URL, dropping scheme, port and
/// path. Case is preserved.
pub fn hostname_of(raw: &str) -> Option<String> {
    let uri: Uri = raw.trim().parse().ok()?;
    uri.scheme()?;
    uri.host()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}
