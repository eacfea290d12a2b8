//! Ports consumed by the configuration synthesizer.

mod memory;

use anyhow::Result;
use async_trait::async_trait;

use autoconfig_domain::{LabelSelector, RuntimeSpec, ServiceRecord};

pub use memory::{DirectorySnapshot, InMemoryDirectory, NamespaceSnapshot};

/// Read-only view of the resource directory.
///
/// Implementations return errors verbatim; callers add context.
#[async_trait]
pub trait DirectoryPort: Send + Sync {
    /// Lists services in `namespace`, optionally filtered by an exact-match
    /// label selector.
    async fn list_services(
        &self,
        namespace: &str,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<ServiceRecord>>;

    async fn list_runtimes(&self, namespace: &str) -> Result<Vec<RuntimeSpec>>;
}
