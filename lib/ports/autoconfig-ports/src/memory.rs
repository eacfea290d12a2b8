use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use autoconfig_domain::{LabelSelector, RuntimeSpec, ServiceRecord};

use crate::DirectoryPort;

/// Serialized directory contents, keyed by namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySnapshot {
    pub namespaces: BTreeMap<String, NamespaceSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSnapshot {
    pub services: Vec<ServiceRecord>,
    pub runtimes: Vec<RuntimeSpec>,
}

impl DirectorySnapshot {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read directory snapshot at {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse directory snapshot at {}", path.display()))
    }
}

/// Directory held in memory. Listing preserves insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    snapshot: Arc<RwLock<DirectorySnapshot>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn insert_service(&self, namespace: &str, service: ServiceRecord) {
        let mut guard = self.write();
        let services = &mut guard
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .services;
        match services.iter_mut().find(|s| s.name == service.name) {
            Some(existing) => *existing = service,
            None => services.push(service),
        }
    }

    pub fn insert_runtime(&self, namespace: &str, runtime: RuntimeSpec) {
        let mut guard = self.write();
        let runtimes = &mut guard
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .runtimes;
        match runtimes.iter_mut().find(|r| r.name == runtime.name) {
            Some(existing) => *existing = runtime,
            None => runtimes.push(runtime),
        }
    }

    /// Each insert leaves the snapshot consistent, so a poisoned lock is
    /// recovered rather than dropping the write.
    fn write(&self) -> RwLockWriteGuard<'_, DirectorySnapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, namespace: &str, f: impl FnOnce(&NamespaceSnapshot) -> T) -> Result<T>
    where
        T: Default,
    {
        let guard = self
            .snapshot
            .read()
            .map_err(|_| anyhow!("in-memory directory lock poisoned"))?;
        Ok(guard.namespaces.get(namespace).map(f).unwrap_or_default())
    }
}

#[async_trait]
impl DirectoryPort for InMemoryDirectory {
    async fn list_services(
        &self,
        namespace: &str,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<ServiceRecord>> {
        self.read(namespace, |ns| {
            ns.services
                .iter()
                .filter(|service| selector.is_none_or(|s| s.matches(&service.labels)))
                .cloned()
                .collect()
        })
    }

    async fn list_runtimes(&self, namespace: &str) -> Result<Vec<RuntimeSpec>> {
        self.read(namespace, |ns| ns.runtimes.clone())
    }
}
