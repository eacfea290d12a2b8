//! Named-counter registry backed by Prometheus.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use prometheus::proto::MetricFamily;
use prometheus::{IntCounter, Opts, Registry};

pub const DEFAULT_PREFIX: &str = "trustyai_";

/// Get-or-create registry of counters keyed by name.
///
/// Each distinct name is created and registered exactly once; later
/// requests return a handle to the same counter. Inject one instance per
/// process rather than reaching for a global.
#[derive(Debug)]
pub struct CounterRegistry {
    prefix: String,
    registry: Registry,
    counters: Mutex<HashMap<String, IntCounter>>,
}

impl CounterRegistry {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self::with_registry(prefix, Registry::new())
    }

    pub fn with_registry(prefix: impl Into<String>, registry: Registry) -> Self {
        Self {
            prefix: prefix.into(),
            registry,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the counter `<prefix><task_name>`, registering it on first use.
    /// `help` is only read when the counter is created.
    pub fn get_or_create(&self, task_name: &str, help: &str) -> Result<IntCounter> {
        let name = format!("{}{task_name}", self.prefix);
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| anyhow!("counter registry lock poisoned"))?;
        if let Some(counter) = counters.get(&name) {
            return Ok(counter.clone());
        }

        let counter = IntCounter::with_opts(Opts::new(name.as_str(), help))
            .with_context(|| format!("invalid counter {name:?}"))?;
        self.registry
            .register(Box::new(counter.clone()))
            .with_context(|| format!("failed to register counter {name:?}"))?;
        tracing::debug!(counter = %name, "Registered counter");
        counters.insert(name, counter.clone());
        Ok(counter)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }
}

impl Default for CounterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
