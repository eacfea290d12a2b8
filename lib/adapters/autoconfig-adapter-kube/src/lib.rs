//! Kubernetes adapters: KServe-backed directory, orchestrator owner lookup
//! and `ConfigMap` rendering of generated artifacts.

mod configmap;
mod directory;
mod owner;
pub mod resources;

pub use configmap::to_config_map;
pub use directory::KubeDirectory;
pub use owner::owner_object;
