//! Domain models for orchestrator auto-configuration.

pub mod artifact;
pub mod config;
pub mod document;
pub mod error;
pub mod service;

pub use artifact::{CONFIG_KEY, GeneratedArtifact, OwnerLink, OwnerObject, artifact_name};
pub use config::AutoConfigSettings;
pub use document::{
    BUILTIN_DETECTOR_HOST, BUILTIN_DETECTOR_NAME, BUILTIN_DETECTOR_PORT, ConfigDocument,
    DEFAULT_CHUNKER_ID, DEFAULT_THRESHOLD, DETECTOR_TYPE, DetectorEntry, GENERATION_PORT,
    ServiceEndpoint,
};
pub use error::SynthesisError;
pub use service::{
    DETECTOR_LABEL_KEY, DETECTOR_LABEL_VALUE, LabelSelector, RuntimeSpec, ServiceRecord,
    hostname_of,
};
