use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::SynthesisError;

/// Standard inference-serving port. The generation endpoint always uses it;
/// the port in its resolved URL is ignored.
pub const GENERATION_PORT: u16 = 8080;

pub const DETECTOR_TYPE: &str = "text_contents";
pub const DEFAULT_CHUNKER_ID: &str = "whole_doc_chunker";
pub const DEFAULT_THRESHOLD: f64 = 0.5;

pub const BUILTIN_DETECTOR_NAME: &str = "regex";
pub const BUILTIN_DETECTOR_HOST: &str = "127.0.0.1";
pub const BUILTIN_DETECTOR_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEndpoint {
    pub hostname: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorEntry {
    pub name: String,
    pub service: ServiceEndpoint,
    pub chunker_id: String,
    pub default_threshold: f64,
}

impl DetectorEntry {
    pub fn new(name: impl Into<String>, service: ServiceEndpoint) -> Self {
        Self {
            name: name.into(),
            service,
            chunker_id: DEFAULT_CHUNKER_ID.to_string(),
            default_threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_DETECTOR_NAME,
            ServiceEndpoint::new(BUILTIN_DETECTOR_HOST, BUILTIN_DETECTOR_PORT),
        )
    }
}

/// Orchestrator configuration: one generation endpoint plus the detectors,
/// kept in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub generation: ServiceEndpoint,
    detectors: Vec<DetectorEntry>,
}

impl ConfigDocument {
    pub fn new(generation: ServiceEndpoint) -> Self {
        Self {
            generation,
            detectors: Vec::new(),
        }
    }

    /// Appends a detector. An entry with the same name is replaced in place.
    pub fn push_detector(&mut self, entry: DetectorEntry) {
        match self.detectors.iter_mut().find(|d| d.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.detectors.push(entry),
        }
    }

    /// Appends the fixed built-in detector as the last entry, displacing any
    /// discovered detector that shares its name.
    pub fn push_builtin_detector(&mut self) {
        self.detectors.retain(|d| d.name != BUILTIN_DETECTOR_NAME);
        self.detectors.push(DetectorEntry::builtin());
    }

    pub fn detectors(&self) -> &[DetectorEntry] {
        &self.detectors
    }

    pub fn detector(&self, name: &str) -> Option<&DetectorEntry> {
        self.detectors.iter().find(|d| d.name == name)
    }

    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name.as_str()).collect()
    }

    pub fn to_yaml(&self) -> Result<String, SynthesisError> {
        serde_yaml::to_string(self).map_err(SynthesisError::Serialization)
    }
}

impl Serialize for ConfigDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("ConfigDocument", 2)?;
        doc.serialize_field(
            "chat_generation",
            &GenerationBlock {
                service: &self.generation,
            },
        )?;
        doc.serialize_field("detectors", &DetectorMap(&self.detectors))?;
        doc.end()
    }
}

#[derive(Serialize)]
struct GenerationBlock<'a> {
    service: &'a ServiceEndpoint,
}

struct DetectorMap<'a>(&'a [DetectorEntry]);

impl Serialize for DetectorMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(
                &entry.name,
                &DetectorBlock {
                    kind: DETECTOR_TYPE,
                    service: &entry.service,
                    chunker_id: &entry.chunker_id,
                    default_threshold: entry.default_threshold,
                },
            )?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct DetectorBlock<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    service: &'a ServiceEndpoint,
    chunker_id: &'a str,
    default_threshold: f64,
}
