use thiserror::Error;

/// Failures that abort a synthesis run. No partial document accompanies any
/// of them.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("could not find ready service {service:?} in namespace {namespace:?}")]
    ServiceNotFound { service: String, namespace: String },

    #[error("directory query failed while {operation} in namespace {namespace:?}")]
    DirectoryQueryFailed {
        operation: &'static str,
        namespace: String,
        #[source]
        source: anyhow::Error,
    },

    /// Raised both for an empty detector listing and for a failed one.
    #[error("could not find detector services matching {selector:?} in namespace {namespace:?}")]
    NoDetectorsFound {
        selector: String,
        namespace: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("failed to link artifact {artifact:?} to its owner: {reason}")]
    OwnershipLinkFailed { artifact: String, reason: String },

    #[error("failed to serialize orchestrator config: {0}")]
    Serialization(#[source] serde_yaml::Error),
}

impl SynthesisError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ServiceNotFound { .. } => "service_not_found",
            Self::DirectoryQueryFailed { .. } => "directory_query_failed",
            Self::NoDetectorsFound { .. } => "no_detectors_found",
            Self::OwnershipLinkFailed { .. } => "ownership_link_failed",
            Self::Serialization(_) => "serialization",
        }
    }
}
