use std::sync::Arc;

use tracing::{debug, info, warn};

use autoconfig_domain::{
    ConfigDocument, DetectorEntry, GENERATION_PORT, GeneratedArtifact, LabelSelector,
    OwnerObject, RuntimeSpec, ServiceEndpoint, ServiceRecord, SynthesisError,
};
use autoconfig_ports::DirectoryPort;

#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub orchestrator_name: &'a str,
    pub namespace: &'a str,
    pub generation_service: &'a str,
    pub include_builtin_detectors: bool,
    pub owner: &'a OwnerObject,
}

/// Builds orchestrator configuration from what the directory currently
/// advertises. Holds no state between calls.
#[derive(Clone)]
pub struct ConfigSynthesizer {
    directory: Arc<dyn DirectoryPort>,
}

impl ConfigSynthesizer {
    pub fn new(directory: Arc<dyn DirectoryPort>) -> Self {
        Self { directory }
    }

    /// Synthesizes the document and wraps it as an artifact owned by
    /// `request.owner`.
    pub async fn generate_artifact(
        &self,
        request: &SynthesisRequest<'_>,
    ) -> Result<GeneratedArtifact, SynthesisError> {
        info!(
            orchestrator = request.orchestrator_name,
            namespace = request.namespace,
            generation_service = request.generation_service,
            include_builtin_detectors = request.include_builtin_detectors,
            "Starting automatic orchestrator config generation"
        );

        let document = self
            .synthesize(
                request.namespace,
                request.generation_service,
                request.include_builtin_detectors,
            )
            .await?;
        let artifact = GeneratedArtifact::wrap(
            request.orchestrator_name,
            request.namespace,
            &document,
            request.owner,
        )?;

        info!(
            artifact = %artifact.name,
            namespace = %artifact.namespace,
            "Generated orchestrator config artifact"
        );
        Ok(artifact)
    }

    pub async fn synthesize(
        &self,
        namespace: &str,
        generation_service: &str,
        include_builtin_detectors: bool,
    ) -> Result<ConfigDocument, SynthesisError> {
        let generation = self
            .resolve_generation(namespace, generation_service)
            .await?;
        let detectors = self.discover_detectors(namespace).await?;
        let runtimes = self
            .directory
            .list_runtimes(namespace)
            .await
            .map_err(|source| SynthesisError::DirectoryQueryFailed {
                operation: "listing serving runtimes",
                namespace: namespace.to_string(),
                source,
            })?;

        let mut document = ConfigDocument::new(generation);
        for detector in &detectors {
            if let Some(entry) = cross_reference(detector, &runtimes) {
                document.push_detector(entry);
            }
        }
        info!(
            namespace,
            discovered = detectors.len(),
            resolved = document.detectors().len(),
            detectors = ?document.detector_names(),
            "Detector services resolved"
        );

        if include_builtin_detectors {
            document.push_builtin_detector();
        }

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(yaml) = document.to_yaml() {
                debug!(config = %yaml, "Generated config.yaml");
            }
        }
        Ok(document)
    }

    async fn resolve_generation(
        &self,
        namespace: &str,
        service: &str,
    ) -> Result<ServiceEndpoint, SynthesisError> {
        let services = self
            .directory
            .list_services(namespace, None)
            .await
            .map_err(|source| SynthesisError::DirectoryQueryFailed {
                operation: "listing services",
                namespace: namespace.to_string(),
                source,
            })?;

        let hostname = services
            .iter()
            .filter(|record| record.name == service)
            .find_map(ServiceRecord::hostname)
            .ok_or_else(|| SynthesisError::ServiceNotFound {
                service: service.to_string(),
                namespace: namespace.to_string(),
            })?;

        let endpoint = ServiceEndpoint::new(hostname, GENERATION_PORT);
        info!(
            namespace,
            service,
            hostname = %endpoint.hostname,
            port = endpoint.port,
            "Generation service resolved"
        );
        Ok(endpoint)
    }

    async fn discover_detectors(
        &self,
        namespace: &str,
    ) -> Result<Vec<ServiceRecord>, SynthesisError> {
        let selector = LabelSelector::detectors();
        let not_found = |source: Option<anyhow::Error>| SynthesisError::NoDetectorsFound {
            selector: selector.to_string(),
            namespace: namespace.to_string(),
            source,
        };

        let detectors = self
            .directory
            .list_services(namespace, Some(&selector))
            .await
            .map_err(|err| not_found(Some(err)))?;
        if detectors.is_empty() {
            return Err(not_found(None));
        }
        Ok(detectors)
    }
}

/// Pairs a detector with its runtime. `None` means the detector is skipped.
fn cross_reference(detector: &ServiceRecord, runtimes: &[RuntimeSpec]) -> Option<DetectorEntry> {
    let Some(runtime_ref) = detector.runtime_ref.as_deref() else {
        warn!(detector = %detector.name, "Detector has no serving runtime reference, skipping");
        return None;
    };
    let Some(runtime) = runtimes.iter().find(|rt| rt.name == runtime_ref) else {
        warn!(
            detector = %detector.name,
            runtime = runtime_ref,
            "Could not find serving runtime for detector, skipping"
        );
        return None;
    };
    let Some(port) = runtime.primary_port() else {
        warn!(
            detector = %detector.name,
            runtime = runtime_ref,
            "Serving runtime declares no container ports, skipping detector"
        );
        return None;
    };
    let Some(hostname) = detector.hostname() else {
        debug!(detector = %detector.name, "Detector has no resolved URL yet, skipping");
        return None;
    };

    Some(DetectorEntry::new(
        detector.name.clone(),
        ServiceEndpoint::new(hostname, port),
    ))
}
