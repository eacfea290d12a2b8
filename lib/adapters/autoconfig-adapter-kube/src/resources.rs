//! KServe and TrustyAI resource types, read through the dynamic API.

use anyhow::{Context, Result};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use serde::Deserialize;
use tracing::warn;

use autoconfig_domain::{RuntimeSpec, ServiceRecord};

pub fn inference_service() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "serving.kserve.io",
        "v1beta1",
        "InferenceService",
    ))
}

pub fn serving_runtime() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "serving.kserve.io",
        "v1alpha1",
        "ServingRuntime",
    ))
}

pub fn guardrails_orchestrator() -> ApiResource {
    ApiResource::from_gvk(&GroupVersionKind::gvk(
        "trustyai.opendatahub.io",
        "v1alpha1",
        "GuardrailsOrchestrator",
    ))
}

#[derive(Debug, Default, Deserialize)]
struct InferenceServiceBody {
    spec: Option<InferenceServiceSpec>,
    status: Option<InferenceServiceStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceServiceSpec {
    predictor: Option<PredictorSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct PredictorSpec {
    model: Option<ModelSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct ModelSpec {
    runtime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InferenceServiceStatus {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServingRuntimeBody {
    spec: Option<ServingRuntimeSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct ServingRuntimeSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Default, Deserialize)]
struct Container {
    #[serde(default)]
    ports: Vec<ContainerPort>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerPort {
    container_port: i32,
}

pub fn service_record(obj: &DynamicObject) -> Result<ServiceRecord> {
    let name = object_name(obj)?;
    let body: InferenceServiceBody = serde_json::from_value(obj.data.clone())
        .with_context(|| format!("malformed InferenceService {name:?}"))?;

    Ok(ServiceRecord {
        resolved_url: body
            .status
            .and_then(|status| status.url)
            .filter(|url| !url.is_empty()),
        runtime_ref: body
            .spec
            .and_then(|spec| spec.predictor)
            .and_then(|predictor| predictor.model)
            .and_then(|model| model.runtime),
        labels: obj.metadata.labels.clone().unwrap_or_default(),
        name,
    })
}

pub fn runtime_spec(obj: &DynamicObject) -> Result<RuntimeSpec> {
    let name = object_name(obj)?;
    let body: ServingRuntimeBody = serde_json::from_value(obj.data.clone())
        .with_context(|| format!("malformed ServingRuntime {name:?}"))?;

    let container_ports = body
        .spec
        .map(|spec| spec.containers)
        .unwrap_or_default()
        .into_iter()
        .flat_map(|container| container.ports)
        .filter_map(|port| match u16::try_from(port.container_port) {
            Ok(port) => Some(port),
            Err(_) => {
                warn!(
                    runtime = %name,
                    port = port.container_port,
                    "Ignoring out-of-range container port"
                );
                None
            }
        })
        .collect();

    Ok(RuntimeSpec {
        name,
        container_ports,
    })
}

fn object_name(obj: &DynamicObject) -> Result<String> {
    obj.metadata
        .name
        .clone()
        .context("object has no metadata.name")
}
