use anyhow::{Context, Result};
use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject};
use tracing::warn;

use autoconfig_domain::{LabelSelector, OwnerObject, RuntimeSpec, ServiceRecord};
use autoconfig_ports::DirectoryPort;

use crate::owner::owner_object;
use crate::resources;

/// Directory backed by the Kubernetes API: KServe `InferenceService`s are
/// services, `ServingRuntime`s are runtimes.
#[derive(Clone)]
pub struct KubeDirectory {
    client: Client,
}

impl KubeDirectory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default()
            .await
            .context("failed to create Kubernetes client")?;
        Ok(Self::new(client))
    }

    /// Fetches the named `GuardrailsOrchestrator` as an owner for generated
    /// artifacts.
    pub async fn orchestrator_owner(&self, namespace: &str, name: &str) -> Result<OwnerObject> {
        let resource = resources::guardrails_orchestrator();
        let api = self.api(namespace, &resource);
        let orchestrator = api.get(name).await.with_context(|| {
            format!("failed to get GuardrailsOrchestrator {name:?} in namespace {namespace:?}")
        })?;
        Ok(owner_object(&orchestrator, &resource))
    }

    fn api(&self, namespace: &str, resource: &ApiResource) -> Api<DynamicObject> {
        Api::namespaced_with(self.client.clone(), namespace, resource)
    }

    async fn list(
        &self,
        namespace: &str,
        resource: &ApiResource,
        params: &ListParams,
    ) -> Result<Vec<DynamicObject>> {
        let list = self
            .api(namespace, resource)
            .list(params)
            .await
            .with_context(|| {
                format!(
                    "failed to list {} in namespace {namespace:?}",
                    resource.plural
                )
            })?;
        Ok(list.items)
    }
}

#[async_trait]
impl DirectoryPort for KubeDirectory {
    async fn list_services(
        &self,
        namespace: &str,
        selector: Option<&LabelSelector>,
    ) -> Result<Vec<ServiceRecord>> {
        let mut params = ListParams::default();
        if let Some(selector) = selector.filter(|s| !s.is_empty()) {
            params = params.labels(&selector.to_string());
        }
        let objects = self
            .list(namespace, &resources::inference_service(), &params)
            .await?;
        Ok(decode_all(&objects, resources::service_record))
    }

    async fn list_runtimes(&self, namespace: &str) -> Result<Vec<RuntimeSpec>> {
        let objects = self
            .list(namespace, &resources::serving_runtime(), &ListParams::default())
            .await?;
        Ok(decode_all(&objects, resources::runtime_spec))
    }
}

/// Decodes each object, dropping the ones that fail with a warning.
fn decode_all<T>(objects: &[DynamicObject], decode: fn(&DynamicObject) -> Result<T>) -> Vec<T> {
    objects
        .iter()
        .filter_map(|obj| match decode(obj) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Skipping undecodable directory object");
                None
            }
        })
        .collect()
}
