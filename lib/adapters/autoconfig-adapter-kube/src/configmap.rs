use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};

use autoconfig_domain::GeneratedArtifact;

/// Renders an artifact as the `ConfigMap` handed to the persistence layer.
pub fn to_config_map(artifact: &GeneratedArtifact) -> ConfigMap {
    let owner = &artifact.owner;
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(artifact.name.clone()),
            namespace: Some(artifact.namespace.clone()),
            owner_references: Some(vec![OwnerReference {
                api_version: owner.api_version.clone(),
                kind: owner.kind.clone(),
                name: owner.name.clone(),
                uid: owner.uid.clone(),
                controller: Some(owner.controller),
                block_owner_deletion: Some(owner.block_owner_deletion),
            }]),
            ..ObjectMeta::default()
        },
        data: Some(artifact.data.clone()),
        ..ConfigMap::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoconfig_domain::{
        CONFIG_KEY, ConfigDocument, DetectorEntry, OwnerObject, ServiceEndpoint,
    };

    #[test]
    fn config_map_carries_payload_and_owner() {
        let mut document = ConfigDocument::new(ServiceEndpoint::new("llm", 8080));
        document.push_detector(DetectorEntry::new("hap", ServiceEndpoint::new("hap", 8001)));
        let owner = OwnerObject {
            api_version: "trustyai.opendatahub.io/v1alpha1".to_string(),
            kind: "GuardrailsOrchestrator".to_string(),
            name: "orch".to_string(),
            namespace: Some("ns".to_string()),
            uid: Some("uid-1".to_string()),
        };
        let artifact = GeneratedArtifact::wrap("orch", "ns", &document, &owner).unwrap();

        let cm = to_config_map(&artifact);
        assert_eq!(cm.metadata.name.as_deref(), Some("orch-auto-config"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("ns"));

        let refs = cm.metadata.owner_references.unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].uid, "uid-1");
        assert_eq!(refs[0].controller, Some(true));
        assert_eq!(refs[0].block_owner_deletion, Some(true));

        let data = cm.data.unwrap();
        assert_eq!(data.keys().collect::<Vec<_>>(), vec![CONFIG_KEY]);
        assert!(data[CONFIG_KEY].contains("hap:"));
    }
}
