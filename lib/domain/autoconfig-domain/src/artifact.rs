use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::ConfigDocument;
use crate::error::SynthesisError;

/// Key under which the serialized document is stored in the artifact.
pub const CONFIG_KEY: &str = "config.yaml";

const ARTIFACT_SUFFIX: &str = "-auto-config";

pub fn artifact_name(orchestrator_name: &str) -> String {
    format!("{orchestrator_name}{ARTIFACT_SUFFIX}")
}

/// The object a generated artifact is bound to. Deleting it deletes the
/// artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerObject {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// `None` for cluster-scoped owners.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

/// Controller-style ownership reference carried by an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerLink {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// Empty when the owner has not been persisted yet.
    pub uid: String,
    pub controller: bool,
    pub block_owner_deletion: bool,
}

impl OwnerLink {
    /// Builds the controller link from `owner` to an artifact living in
    /// `artifact_namespace`.
    pub fn controller(
        owner: &OwnerObject,
        artifact: &str,
        artifact_namespace: &str,
    ) -> Result<Self, SynthesisError> {
        let fail = |reason: String| SynthesisError::OwnershipLinkFailed {
            artifact: artifact.to_string(),
            reason,
        };

        if owner.api_version.is_empty() || owner.kind.is_empty() {
            return Err(fail(format!(
                "owner {:?} has no registered type (apiVersion/kind missing)",
                owner.name
            )));
        }
        if let Some(owner_ns) = owner.namespace.as_deref() {
            if owner_ns != artifact_namespace {
                return Err(fail(format!(
                    "cross-namespace owner references are disallowed: \
                     owner {}/{} in {owner_ns:?}, artifact in {artifact_namespace:?}",
                    owner.kind, owner.name
                )));
            }
        }

        Ok(Self {
            api_version: owner.api_version.clone(),
            kind: owner.kind.clone(),
            name: owner.name.clone(),
            uid: owner.uid.clone().unwrap_or_default(),
            controller: true,
            block_owner_deletion: true,
        })
    }
}

/// A serialized [`ConfigDocument`] packaged for persistence, bound to its
/// owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedArtifact {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, String>,
    pub owner: OwnerLink,
}

impl GeneratedArtifact {
    pub fn wrap(
        orchestrator_name: &str,
        namespace: &str,
        document: &ConfigDocument,
        owner: &OwnerObject,
    ) -> Result<Self, SynthesisError> {
        let name = artifact_name(orchestrator_name);
        let yaml = document.to_yaml()?;
        let owner = OwnerLink::controller(owner, &name, namespace)?;

        let mut data = BTreeMap::new();
        data.insert(CONFIG_KEY.to_string(), yaml);

        Ok(Self {
            name,
            namespace: namespace.to_string(),
            data,
            owner,
        })
    }

    pub fn config_yaml(&self) -> Option<&str> {
        self.data.get(CONFIG_KEY).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ServiceEndpoint;

    fn owner() -> OwnerObject {
        OwnerObject {
            api_version: "trustyai.opendatahub.io/v1alpha1".to_string(),
            kind: "GuardrailsOrchestrator".to_string(),
            name: "foo".to_string(),
            namespace: Some("ns".to_string()),
            uid: Some("1234".to_string()),
        }
    }

    fn document() -> ConfigDocument {
        ConfigDocument::new(ServiceEndpoint::new("gen", 8080))
    }

    #[test]
    fn artifact_is_named_after_orchestrator() {
        let artifact = GeneratedArtifact::wrap("foo", "ns", &document(), &owner()).unwrap();
        assert_eq!(artifact.name, "foo-auto-config");
        assert_eq!(artifact.namespace, "ns");
        assert!(artifact.config_yaml().unwrap().contains("hostname: gen"));
        assert_eq!(artifact.data.len(), 1);
    }

    #[test]
    fn owner_link_is_controller() {
        let artifact = GeneratedArtifact::wrap("foo", "ns", &document(), &owner()).unwrap();
        assert!(artifact.owner.controller);
        assert!(artifact.owner.block_owner_deletion);
        assert_eq!(artifact.owner.uid, "1234");
        assert_eq!(artifact.owner.kind, "GuardrailsOrchestrator");
    }

    #[test]
    fn cluster_scoped_owner_is_accepted() {
        let mut owner = owner();
        owner.namespace = None;
        assert!(OwnerLink::controller(&owner, "a", "any").is_ok());
    }

    #[test]
    fn owner_without_uid_is_linked_as_given() {
        let mut owner = owner();
        owner.uid = None;
        let artifact = GeneratedArtifact::wrap("test-orch", "ns", &document(), &owner).unwrap();
        assert_eq!(artifact.name, "test-orch-auto-config");
        assert_eq!(artifact.owner.uid, "");
        assert_eq!(artifact.owner.name, "foo");
        assert!(artifact.owner.controller);
    }

    #[test]
    fn link_rejects_unregistered_owner_types() {
        let mut no_kind = owner();
        no_kind.kind.clear();
        let mut no_api_version = owner();
        no_api_version.api_version.clear();

        for broken in [no_kind, no_api_version] {
            let err = GeneratedArtifact::wrap("foo", "ns", &document(), &broken).unwrap_err();
            assert!(matches!(err, SynthesisError::OwnershipLinkFailed { .. }), "{err}");
        }
    }

    #[test]
    fn link_rejects_cross_namespace_owner() {
        let err = GeneratedArtifact::wrap("foo", "other", &document(), &owner()).unwrap_err();
        match err {
            SynthesisError::OwnershipLinkFailed { artifact, reason } => {
                assert_eq!(artifact, "foo-auto-config");
                assert!(reason.contains("cross-namespace"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
