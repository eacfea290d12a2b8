use std::io::Write;

use autoconfig_adapter_metrics::CounterRegistry;
use guardrails_autoconfig::cli::{generate, generate_counted};
use guardrails_autoconfig::domain::{AutoConfigSettings, CONFIG_KEY};

const SNAPSHOT: &str = r#"
namespaces:
  test-ns:
    services:
      - name: my-generation-service
        resolved_url: https://my-generation-service.test-ns.svc.cluster.local:9999
      - name: hap
        resolved_url: https://hap.test-ns.svc.cluster.local:8443
        runtime_ref: hap-runtime
        labels:
          trustyai/guardrails: "true"
      - name: orphan
        resolved_url: https://orphan.test-ns.svc.cluster.local
        runtime_ref: missing-runtime
        labels:
          trustyai/guardrails: "true"
    runtimes:
      - name: hap-runtime
        container_ports: [8001]
"#;

fn snapshot_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SNAPSHOT.as_bytes()).unwrap();
    file
}

fn settings(file: &tempfile::NamedTempFile) -> AutoConfigSettings {
    AutoConfigSettings {
        namespace: "test-ns".to_string(),
        orchestrator_name: "test-orch".to_string(),
        generation_service: "my-generation-service".to_string(),
        include_builtin_detectors: true,
        snapshot_path: Some(file.path().to_path_buf()),
    }
}

#[tokio::test]
async fn snapshot_generates_owned_config_map() {
    let file = snapshot_file();
    let cm = generate(&settings(&file), Some("uid-1".to_string()))
        .await
        .unwrap();

    assert_eq!(cm.metadata.name.as_deref(), Some("test-orch-auto-config"));
    let owner = &cm.metadata.owner_references.as_ref().unwrap()[0];
    assert_eq!(owner.kind, "GuardrailsOrchestrator");
    assert_eq!(owner.name, "test-orch");
    assert_eq!(owner.uid, "uid-1");

    let yaml = &cm.data.as_ref().unwrap()[CONFIG_KEY];
    let config: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        config["chat_generation"]["service"]["hostname"].as_str(),
        Some("my-generation-service.test-ns.svc.cluster.local")
    );
    assert_eq!(config["chat_generation"]["service"]["port"].as_u64(), Some(8080));

    let detectors = config["detectors"].as_mapping().unwrap();
    let names: Vec<_> = detectors.keys().filter_map(|k| k.as_str()).collect();
    assert_eq!(names, vec!["hap", "regex"]);
    assert_eq!(config["detectors"]["hap"]["service"]["port"].as_u64(), Some(8001));
}

#[tokio::test]
async fn snapshot_mode_without_owner_uid() {
    let file = snapshot_file();
    let cm = generate(&settings(&file), None).await.unwrap();

    assert_eq!(cm.metadata.name.as_deref(), Some("test-orch-auto-config"));
    let owner = &cm.metadata.owner_references.as_ref().unwrap()[0];
    assert_eq!(owner.name, "test-orch");
    assert!(owner.uid.is_empty());
}

#[tokio::test]
async fn outcomes_are_counted() {
    let file = snapshot_file();
    let counters = CounterRegistry::new();

    generate_counted(&counters, &settings(&file), Some("uid-1".to_string()))
        .await
        .unwrap();
    let mut broken = settings(&file);
    broken.generation_service = "absent".to_string();
    generate_counted(&counters, &broken, Some("uid-1".to_string()))
        .await
        .unwrap_err();

    let generated = counters.get_or_create("autoconfig_generated", "").unwrap();
    let failed = counters.get_or_create("autoconfig_failed", "").unwrap();
    assert_eq!(generated.get(), 1);
    assert_eq!(failed.get(), 1);
}
