use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use k8s_openapi::api::core::v1::ConfigMap;
use tracing::{error, info};

use autoconfig_adapter_kube::{KubeDirectory, resources, to_config_map};
use autoconfig_adapter_metrics::CounterRegistry;
use autoconfig_application::{ConfigSynthesizer, SynthesisRequest};
use autoconfig_domain::{AutoConfigSettings, OwnerObject};
use autoconfig_ports::{DirectorySnapshot, InMemoryDirectory};

#[derive(Debug, Parser)]
#[command(name = "autoconfig", version, about = "Generate guardrails orchestrator configuration")]
pub struct Cli {
    /// Settings file (YAML).
    #[arg(long, global = true, env = "AUTOCONFIG_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synthesize the orchestrator ConfigMap and print it as YAML.
    Generate(GenerateArgs),
}

#[derive(Debug, Default, Args)]
pub struct GenerateArgs {
    #[arg(long, short = 'n', env = "AUTOCONFIG_NAMESPACE")]
    pub namespace: Option<String>,

    /// Name of the owning GuardrailsOrchestrator.
    #[arg(long, env = "AUTOCONFIG_ORCHESTRATOR")]
    pub orchestrator: Option<String>,

    /// InferenceService serving the generation model.
    #[arg(long, env = "AUTOCONFIG_GENERATION_SERVICE")]
    pub generation_service: Option<String>,

    /// Append the built-in regex detector. `--builtin-detectors false`
    /// turns off a value set in the settings file.
    #[arg(
        long,
        env = "AUTOCONFIG_BUILTIN_DETECTORS",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub builtin_detectors: Option<bool>,

    /// Read services and runtimes from a YAML snapshot instead of the cluster.
    #[arg(long, env = "AUTOCONFIG_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Owner uid to use in snapshot mode.
    #[arg(long, requires = "snapshot", env = "AUTOCONFIG_OWNER_UID")]
    pub owner_uid: Option<String>,
}

impl GenerateArgs {
    /// Layers flags over the settings file.
    pub fn resolve(&self, config: Option<&Path>) -> Result<(AutoConfigSettings, Option<String>)> {
        let mut settings = match config {
            Some(path) => AutoConfigSettings::load_from_path(path)?,
            None => AutoConfigSettings::default(),
        };

        if let Some(namespace) = &self.namespace {
            settings.namespace.clone_from(namespace);
        }
        if let Some(orchestrator) = &self.orchestrator {
            settings.orchestrator_name.clone_from(orchestrator);
        }
        if let Some(service) = &self.generation_service {
            settings.generation_service.clone_from(service);
        }
        if let Some(builtin) = self.builtin_detectors {
            settings.include_builtin_detectors = builtin;
        }
        if let Some(snapshot) = &self.snapshot {
            settings.snapshot_path = Some(snapshot.clone());
        }

        settings.validate()?;
        Ok((settings, self.owner_uid.clone()))
    }
}

/// Settings file location: explicit flag/env first, then
/// `$HOME/.autoconfig/config.yaml` when it exists.
pub fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    let home = env::var("HOME").ok()?;
    let path = Path::new(&home).join(".autoconfig").join("config.yaml");
    path.exists().then_some(path)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = config_path(cli.config);
    match cli.command {
        Command::Generate(args) => {
            let (settings, owner_uid) = args.resolve(config.as_deref())?;
            let counters = CounterRegistry::new();
            let config_map = generate_counted(&counters, &settings, owner_uid).await?;
            print!("{}", serde_yaml::to_string(&config_map)?);
            Ok(())
        }
    }
}

/// Runs [`generate`], recording the outcome in `counters`.
pub async fn generate_counted(
    counters: &CounterRegistry,
    settings: &AutoConfigSettings,
    owner_uid: Option<String>,
) -> Result<ConfigMap> {
    let generated = counters.get_or_create(
        "autoconfig_generated",
        "Number of orchestrator configs generated",
    )?;
    let failed = counters.get_or_create(
        "autoconfig_failed",
        "Number of orchestrator config generations that failed",
    )?;

    let result = generate(settings, owner_uid).await;
    match &result {
        Ok(_) => generated.inc(),
        Err(err) => {
            failed.inc();
            error!(error = %format!("{err:#}"), "Orchestrator config generation failed");
        }
    }
    info!(
        generated = generated.get(),
        failed = failed.get(),
        "Orchestrator config generation finished"
    );
    result
}

pub async fn generate(
    settings: &AutoConfigSettings,
    owner_uid: Option<String>,
) -> Result<ConfigMap> {
    let (synthesizer, owner) = match &settings.snapshot_path {
        Some(path) => {
            let snapshot = DirectorySnapshot::load_from_path(path)?;
            let directory = InMemoryDirectory::from_snapshot(snapshot);
            let resource = resources::guardrails_orchestrator();
            let owner = OwnerObject {
                api_version: resource.api_version,
                kind: resource.kind,
                name: settings.orchestrator_name.clone(),
                namespace: Some(settings.namespace.clone()),
                uid: owner_uid,
            };
            (ConfigSynthesizer::new(Arc::new(directory)), owner)
        }
        None => {
            let directory = KubeDirectory::try_default().await?;
            let owner = directory
                .orchestrator_owner(&settings.namespace, &settings.orchestrator_name)
                .await?;
            (ConfigSynthesizer::new(Arc::new(directory)), owner)
        }
    };

    let request = SynthesisRequest {
        orchestrator_name: &settings.orchestrator_name,
        namespace: &settings.namespace,
        generation_service: &settings.generation_service,
        include_builtin_detectors: settings.include_builtin_detectors,
        owner: &owner,
    };
    let artifact = synthesizer
        .generate_artifact(&request)
        .await
        .with_context(|| {
            format!(
                "failed to generate config for orchestrator {:?}",
                settings.orchestrator_name
            )
        })?;
    Ok(to_config_map(&artifact))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn flags_override_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "namespace: from-file\norchestrator_name: orch\ngeneration_service: llm"
        )
        .unwrap();

        let args = GenerateArgs {
            namespace: Some("from-flag".to_string()),
            builtin_detectors: Some(true),
            ..GenerateArgs::default()
        };
        let (settings, owner_uid) = args.resolve(Some(file.path())).unwrap();
        assert_eq!(settings.namespace, "from-flag");
        assert_eq!(settings.orchestrator_name, "orch");
        assert_eq!(settings.generation_service, "llm");
        assert!(settings.include_builtin_detectors);
        assert!(owner_uid.is_none());
    }

    #[test]
    fn builtin_detectors_can_be_switched_off() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "namespace: ns\norchestrator_name: orch\ngeneration_service: llm\ninclude_builtin_detectors: true"
        )
        .unwrap();

        let cli = Cli::try_parse_from(["autoconfig", "generate", "--builtin-detectors", "false"])
            .unwrap();
        let Command::Generate(args) = cli.command;
        assert_eq!(args.builtin_detectors, Some(false));

        let (settings, _) = args.resolve(Some(file.path())).unwrap();
        assert!(!settings.include_builtin_detectors);

        let (settings, _) = GenerateArgs::default().resolve(Some(file.path())).unwrap();
        assert!(settings.include_builtin_detectors);
    }

    #[test]
    fn incomplete_settings_are_rejected() {
        let args = GenerateArgs {
            namespace: Some("ns".to_string()),
            ..GenerateArgs::default()
        };
        assert!(args.resolve(None).is_err());
    }

    #[test]
    fn parses_generate_command() {
        let cli = Cli::try_parse_from([
            "autoconfig",
            "generate",
            "-n",
            "test-ns",
            "--orchestrator",
            "orch",
            "--generation-service",
            "llm",
            "--builtin-detectors",
            "--snapshot",
            "dir.yaml",
            "--owner-uid",
            "uid-1",
        ])
        .unwrap();
        let Command::Generate(args) = cli.command;
        assert_eq!(args.namespace.as_deref(), Some("test-ns"));
        assert_eq!(args.builtin_detectors, Some(true));
        assert_eq!(args.owner_uid.as_deref(), Some("uid-1"));
    }

    #[test]
    fn owner_uid_requires_snapshot() {
        let parsed = Cli::try_parse_from([
            "autoconfig",
            "generate",
            "--owner-uid",
            "uid-1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = PathBuf::from("/tmp/explicit.yaml");
        assert_eq!(config_path(Some(path.clone())), Some(path));
    }
}
