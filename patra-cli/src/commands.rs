//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use anyhow::{Context, bail};
use patra_core::analyzers::{DependencyInspector, PipDependencyInspector};
use patra_core::card::filter_requirements;
use patra_core::config::workspace_config_path;
use patra_core::{ModelCard, PatraConfig, PythonRuntime, RegistryClient, SchemaValidator};
use std::path::Path;
use std::time::Duration;

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file } => handle_validate(&file),
        Commands::Submit { file, endpoint } => {
            let config = load_config(workspace)?;
            handle_submit(&file, endpoint, &config).await
        }
        Commands::Fmt { file, write } => handle_fmt(&file, write),
        Commands::Requirements => handle_requirements(workspace).await,
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load_config(workspace: &Path) -> anyhow::Result<PatraConfig> {
    patra_core::load_config(Some(workspace)).context("Failed to load config")
}

fn handle_validate(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let validator = SchemaValidator::bundled()?;
    match validator.first_violation(&document) {
        None => {
            println!("{}: valid", file.display());
            Ok(())
        }
        Some(message) => bail!("{}: {}", file.display(), message),
    }
}

async fn handle_submit(
    file: &Path,
    endpoint: Option<String>,
    config: &PatraConfig,
) -> anyhow::Result<()> {
    let Some(endpoint) = endpoint.or_else(|| config.registry.url.clone()) else {
        bail!("No registry endpoint: pass --endpoint or set registry.url in config");
    };

    let card = ModelCard::load(file)
        .with_context(|| format!("Failed to load model card {}", file.display()))?;
    let client = RegistryClient::with_timeout(Duration::from_secs(config.registry.timeout_secs))?;

    match client.submit(&card, &endpoint).await? {
        Some(reply) => {
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
        None => bail!("Model card was not submitted (see log above)"),
    }
}

fn handle_fmt(file: &Path, write: bool) -> anyhow::Result<()> {
    let card = ModelCard::load(file)
        .with_context(|| format!("Failed to load model card {}", file.display()))?;
    if write {
        card.save(file)?;
        println!("Formatted {}", file.display());
    } else {
        println!("{card}");
    }
    Ok(())
}

async fn handle_requirements(workspace: &Path) -> anyhow::Result<()> {
    let config = load_config(workspace)?;
    let runtime = PythonRuntime::from_config(&config.python, workspace.to_path_buf());
    let installed = PipDependencyInspector::new(runtime)
        .installed_packages()
        .await?;
    for spec in filter_requirements(installed) {
        println!("{spec}");
    }
    Ok(())
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            let toml_str = toml::to_string_pretty(&PatraConfig::default())?;
            patra_core::persistence::atomic_write(&config_path, toml_str.as_bytes())?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(workspace)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
