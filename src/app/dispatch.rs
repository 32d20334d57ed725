use crate::app::status::render_stats;
use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, bail};
use dialoguer::Password;
use herald::config::{Config, PlatformConfig, PlatformsFile};
use herald::daemon::Heartbeat;
use herald::engine::Agent;
use std::io::IsTerminal;
use tokio::sync::watch;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Run => run_heartbeats(config, None).await,
        Commands::Once => run_heartbeats(config, Some(1)).await,
        Commands::Stats => {
            println!("{}", render_stats(&config));
            Ok(())
        }
        Commands::Init {
            platform,
            base_url,
            api_key,
            username,
        } => init_platform(&config, &platform, &base_url, api_key, username),
    }
}

async fn run_heartbeats(config: Config, max_cycles: Option<u64>) -> Result<()> {
    PlatformsFile::require_enabled(&config.platforms_path())?;

    let mut heartbeat = Heartbeat::new(Agent::from_config(config)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested, finishing the current heartbeat");
            let _ = shutdown_tx.send(true);
        }
    });

    let cycles = heartbeat.run(max_cycles, shutdown_rx).await;
    let state = &heartbeat.ledger().state;
    println!(
        "Completed {cycles} heartbeat(s); {} total, {} recent errors.",
        state.cycle_count,
        state.recent_errors.len()
    );
    Ok(())
}

fn init_platform(
    config: &Config,
    platform: &str,
    base_url: &str,
    api_key: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let parsed = url::Url::parse(base_url)
        .with_context(|| format!("invalid --base-url: {base_url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("--base-url must be http or https, got {}", parsed.scheme());
    }

    let api_key = match api_key {
        Some(key) => Some(key),
        None => {
            if !std::io::stdin().is_terminal() {
                bail!("--api-key is required in non-interactive mode");
            }
            let key = Password::new()
                .with_prompt(format!("API key for '{platform}' (input hidden, empty for none)"))
                .allow_empty_password(true)
                .interact()
                .context("Failed to read API key from terminal")?;
            Some(key)
        }
    }
    .map(|key| key.trim().to_string())
    .filter(|key| !key.is_empty());

    let path = config.platforms_path();
    let mut file = PlatformsFile::load(&path)
        .with_context(|| format!("failed reading platform config {}", path.display()))?;
    let mut entry = PlatformConfig::new(platform, base_url, api_key);
    entry.username = username.filter(|name| !name.trim().is_empty());
    file.upsert(entry);
    file.save(&path)?;

    println!("✓ Platform '{platform}' saved to {}", path.display());
    Ok(())
}
