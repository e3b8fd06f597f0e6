mod backup;
mod config;
mod fetch;
mod models;
mod nautobot;
mod parser;
mod utils;
mod workflow;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backup::BackupWriter;
use config::{Config, Inventory};
use fetch::FetchMethod;
use nautobot::NautobotClient;
use workflow::Workflow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nautobot_backup=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let cfg = Config::load();
    if cfg.nautobot_token.is_empty() {
        tracing::warn!("NAUTOBOT_TOKEN not set - Nautobot requests will be rejected");
    }
    tracing::info!("Starting Nautobot backup run");
    tracing::info!("Nautobot: {}", cfg.nautobot_url);
    tracing::info!("Backup repository: {}", cfg.backup_repo_path);
    tracing::info!("Fetch method: {}", cfg.fetch_method);

    let inventory = Inventory::load(&cfg.inventory_file)?;
    tracing::info!("Loaded {} devices from {}", inventory.devices.len(), cfg.inventory_file);

    let nautobot = NautobotClient::new(cfg.nautobot_url.clone(), cfg.nautobot_token.clone())?;
    if !nautobot.test_connection().await {
        tracing::warn!("Nautobot at {} is not reachable; API steps will fail", cfg.nautobot_url);
    }

    let backup = BackupWriter::new(
        &cfg.backup_repo_path,
        &cfg.commit_message_prefix,
        cfg.backup_remote_url.clone(),
    );
    backup.prepare().await;

    // An unknown method is not fatal: every device gets skipped with a warning
    let source = match cfg.fetch_method.parse::<FetchMethod>() {
        Ok(method) => Some(fetch::build_source(method, &cfg)?),
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    };

    let workflow = Workflow::new(source, Arc::new(nautobot), backup, inventory.profile);
    let report = workflow.run(&inventory.devices).await;
    report.log_summary();

    Ok(())
}
