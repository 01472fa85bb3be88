use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(config::config()).await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(&output_format, "Migrations applied", None)
}

pub async fn health(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(config::config()).await?;
    let started = std::time::Instant::now();
    DatabaseManager::health_check(&pool).await?;
    output_success(
        &output_format,
        "Database reachable",
        Some(json!({ "latency_ms": started.elapsed().as_millis() as u64 })),
    )
}
