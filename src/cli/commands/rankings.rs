use std::path::Path;

use anyhow::{anyhow, Context, Result};
use comfy_table::Table;

use crate::cli::RankingsArgs;
use crate::domain::models::IncidentType;
use crate::domain::ports::ExperienceRepository;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{DatabaseConnection, ExperienceRepositoryImpl};

/// Handle the `rankings` command.
pub async fn execute(args: RankingsArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let incident_type = args
        .incident_type
        .as_deref()
        .map(|raw| {
            IncidentType::parse_str(raw).ok_or_else(|| anyhow!("unknown incident type '{raw}'"))
        })
        .transpose()?;

    let database =
        DatabaseConnection::open(&config.database.path, config.database.max_connections)
            .await
            .context("Failed to open experience database")?;
    let store = ExperienceRepositoryImpl::new(database.pool().clone());

    let mut rankings = store.rankings().await.context("Failed to load rankings")?;
    if let Some(ty) = incident_type {
        rankings.retain(|r| r.incident_type == ty);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rankings)?);
        return Ok(());
    }

    if rankings.is_empty() {
        println!("No strategy records yet. Run a learning session first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Incident Type",
        "Strategy",
        "Uses",
        "Success Rate",
        "Avg Reward",
        "Best",
        "Worst",
    ]);
    for record in &rankings {
        table.add_row(vec![
            record.incident_type.to_string(),
            record.strategy.clone(),
            record.total_uses.to_string(),
            format!("{:.1}%", record.success_rate() * 100.0),
            format!("{:.2}", record.average_reward),
            format!("{:.2}", record.best_reward),
            format!("{:.2}", record.worst_reward),
        ]);
    }
    println!("{table}");

    database.close().await;
    Ok(())
}
