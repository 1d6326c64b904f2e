use std::path::Path;

use anyhow::{anyhow, Context, Result};
use comfy_table::Table;

use crate::cli::HistoryArgs;
use crate::domain::models::IncidentType;
use crate::domain::ports::ExperienceRepository;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{DatabaseConnection, ExperienceRepositoryImpl};

/// Handle the `history` command.
pub async fn execute(args: HistoryArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
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

    let experiences = store
        .recent(incident_type, args.limit)
        .await
        .context("Failed to load experiences")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&experiences)?);
        return Ok(());
    }

    if experiences.is_empty() {
        println!("No experiences recorded yet. Run a learning session first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Cycle",
        "Incident",
        "Severity",
        "Strategy",
        "Reward",
        "Restored",
        "Mode",
        "Recorded",
    ]);
    for exp in &experiences {
        table.add_row(vec![
            exp.cycle_index.to_string(),
            exp.incident_type.to_string(),
            exp.severity.to_string(),
            exp.strategy_used.clone(),
            format!("{:.2}", exp.final_reward),
            if exp.service_restored { "yes" } else { "no" }.to_string(),
            if exp.explored { "explore" } else { "exploit" }.to_string(),
            exp.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    println!("{table}");
    println!(
        "\nShowing {} experience{}",
        experiences.len(),
        if experiences.len() == 1 { "" } else { "s" }
    );

    database.close().await;
    Ok(())
}
