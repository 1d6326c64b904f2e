use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use console::style;

use crate::cli::RunArgs;
use crate::domain::models::{Config, IncidentType};
use crate::domain::ports::{JudgmentOracle, NullOracle};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::database::{DatabaseConnection, ExperienceRepositoryImpl};
use crate::infrastructure::oracle::HttpOracle;
use crate::infrastructure::simulation::SimulatedProduction;
use crate::services::control_loop::{CycleOutcome, LearningLoop, SessionSummary};

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn parse_incident_type(raw: &str) -> Result<IncidentType> {
    IncidentType::parse_str(raw).ok_or_else(|| {
        anyhow!(
            "unknown incident type '{raw}' (expected one of: {})",
            IncidentType::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

/// Handle the `run` command.
pub async fn execute(args: RunArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(cycles) = args.cycles {
        config.learning.max_cycles = cycles;
    }
    if let Some(seed) = args.seed {
        config.learning.seed = Some(seed);
    }
    let incident_type = args
        .incident_type
        .as_deref()
        .map(parse_incident_type)
        .transpose()?;

    let database =
        DatabaseConnection::open(&config.database.path, config.database.max_connections)
            .await
            .context("Failed to open experience database")?;
    let store = Arc::new(ExperienceRepositoryImpl::new(database.pool().clone()));

    let mut simulation = SimulatedProduction::new(config.learning.seed);
    if let Some(ty) = incident_type {
        simulation = simulation.with_incident_type(ty);
    }
    let simulation = Arc::new(simulation);

    let oracle: Arc<dyn JudgmentOracle> = if config.oracle.enabled {
        Arc::new(HttpOracle::new(&config.oracle).context("Failed to build oracle client")?)
    } else {
        Arc::new(NullOracle)
    };

    let mut learning_loop = LearningLoop::new(
        &config,
        simulation.clone(),
        simulation,
        oracle,
        store,
    );

    if !json {
        println!(
            "{} {} cycles, epsilon {:.2}, store {}",
            style("mender session:").cyan().bold(),
            config.learning.max_cycles,
            config.learning.epsilon_initial,
            config.database.path,
        );
    }

    let mut outcomes = Vec::new();
    while let Some(outcome) = learning_loop.run_cycle().await? {
        if !json {
            print_cycle(&outcome);
        }
        outcomes.push(outcome);
    }

    let summary = learning_loop.summary().await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "cycles": outcomes,
                "summary": summary,
            }))?
        );
    } else {
        print_summary(&summary);
    }

    database.close().await;
    Ok(())
}

fn print_cycle(outcome: &CycleOutcome) {
    let mode = if outcome.explored {
        style("explore").yellow()
    } else {
        style("exploit").green()
    };
    let restored = if outcome.service_restored {
        style("restored").green().bold()
    } else {
        style("not restored").red().bold()
    };
    println!(
        "{} {} [{}] {} via {} ({mode}, eps {:.3})",
        style(format!("[{}]", outcome.cycle_index + 1)).dim(),
        outcome.incident_id,
        outcome.severity,
        outcome.incident_type,
        style(&outcome.strategy).bold(),
        outcome.epsilon,
    );
    if !outcome.actions_skipped.is_empty() {
        println!(
            "    {} {}",
            style("blocked:").red(),
            outcome.actions_skipped.join(", ")
        );
    }
    println!(
        "    {restored}  reward {:.2} (numeric {:.2} {:+.2} judge)  recovery {:.1}s  cost ${:.2}",
        outcome.final_reward,
        outcome.numeric_reward,
        outcome.judged_adjustment,
        outcome.recovery_time_seconds,
        outcome.cost,
    );
}

fn print_summary(summary: &SessionSummary) {
    println!();
    println!("{}", style("session summary").cyan().bold());
    println!("  cycles:           {}", summary.cycles_completed);
    println!("  final epsilon:    {:.3}", summary.final_epsilon);
    println!(
        "  success rate:     {:.1}% ({}/{} restored)",
        summary.store.success_rate * 100.0,
        summary.store.successes,
        summary.store.total_experiences,
    );
    println!(
        "  average reward:   {:.2} (best {:.2})",
        summary.store.average_reward, summary.store.best_reward
    );
    println!("  average recovery: {:.1}s", summary.store.average_recovery_time);
    let trend = summary.store.improvement_trend;
    let trend_label = if trend > 0.0 {
        style(format!("{trend:+.2} (improving)")).green()
    } else {
        style(format!("{trend:+.2}")).dim()
    };
    println!("  reward trend:     {trend_label}");
}
