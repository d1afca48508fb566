//! `runplan generate` command: run the pipeline for a request file.

use std::path::Path;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use runplan_core::{Orchestrator, ScheduleRequest, ValidatedSchedule};
use runplan_db::{NewSchedule, ScheduleStore};

/// Read and parse a JSON request file.
pub fn read_request(path: &Path) -> Result<ScheduleRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse request file {}", path.display()))
}

/// The row to persist for a generated schedule.
pub fn to_new_schedule(
    schedule: &ValidatedSchedule,
    request: &ScheduleRequest,
) -> Result<NewSchedule> {
    Ok(NewSchedule {
        title: schedule.title.clone(),
        total_weeks: i32::try_from(schedule.weeks.len()).context("too many weeks")?,
        request: serde_json::to_value(request).context("failed to serialize request")?,
        schedule: serde_json::to_value(schedule).context("failed to serialize schedule")?,
    })
}

/// Generate a schedule, optionally store it, and print or write the JSON.
///
/// Ctrl+C cancels the generation, including any pending retry.
pub async fn run_generate(
    orchestrator: &Orchestrator,
    store: Option<&dyn ScheduleStore>,
    file: &Path,
    output: Option<&Path>,
) -> Result<()> {
    let request = read_request(file)?;

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };
    let result = orchestrator.generate(&request, &cancel).await;
    interrupt.abort();
    let schedule = result.context("schedule generation failed")?;

    if let Some(store) = store {
        let stored = store.store(to_new_schedule(&schedule, &request)?).await?;
        info!(id = %stored.id, "schedule stored");
        eprintln!("Schedule stored: {}", stored.id);
    }

    let json = serde_json::to_string_pretty(&schedule).context("failed to serialize schedule")?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} ({} weeks) written to {}",
                schedule.title,
                schedule.weeks.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
