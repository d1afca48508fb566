//! Offline and read-back commands: `methods`, `prompt`, `validate`, `show`,
//! `list`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use runplan_core::TrainingMethod;
use runplan_core::orchestrator::repair_reply_with_report;
use runplan_core::prompt::build_prompt;
use runplan_db::ScheduleStore;

use crate::generate_cmd::read_request;

/// A training method as listed by `runplan methods` and `GET /api/methods`.
#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub identifier: String,
    pub label: String,
    pub rules: Vec<String>,
}

pub fn method_infos() -> Vec<MethodInfo> {
    TrainingMethod::known()
        .iter()
        .map(|m| MethodInfo {
            identifier: m.identifier().to_string(),
            label: m.label().to_string(),
            rules: m.rules().iter().map(|r| r.to_string()).collect(),
        })
        .collect()
}

pub fn run_methods() {
    for (i, method) in method_infos().iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ({})", method.identifier, method.label);
        for (n, rule) in method.rules.iter().enumerate() {
            println!("  {}. {rule}", n + 1);
        }
    }
}

/// Print the prompt a request would produce.
pub fn run_prompt(file: &Path) -> Result<()> {
    let request = read_request(file)?;
    request
        .validate()
        .with_context(|| format!("invalid request in {}", file.display()))?;
    print!("{}", build_prompt(&request));
    Ok(())
}

/// Repair a saved raw model reply and print the validated schedule.
pub fn run_validate(file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read reply file {}", file.display()))?;
    let (schedule, report) = repair_reply_with_report(&raw)
        .with_context(|| format!("unusable reply in {}", file.display()))?;

    eprintln!(
        "{}: {} weeks, {} days",
        schedule.title,
        schedule.weeks.len(),
        schedule.days().count()
    );
    eprintln!(
        "Repairs: {} defaulted fields, {} reindexed weeks, {} normalized intensities, {} dropped days",
        report.defaulted_fields,
        report.reindexed_weeks,
        report.normalized_intensities,
        report.dropped_days,
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&schedule).context("failed to serialize schedule")?
    );
    Ok(())
}

/// Print one stored schedule as JSON.
pub async fn run_show(store: &dyn ScheduleStore, id_str: &str) -> Result<()> {
    let id = Uuid::parse_str(id_str).with_context(|| format!("invalid schedule ID: {id_str}"))?;
    let stored = store
        .fetch(id)
        .await?
        .with_context(|| format!("schedule {id} not found"))?;

    eprintln!("Schedule: {} ({})", stored.title, stored.id);
    eprintln!("Created: {}", stored.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!(
        "{}",
        serde_json::to_string_pretty(&stored.schedule).context("failed to serialize schedule")?
    );
    Ok(())
}

/// List stored schedules, newest first.
pub async fn run_list(store: &dyn ScheduleStore, limit: usize) -> Result<()> {
    let listings = store.list(limit).await?;
    if listings.is_empty() {
        println!("No schedules stored.");
        return Ok(());
    }
    for s in &listings {
        println!(
            "{}  {}  {:>3} weeks  {}",
            s.id,
            s.created_at.format("%Y-%m-%d %H:%M"),
            s.total_weeks,
            s.title
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use runplan_db::{MemoryScheduleStore, NewSchedule};

    use super::*;

    #[test]
    fn method_infos_cover_known_methods() {
        let infos = method_infos();
        assert_eq!(infos.len(), TrainingMethod::known().len());
        assert_eq!(infos[0].identifier, "Gebalanceerd");
        assert!(infos.iter().any(|m| m.identifier == "MAF"));
        assert!(infos.iter().all(|m| !m.rules.is_empty()));
    }

    #[test]
    fn validate_rejects_reply_without_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("reply.txt");
        std::fs::write(&path, "Sorry, I cannot help with that.").unwrap();
        let err = run_validate(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unusable reply"));
    }

    #[test]
    fn validate_accepts_fenced_reply() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("reply.txt");
        std::fs::write(&path, runplan_test_utils::sample_reply(2, "tempo")).unwrap();
        run_validate(&path).unwrap();
    }

    #[test]
    fn prompt_rejects_zero_weeks() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("request.json");
        let mut request = runplan_test_utils::sample_request();
        request.training_weeks = 0;
        std::fs::write(&path, serde_json::to_string(&request).unwrap()).unwrap();
        let err = run_prompt(&path).unwrap_err();
        assert!(format!("{err:#}").contains("trainingWeeks must be at least 1"));
    }

    #[tokio::test]
    async fn show_unknown_and_malformed_ids() {
        let store = MemoryScheduleStore::new();
        let err = run_show(&store, "not-a-uuid").await.unwrap_err();
        assert!(err.to_string().contains("invalid schedule ID"));

        let err = run_show(&store, &Uuid::new_v4().to_string()).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn show_and_list_stored_schedule() {
        let store = MemoryScheduleStore::new();
        run_list(&store, 10).await.unwrap();

        let stored = store
            .store(NewSchedule {
                title: "10K".to_string(),
                total_weeks: 2,
                request: serde_json::json!({}),
                schedule: runplan_test_utils::sample_schedule_json(2, "easy"),
            })
            .await
            .unwrap();
        run_show(&store, &stored.id.to_string()).await.unwrap();
        run_list(&store, 10).await.unwrap();
    }
}
