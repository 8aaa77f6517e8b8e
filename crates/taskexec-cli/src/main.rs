use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskexec_core::app::{EngineBuilder, EngineConfig, MetricsSnapshot, SimulationConfig};
use taskexec_core::impls::{InMemoryTaskStore, SimulatedWork};
use taskexec_core::ports::TaskStore;
use taskexec_core::{RecoveryReport, TaskRecord, TaskStatus};

const DEFAULT_DEMO_TASKS: usize = 6;

#[derive(Debug, Serialize)]
struct Summary {
    recovery: String,
    metrics: MetricsSnapshot,
    tasks: Vec<TaskRecord>,
}

fn demo_task_count() -> Result<usize> {
    match env::var("TASKEXEC_DEMO_TASKS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid TASKEXEC_DEMO_TASKS: {raw:?}")),
        Err(_) => Ok(DEFAULT_DEMO_TASKS),
    }
}

fn describe(report: &RecoveryReport) -> String {
    match report {
        RecoveryReport::Recovered { reset, resubmitted } => {
            format!("reset {reset}, resubmitted {resubmitted}")
        }
        RecoveryReport::AlreadyRan => "already ran".to_string(),
        RecoveryReport::Failed { reason } => format!("failed: {reason}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskexec=info,taskexec_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env()?;
    let simulation = SimulationConfig::from_env()?;
    let demo_tasks = demo_task_count()?;

    // (A) Store: pretend a previous process crashed with two tasks mid-flight
    let store = Arc::new(InMemoryTaskStore::new());
    store.seed("interrupted-1", TaskStatus::Running).await;
    store.seed("interrupted-2", TaskStatus::Running).await;

    // (B) Engine: recovery runs before any new submission
    let engine = EngineBuilder::new(store.clone())
        .config(config)
        .work(SimulatedWork::from_config(&simulation))
        .build()?;
    let report = engine.run_recovery().await;
    tracing::info!(recovery = %describe(&report), "engine ready");

    // (C) New tasks, as the API layer would create them
    for i in 0..demo_tasks {
        let task = store.create(&format!("demo-{i}")).await?;
        engine.submit(task.id)?;
    }

    // (D) Wait for every task to settle, or stop early on Ctrl-C
    tokio::select! {
        _ = engine.wait_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted, waiting for in-flight tasks");
        }
    }
    engine.shutdown().await;

    let summary = Summary {
        recovery: describe(&report),
        metrics: engine.metrics(),
        tasks: store.list_by_status(&TaskStatus::ALL).await?,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
