//! Background run worker — executes triggered experiments one at a time.

use std::sync::Arc;

use tracing::{error, info};

use crate::state::{now_millis, AppState, RunJobStatus, RunRequest};

/// Finished jobs kept for the runs API.
const MAX_FINISHED_JOBS: usize = 100;

/// Start the background run worker task.
pub fn start_run_worker(state: Arc<AppState>) {
    let mut rx = match state.take_run_rx() {
        Some(rx) => rx,
        None => {
            error!("Run worker already started");
            return;
        }
    };

    tokio::spawn(async move {
        info!("Background run worker started");
        while let Some(request) = rx.recv().await {
            process_run_job(&state, request).await;
        }
    });
}

async fn process_run_job(state: &AppState, request: RunRequest) {
    {
        let mut runs = state.runs.write();
        if let Some(job) = runs.get_mut(&request.job_id) {
            job.status = RunJobStatus::Running;
            job.started_at = Some(now_millis());
        }
    }

    info!("Processing run job {} for tag {}", request.job_id, request.tag);
    let report = state.orchestrator.run(&request.tag).await;

    let status = if report.is_success() {
        RunJobStatus::Succeeded
    } else {
        RunJobStatus::Failed
    };
    match report.failure() {
        Some(reason) => error!("Run job {} failed: {}", request.job_id, reason),
        None => info!("Run job {} succeeded", request.job_id),
    }

    {
        let mut runs = state.runs.write();
        if let Some(job) = runs.get_mut(&request.job_id) {
            job.status = status;
            job.report = Some(report);
            job.completed_at = Some(now_millis());
        }
    }

    cleanup_old_jobs(state);
}

fn cleanup_old_jobs(state: &AppState) {
    let mut runs = state.runs.write();
    let mut finished: Vec<(String, i64)> = runs
        .values()
        .filter(|j| j.status.is_finished())
        .map(|j| (j.id.clone(), j.completed_at.unwrap_or(j.queued_at)))
        .collect();

    if finished.len() > MAX_FINISHED_JOBS {
        finished.sort_by_key(|(_, t)| *t);
        let remove_count = finished.len() - MAX_FINISHED_JOBS;
        for (id, _) in finished.into_iter().take(remove_count) {
            runs.remove(&id);
        }
    }
}
