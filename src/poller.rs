use crate::backend::Backend;
use crate::config::{FailurePolicy, PollConfig};
use crate::error::AppError;
use crate::state::{JobKind, JobProgress};
use std::future::Future;
use tracing::{debug, info, warn};

/// Runs `op` until it succeeds or the failure policy gives up.
///
/// Under [`FailurePolicy::Retry`] up to `max_retries` consecutive failures are
/// retried after a fixed delay; [`FailurePolicy::FailFast`] returns the first
/// error.
pub async fn retrying<T, F, Fut>(
    policy: &FailurePolicy,
    request: &str,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut failures = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => match policy {
                FailurePolicy::Retry { max_retries, delay } if failures < *max_retries => {
                    failures += 1;
                    warn!(request, attempt = failures, error = %e, "Backend request failed, retrying");
                    tokio::time::sleep(*delay).await;
                }
                _ => return Err(e),
            },
        }
    }
}

/// Samples a job's progress endpoint until the backend reports it finished.
///
/// `on_tick` sees every sample, including the final one. Polls are strictly
/// sequential with `config.interval` between them, and there is no upper bound
/// on how long a job may run. Returns the final sample.
pub async fn poll_job<F>(
    backend: &dyn Backend,
    job: JobKind,
    config: &PollConfig,
    on_tick: F,
) -> Result<JobProgress, AppError>
where
    F: FnMut(&JobProgress),
{
    poll_job_until(backend, job, config, on_tick, || true).await
}

/// Like [`poll_job`], but a finished sample only ends polling if `settled`
/// already returned true before that sample was requested.
pub async fn poll_job_until<F, S>(
    backend: &dyn Backend,
    job: JobKind,
    config: &PollConfig,
    mut on_tick: F,
    settled: S,
) -> Result<JobProgress, AppError>
where
    F: FnMut(&JobProgress),
    S: Fn() -> bool,
{
    let mut polls = 0u64;
    loop {
        let may_finish = settled();
        let progress = retrying(&config.failure, job.progress_path(), || backend.progress(job)).await?;
        polls += 1;
        debug!(
            job = job.name(),
            done = progress.done,
            total = progress.total,
            in_progress = progress.in_progress,
            "Polled job progress"
        );
        on_tick(&progress);

        if !progress.in_progress {
            if may_finish {
                info!(job = job.name(), polls, "Job finished");
                return Ok(progress);
            }
            debug!(job = job.name(), "Job reads idle but has not settled yet");
        }
        tokio::time::sleep(config.interval).await;
    }
}
