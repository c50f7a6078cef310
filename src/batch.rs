//! Sequential batch of runs
//!
//! A batch executes `count` runs one after another with a randomised pause
//! between them. A shutdown request, whether it arrives during a run or
//! during a pause, ends the batch before anything else is started.

use crate::config::BatchConfig;
use crate::error::{Error, Result, exit_code};
use crate::pipeline::Pipeline;
use crate::shutdown::{Shutdown, run_until_signal};
use crate::types::{GenerationRequest, RunResult, RunStatus, Stage};
use rand::Rng;
use std::time::Duration;

/// What a batch should produce
#[derive(Clone, Debug)]
pub struct BatchPlan {
    /// Topic seed shared by every run
    pub topic: Option<String>,
    /// Number of runs
    pub count: u32,
    /// Images requested per run
    pub image_count: u32,
}

/// Execute every run of `plan` in order
///
/// # Errors
///
/// Returns [`Error::Interrupted`] as soon as shutdown is requested. Results of
/// runs that already finished are logged, not returned.
pub async fn run_batch(
    pipeline: &Pipeline,
    plan: &BatchPlan,
    pacing: &BatchConfig,
    shutdown: &mut Shutdown,
) -> Result<Vec<RunResult>> {
    let mut results = Vec::with_capacity(plan.count as usize);

    for n in 0..plan.count {
        if n > 0 {
            let pause = pause_between(pacing.min_delay, pacing.max_delay);
            tracing::debug!(pause_ms = pause.as_millis() as u64, "pausing before next run");
            tokio::select! {
                biased;
                () = shutdown.requested() => {
                    tracing::warn!(completed = n, of = plan.count, "batch interrupted between runs");
                    return Err(Error::Interrupted { stage: Stage::Idle });
                }
                () = tokio::time::sleep(pause) => {}
            }
        }

        let request = GenerationRequest::new(plan.topic.clone(), plan.image_count);
        let result = run_until_signal(pipeline, &request, shutdown).await?;

        tracing::info!(
            run = n + 1,
            of = plan.count,
            run_id = %result.run_id,
            status = %result.status,
            "batch progress"
        );
        results.push(result);
    }

    Ok(results)
}

/// Process exit code for a finished batch: failure if any run failed
pub fn batch_exit_code(statuses: impl IntoIterator<Item = RunStatus>) -> i32 {
    let worst = statuses
        .into_iter()
        .fold(RunStatus::Success, RunStatus::worst);
    match worst {
        RunStatus::Failed => exit_code::RUN_FAILED,
        RunStatus::Success | RunStatus::Partial => exit_code::SUCCESS,
    }
}

fn pause_between(min: Duration, max: Duration) -> Duration {
    let (min, max) = (min.as_millis() as u64, max.as_millis() as u64);
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min..=max))
}
