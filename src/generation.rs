//! Background repair loop.
//!
//! A run keeps retrying slots of the store's schedule until no partnership
//! repeats. It stops early, without error, when the operator leaves the
//! review page, cancels, or starts a newer run. Runs are told apart by the
//! sequence number captured when they start.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::schedule::{is_converged, Schedule};
use crate::store::{GenerationState, Page, Store};

/// Delay between retries when none is configured
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How a generation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GenerationOutcome {
    /// No duplicate pairs remain; the store is idle again
    Converged { iterations: u64 },
    /// Someone called `cancel_generation`
    Cancelled,
    /// A newer run took over
    Superseded,
    /// The operator left the review page; the run was cancelled
    NavigatedAway,
}

enum Step {
    Advanced,
    Finished(GenerationOutcome),
}

/// One pass of the loop body, done under a single lock so that a cancel
/// cannot slip in between the checks and the retry.
///
/// Only the run that owns the current state may change it: a stale run
/// stops without touching whatever run replaced it.
fn step(store: &Store, seqnum: u64, iterations: u64) -> Result<Step> {
    let mut state = store.lock();

    match state.generation.seqnum() {
        None => return Ok(Step::Finished(GenerationOutcome::Cancelled)),
        Some(current) if current != seqnum => {
            return Ok(Step::Finished(GenerationOutcome::Superseded));
        }
        Some(_) => {}
    }
    if state.page != Page::ReviewSchedule {
        state.generation = GenerationState::Idle;
        return Ok(Step::Finished(GenerationOutcome::NavigatedAway));
    }
    let GenerationState::Running { retry_iterator, .. } = &mut state.generation else {
        return Ok(Step::Finished(GenerationOutcome::Cancelled));
    };

    if is_converged(retry_iterator.schedule()) {
        state.generation = GenerationState::Idle;
        return Ok(Step::Finished(GenerationOutcome::Converged { iterations }));
    }

    let new_schedule = match retry_iterator.advance() {
        Ok(schedule) => schedule,
        Err(e) => {
            state.generation = GenerationState::Idle;
            return Err(e);
        }
    };
    store.publish(&new_schedule);
    state.schedule = Some(new_schedule);
    Ok(Step::Advanced)
}

/// Drives run `seqnum` until it converges or is stopped, sleeping
/// `poll_interval` between retries
pub async fn run_generation(store: Arc<Store>, seqnum: u64, poll_interval: Duration) -> Result<GenerationOutcome> {
    let mut iterations = 0u64;
    loop {
        let next = step(&store, seqnum, iterations).map_err(|e| {
            log::error!("run {} failed: {}", seqnum, e);
            e
        })?;
        match next {
            Step::Advanced => {
                iterations += 1;
                tokio::time::sleep(poll_interval).await;
            }
            Step::Finished(outcome) => {
                match outcome {
                    GenerationOutcome::Converged { iterations } => {
                        log::info!("run {} converged after {} retries", seqnum, iterations)
                    }
                    GenerationOutcome::Superseded => log::debug!("run {} superseded", seqnum),
                    other => log::info!("run {} stopped: {:?}", seqnum, other),
                }
                return Ok(outcome);
            }
        }
    }
}

/// Builds a fresh schedule from the store's squad and params and repairs
/// it in the current task
pub async fn generate_schedule(store: Arc<Store>, poll_interval: Duration) -> Result<GenerationOutcome> {
    let seqnum = store.generate_fresh_schedule()?;
    run_generation(store, seqnum, poll_interval).await
}

/// Builds a fresh schedule and repairs it on a spawned task.
///
/// Fails straight away if the schedule cannot be built. The receiver sees
/// the initial schedule and every repaired one after it.
pub fn start_generation(
    store: Arc<Store>,
    poll_interval: Duration,
) -> Result<(JoinHandle<Result<GenerationOutcome>>, watch::Receiver<Option<Schedule>>)> {
    let schedules = store.subscribe();
    let seqnum = store.generate_fresh_schedule()?;
    log::info!("starting generation run {}", seqnum);
    let handle = tokio::spawn(run_generation(store, seqnum, poll_interval));
    Ok((handle, schedules))
}
