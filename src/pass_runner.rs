//! Multi-pass execution.
//!
//! Each pass dispatches the current directive set, waits for every worker,
//! and keeps only the directives that failed. The run succeeds as soon as a
//! pass leaves nothing failed, and fails if failures remain after the last
//! pass or the operator cancels.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::directive::{Directive, RunContext};
use crate::dispatch::{dispatch, Dispatch};

/// How a multi-pass run ended.
#[derive(Debug)]
pub struct RunOutcome {
    /// Passes started, including a cancelled one.
    pub passes_run: usize,
    pub success: bool,
    pub cancelled: bool,
    /// Directives that failed their last run, plus any a cancelled pass
    /// never started.
    pub remaining: Vec<Directive>,
}

pub struct PassRunner {
    ctx: Arc<RunContext>,
    workers: usize,
    passes: usize,
    delay: Duration,
}

impl PassRunner {
    pub fn new(ctx: Arc<RunContext>, workers: usize, passes: usize, delay: Duration) -> Self {
        Self {
            ctx,
            workers,
            passes,
            delay,
        }
    }

    pub async fn run(
        &self,
        mut directives: Vec<Directive>,
        shutdown: &CancellationToken,
    ) -> RunOutcome {
        let mut passes_run = 0;
        // A panicked worker loses its directives; the run can't be called clean.
        let mut lost_directives = false;

        for pass in 0..self.passes {
            if pass > 0 && !self.delay.is_zero() {
                info!("Waiting {:?} before pass {}", self.delay, pass + 1);
                tokio::select! {
                    _ = tokio::time::sleep(self.delay) => {}
                    _ = shutdown.cancelled() => {}
                }
            }
            if shutdown.is_cancelled() {
                return RunOutcome {
                    passes_run,
                    success: false,
                    cancelled: true,
                    remaining: directives,
                };
            }

            info!(
                "Starting pass {} of {} with {} directive(s)",
                pass + 1,
                self.passes,
                directives.len()
            );
            self.ctx.reporter.start_pass();
            passes_run += 1;

            let Dispatch { handles, cancel } =
                dispatch(directives, self.workers, Arc::clone(&self.ctx), shutdown);
            let joined = join_all(handles);
            tokio::pin!(joined);
            let finished = tokio::select! {
                results = &mut joined => Some(results),
                _ = shutdown.cancelled() => None,
            };
            let (results, cancelled) = match finished {
                Some(results) => (results, false),
                None => {
                    cancel.cancel();
                    info!("Waiting for workers to finish their current directive");
                    (joined.await, true)
                }
            };

            let mut ran = Vec::new();
            let mut skipped = Vec::new();
            for result in results {
                match result {
                    Ok(chunk) => {
                        ran.extend(chunk.ran);
                        skipped.extend(chunk.skipped);
                    }
                    Err(join_error) => {
                        lost_directives = true;
                        warn!("Task panicked: {:?}", join_error);
                    }
                }
            }
            self.ctx.reporter.end_pass();

            let cancelled = cancelled || shutdown.is_cancelled();
            directives = ran.into_iter().filter(|d| d.failed).collect();
            if cancelled {
                // Skipped directives weren't checked this pass, whatever their flag says.
                directives.extend(skipped);
                return RunOutcome {
                    passes_run,
                    success: false,
                    cancelled: true,
                    remaining: directives,
                };
            }
            info!(
                "Pass {} finished with {} failing directive(s)",
                pass + 1,
                directives.len()
            );
            if directives.is_empty() {
                return RunOutcome {
                    passes_run,
                    success: !lost_directives,
                    cancelled: false,
                    remaining: directives,
                };
            }
        }

        RunOutcome {
            passes_run,
            success: false,
            cancelled: false,
            remaining: directives,
        }
    }
}
