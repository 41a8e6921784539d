//! Spreads a pass's directives over a fixed number of workers.
//!
//! Each worker is a tokio task that owns one contiguous chunk of the
//! directive list and runs it strictly in order. Workers check the
//! cancellation token before starting each directive; a directive already
//! running always completes.

use std::sync::Arc;

use log::debug;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::directive::{Directive, RunContext};

/// What one worker did with its chunk.
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    /// Directives that ran this pass, updated in place.
    pub ran: Vec<Directive>,
    /// Directives never started because the pass was cancelled. Their
    /// `failed` flag still holds the previous pass's result.
    pub skipped: Vec<Directive>,
}

/// Running workers of one pass.
pub struct Dispatch {
    /// One per worker, in chunk order.
    pub handles: Vec<JoinHandle<ChunkOutcome>>,
    /// Stops the workers before their next directive.
    pub cancel: CancellationToken,
}

/// Splits `items` into `n` contiguous chunks whose sizes differ by at most
/// one, larger chunks first. With more chunks than items the trailing
/// chunks are empty.
pub fn chunkify<T>(items: Vec<T>, n: usize) -> Vec<Vec<T>> {
    let n = n.max(1);
    let base = items.len() / n;
    let remainder = items.len() % n;

    let mut items = items.into_iter();
    (0..n)
        .map(|i| {
            let size = base + usize::from(i < remainder);
            items.by_ref().take(size).collect()
        })
        .collect()
}

/// Starts `workers` tasks over `directives`.
///
/// The returned token is a child of `parent`, so cancelling the parent
/// stops these workers too.
pub fn dispatch(
    directives: Vec<Directive>,
    workers: usize,
    ctx: Arc<RunContext>,
    parent: &CancellationToken,
) -> Dispatch {
    let cancel = parent.child_token();
    let handles = chunkify(directives, workers)
        .into_iter()
        .enumerate()
        .map(|(worker, chunk)| {
            let ctx = Arc::clone(&ctx);
            let cancel = cancel.clone();
            tokio::spawn(run_chunk(worker, chunk, ctx, cancel))
        })
        .collect();
    Dispatch { handles, cancel }
}

async fn run_chunk(
    worker: usize,
    chunk: Vec<Directive>,
    ctx: Arc<RunContext>,
    cancel: CancellationToken,
) -> ChunkOutcome {
    let mut outcome = ChunkOutcome::default();
    let mut pending = chunk.into_iter();
    for mut directive in pending.by_ref() {
        if cancel.is_cancelled() {
            outcome.skipped.push(directive);
            break;
        }
        directive.run(&ctx).await;
        outcome.ran.push(directive);
    }
    outcome.skipped.extend(pending);
    if !outcome.skipped.is_empty() {
        debug!(
            "Worker {worker} stopped with {} directive(s) left",
            outcome.skipped.len()
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assertion::{Assertion, StatusAssertion};
    use crate::initialization::TlsPolicy;
    use crate::platform::Platform;
    use crate::report::CollectingReporter;
    use std::time::Duration;

    fn dry_context(reporter: Arc<CollectingReporter>) -> Arc<RunContext> {
        Arc::new(RunContext {
            dry_run: true,
            user_agent: "smoketest-test".to_string(),
            tls: TlsPolicy::default(),
            reporter,
        })
    }

    fn directive(url: &str, failed: bool) -> Directive {
        Directive {
            urls: vec![url.to_string()],
            tests: vec![Assertion::Status(StatusAssertion::new("200"))],
            platforms: vec![Platform::desktop()],
            timeout: Duration::from_secs(1),
            follow_redirects: false,
            basic_auth: None,
            login: None,
            failed,
        }
    }

    #[tokio::test]
    async fn test_cancelled_workers_return_their_chunks_as_skipped() {
        let reporter = Arc::new(CollectingReporter::new());
        let parent = CancellationToken::new();
        parent.cancel();
        let directives = (0..5)
            .map(|i| directive(&format!("http://www.example.com/{i}"), i % 2 == 0))
            .collect();

        let Dispatch { handles, cancel } =
            dispatch(directives, 3, dry_context(reporter.clone()), &parent);
        assert!(cancel.is_cancelled());

        let mut skipped = 0;
        for handle in handles {
            let outcome = handle.await.expect("worker finished");
            assert!(outcome.ran.is_empty());
            skipped += outcome.skipped.len();
        }
        assert_eq!(skipped, 5);
        assert!(reporter.results().is_empty());
    }

    #[tokio::test]
    async fn test_workers_report_what_ran() {
        let reporter = Arc::new(CollectingReporter::new());
        let directives = (0..4)
            .map(|i| directive(&format!("http://www.example.com/{i}"), true))
            .collect();

        let Dispatch { handles, .. } =
            dispatch(directives, 2, dry_context(reporter.clone()), &CancellationToken::new());
        let mut ran = Vec::new();
        for handle in handles {
            let outcome = handle.await.expect("worker finished");
            assert!(outcome.skipped.is_empty());
            ran.extend(outcome.ran);
        }
        assert_eq!(ran.len(), 4);
        // A dry run passes, clearing the previous pass's failure.
        assert!(ran.iter().all(|d| !d.failed));
    }

    #[test]
    fn test_chunkify_even_split() {
        let chunks = chunkify((0..9).collect(), 3);
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6, 7, 8]]);
    }

    #[test]
    fn test_chunkify_sizes_and_order() {
        for len in 0..40usize {
            for n in 1..12usize {
                let chunks = chunkify((0..len).collect::<Vec<_>>(), n);
                assert_eq!(chunks.len(), n);
                let flattened: Vec<usize> = chunks.iter().flatten().copied().collect();
                assert_eq!(flattened, (0..len).collect::<Vec<_>>());
                let min = chunks.iter().map(Vec::len).min().unwrap_or(0);
                let max = chunks.iter().map(Vec::len).max().unwrap_or(0);
                assert!(max - min <= 1, "len {len} into {n}: {min}..{max}");
            }
        }
    }

    #[test]
    fn test_chunkify_more_workers_than_items() {
        let chunks = chunkify(vec!['a', 'b'], 4);
        assert_eq!(chunks, vec![vec!['a'], vec!['b'], vec![], vec![]]);
    }

    #[test]
    fn test_chunkify_zero_workers_is_one_chunk() {
        assert_eq!(chunkify(vec![1, 2, 3], 0), vec![vec![1, 2, 3]]);
    }
}
