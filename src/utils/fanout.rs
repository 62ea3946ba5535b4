//! Launch a batch of independent operations, wait for every one of them, then
//! continue with whatever succeeded.

use futures::future::join_all;
use std::future::Future;
use tracing::warn;

use crate::error::AppResult;

/// Outcome of a joined batch. `succeeded` keeps the input order of the
/// operations that finished with `Ok`.
#[derive(Debug)]
pub struct Settled<T> {
    pub succeeded: Vec<T>,
    pub failed: usize,
}

impl<T> Settled<T> {
    pub fn completed(&self) -> usize {
        self.succeeded.len() + self.failed
    }
}

/// Runs all futures concurrently and returns once every one has completed.
/// Failures are logged with `label` and counted, never propagated.
pub async fn join_settled<I, F, T>(label: &str, tasks: I) -> Settled<T>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = AppResult<T>>,
{
    let results = join_all(tasks).await;

    let mut succeeded = Vec::with_capacity(results.len());
    let mut failed = 0;
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(value) => succeeded.push(value),
            Err(e) => {
                warn!("{} #{} failed: {}", label, index, e);
                failed += 1;
            }
        }
    }

    Settled { succeeded, failed }
}
