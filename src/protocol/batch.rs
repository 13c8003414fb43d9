//! Fan-out of task batches over the shared session
//!
//! Tasks are chunked by the parallelism limit and each chunk runs
//! concurrently; the result vector always follows input order, never
//! completion order.

use crate::browser::capability::PageCapability;
use crate::config::AutoflowConfig;
use crate::error::{AutoflowError, Result};
use crate::protocol::engine::{self, RunOptions};
use crate::protocol::messages::TaskValue;
use crate::protocol::session::Session;

/// Default number of tasks launched concurrently.
pub const DEFAULT_PARALLELISM: usize = 10;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Chunk size for concurrent execution.
    pub parallelism: usize,
    /// When true, the first failing task rejects the whole batch immediately
    /// and later chunks are never started.
    pub fail_fast: bool,
    /// Per-task options, applied to every task in the batch.
    pub run: RunOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_PARALLELISM,
            fail_fast: false,
            run: RunOptions::default(),
        }
    }
}

/// Outcome of one task in a collect-all batch.
pub type BatchOutcome = std::result::Result<TaskValue, AutoflowError>;

pub(crate) async fn run_batch(
    session: &Session,
    config: &AutoflowConfig,
    page: &dyn PageCapability,
    tasks: &[String],
    options: &BatchOptions,
) -> Result<Vec<BatchOutcome>> {
    if tasks.is_empty() {
        return Err(AutoflowError::Configuration(
            "Empty task list, nothing to do".to_string(),
        ));
    }

    let parallelism = options.parallelism.max(1);
    let mut outcomes = Vec::with_capacity(tasks.len());

    for chunk in tasks.chunks(parallelism) {
        let runs = chunk
            .iter()
            .map(|task| engine::run_task(session, config, page, task, &options.run));

        if options.fail_fast {
            // First rejection propagates immediately; the remainder of the
            // chunk is dropped and later chunks never start.
            let values = futures::future::try_join_all(runs).await?;
            outcomes.extend(values.into_iter().map(Ok));
        } else {
            let results = futures::future::join_all(runs).await;
            outcomes.extend(results);
        }
    }

    Ok(outcomes)
}
