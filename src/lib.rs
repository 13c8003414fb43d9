//! Autoflow - plain-english browser task execution
//!
//! A test step describes a browser interaction in natural language; this
//! crate ships the description plus a page snapshot to a remote planner over
//! a shared WebSocket session, executes the commands the planner sends back
//! (pointer, keyboard, DOM inspection — routed through recursive coordinate
//! resolution into iframes and shadow roots), and resolves with the task's
//! terminal outcome. Batches fan out over the same session with configurable
//! parallelism and partial-failure policy.
//!
//! The browser itself stays behind the [`PageCapability`] trait; wire it to
//! whatever automation backend drives your pages.
//!
//! # Example
//! ```ignore
//! use autoflow::{Autoflow, AutoflowConfig, RunOptions};
//!
//! # async fn demo(page: &dyn autoflow::PageCapability) -> autoflow::Result<()> {
//! let flow = Autoflow::new(AutoflowConfig::load()?);
//! let value = flow.run(page, "click the submit button", &RunOptions::default()).await?;
//! flow.close().await;
//! # Ok(())
//! # }
//! ```

pub mod browser;
pub mod config;
pub mod error;
pub mod protocol;

use std::sync::Arc;

pub use browser::{
    capture_page_snapshot, Command, ElementProbe, PageCapability, PageSnapshot, Point,
    ResolvedTarget, ScrollDirection, Viewport, VisualContext,
};
pub use config::AutoflowConfig;
pub use error::{AutoflowError, Result};
pub use protocol::{
    BatchOptions, BatchOutcome, FlowKind, RunOptions, Session, TaskId, TaskValue,
};

/// Handle owning the shared planner session.
///
/// All tasks run through one handle multiplex a single transport; the
/// connection is established lazily on the first run and reused until
/// [`close`](Autoflow::close).
pub struct Autoflow {
    config: Arc<AutoflowConfig>,
    session: Session,
}

impl Autoflow {
    /// Build a handle from an explicit configuration.
    pub fn new(config: AutoflowConfig) -> Self {
        let config = Arc::new(config);
        let session = Session::new(Arc::clone(&config));
        Self { config, session }
    }

    /// Build a handle from `autoflow.config.json` + `AUTOFLOW_*` env vars.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(AutoflowConfig::load()?))
    }

    pub fn config(&self) -> &AutoflowConfig {
        &self.config
    }

    /// Execute one plain-english task against the page.
    pub async fn run(
        &self,
        page: &dyn PageCapability,
        task: &str,
        options: &RunOptions,
    ) -> Result<TaskValue> {
        protocol::engine::run_task(&self.session, &self.config, page, task, options).await
    }

    /// Execute a batch of tasks, chunked by the parallelism limit.
    ///
    /// With `fail_fast` the first failure rejects the whole call; otherwise
    /// every outcome is returned positionally, in input order.
    pub async fn run_batch(
        &self,
        page: &dyn PageCapability,
        tasks: &[String],
        options: &BatchOptions,
    ) -> Result<Vec<BatchOutcome>> {
        protocol::batch::run_batch(&self.session, &self.config, page, tasks, options).await
    }

    /// Close the shared session. Idempotent; a later run reconnects.
    pub async fn close(&self) {
        self.session.close().await
    }
}
