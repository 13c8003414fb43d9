//! Per-task protocol engine
//!
//! Drives one task end-to-end: validate, snapshot, task-start, answer
//! command-requests until the terminal task-complete arrives, then derive the
//! caller's outcome. Exactly one terminal outcome is produced per task.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::browser::capability::PageCapability;
use crate::browser::dispatch::{dispatch, Command};
use crate::browser::snapshot::capture_page_snapshot;
use crate::config::AutoflowConfig;
use crate::error::{AutoflowError, Result};
use crate::protocol::messages::{
    ClientMessage, FlowKind, FlowOptions, ServerMessage, TaskId, TaskResult, TaskValue,
};
use crate::protocol::session::{Session, TaskListener};

const TOKEN_HELP: &str = "To run autoflow steps, it's necessary to define either the $AUTOFLOW_TOKEN \
     environment variable or provide an autoflow.config.json file containing a \"TOKEN\" field. \
     You can generate your API key by signing up for an account at https://autoflow.tools";

/// Options for a single task run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Hint to the planner about the task's intended effect.
    pub flow_kind: Option<FlowKind>,
    /// Resolve with the raw terminal message instead of interpreting it.
    pub debug: bool,
    /// Reject with a timeout error if no terminal message arrives in time.
    /// `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

pub(crate) fn package_version() -> String {
    format!("v{}", env!("CARGO_PKG_VERSION"))
}

/// One-line error string: package prefix, quoted message, version and (when
/// known) task id, for external log correlation.
pub(crate) fn prefixed_error(
    config: &AutoflowConfig,
    message: &str,
    task_id: Option<&TaskId>,
) -> String {
    let prefix = format!(
        "{}.error '{}'. Version:{}",
        config.package_name,
        message,
        package_version()
    );
    match task_id {
        Some(id) => format!("{} TaskId:{}", prefix, id),
        None => prefix,
    }
}

/// Run one task over the shared session.
pub(crate) async fn run_task(
    session: &Session,
    config: &AutoflowConfig,
    page: &dyn PageCapability,
    description: &str,
    options: &RunOptions,
) -> Result<TaskValue> {
    // Both guards fail before any network activity.
    if !config.has_token() {
        return Err(AutoflowError::Configuration(prefixed_error(
            config, TOKEN_HELP, None,
        )));
    }
    if description.chars().count() > config.max_task_chars {
        return Err(AutoflowError::Configuration(prefixed_error(
            config,
            &format!(
                "Provided task string is too long, max length is {} chars",
                config.max_task_chars
            ),
            None,
        )));
    }

    let task_id = TaskId::generate();
    debug!(task_id = %task_id, task = description, "starting autoflow task");

    // Register before task-start so no planner frame can race the listener.
    // The listener is released exactly once, when this function returns.
    let mut listener = session.listen(task_id);

    let snapshot = capture_page_snapshot(page).await?;
    session
        .send(&ClientMessage::TaskStart {
            package_version: package_version(),
            task_id,
            task: description.to_string(),
            snapshot,
            flow_kind: options.flow_kind,
            options: options.debug.then_some(FlowOptions { debug: true }),
        })
        .await?;

    let driven = drive(session, config, page, task_id, &mut listener, options.debug);
    match options.deadline {
        Some(deadline) => tokio::time::timeout(deadline, driven)
            .await
            .map_err(|_| AutoflowError::Timeout(deadline))?,
        None => driven.await,
    }
}

/// Answer command-requests in arrival order until task-complete. Each
/// response is sent before the next queued message is processed, so commands
/// never overlap within a task.
async fn drive(
    session: &Session,
    config: &AutoflowConfig,
    page: &dyn PageCapability,
    task_id: TaskId,
    listener: &mut TaskListener,
    debug_mode: bool,
) -> Result<TaskValue> {
    while let Some(message) = listener.receiver.recv().await {
        match message {
            ServerMessage::CommandRequest {
                index,
                name,
                arguments,
                ..
            } => {
                let result = execute_command(page, &name, &arguments).await;
                let payload = match result {
                    Ok(Some(value)) => serde_json::to_string(&value)?,
                    Ok(None) => "null".to_string(),
                    Err(e) => {
                        // A failed command does not abort the task; the
                        // failure travels back to the planner tagged in the
                        // response payload.
                        warn!(task_id = %task_id, command = %name, "command failed: {}", e);
                        serde_json::to_string(&json!({ "error": e.to_string() }))?
                    }
                };
                session
                    .send(&ClientMessage::CommandResponse {
                        package_version: package_version(),
                        task_id,
                        index,
                        result: payload,
                    })
                    .await?;
            }
            ServerMessage::TaskComplete {
                was_successful,
                result,
                error_message,
                ..
            } => {
                if debug_mode {
                    return Ok(TaskValue::Raw(json!({
                        "wasSuccessful": was_successful,
                        "result": result,
                        "errorMessage": error_message,
                    })));
                }
                return interpret_completion(config, task_id, was_successful, result, error_message);
            }
        }
    }

    Err(AutoflowError::Connection(
        "session closed before the task completed".to_string(),
    ))
}

async fn execute_command(
    page: &dyn PageCapability,
    name: &str,
    arguments: &serde_json::Map<String, Value>,
) -> Result<Option<Value>> {
    let command = Command::parse(name, arguments)?;
    dispatch(page, command).await
}

fn interpret_completion(
    config: &AutoflowConfig,
    task_id: TaskId,
    was_successful: bool,
    result: Option<TaskResult>,
    error_message: Option<String>,
) -> Result<TaskValue> {
    if let Some(message) = error_message {
        return Err(AutoflowError::Task(prefixed_error(
            config,
            &message,
            Some(&task_id),
        )));
    }

    let Some(result) = result else {
        if !was_successful {
            return Err(AutoflowError::Task(prefixed_error(
                config,
                "An unknown error occurred when trying to run the autoflow step",
                Some(&task_id),
            )));
        }
        return Ok(TaskValue::None);
    };

    if let Some(assertion) = result.assertion {
        return Ok(TaskValue::Assertion(assertion));
    }
    if let Some(query) = result.query {
        return Ok(TaskValue::Answer(query));
    }
    if result.actions.is_some() && !was_successful {
        return Err(AutoflowError::Task(prefixed_error(
            config,
            "Could not execute autoflow step as action",
            Some(&task_id),
        )));
    }

    Ok(TaskValue::None)
}
