//! Wire message types for the planner protocol
//!
//! All messages are JSON objects tagged by a `type` field. Field names on the
//! wire are camelCase; the `type` values are kebab-case.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::browser::snapshot::PageSnapshot;

/// Identifier correlating every message of one task exchange.
///
/// UUID v7: globally unique and ordered by creation time, so task ids sort
/// chronologically in external logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Classification of a task's intended effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// Mutates page state.
    Action,
    /// Retrieves information.
    Query,
    /// Returns a boolean check.
    Assert,
}

/// Flow options forwarded to the planner with task-start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowOptions {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub debug: bool,
}

/// Messages sent client → server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "task-start", rename_all = "camelCase")]
    TaskStart {
        package_version: String,
        task_id: TaskId,
        task: String,
        snapshot: PageSnapshot,
        #[serde(skip_serializing_if = "Option::is_none")]
        flow_kind: Option<FlowKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        options: Option<FlowOptions>,
    },
    #[serde(rename = "command-response", rename_all = "camelCase")]
    CommandResponse {
        package_version: String,
        task_id: TaskId,
        /// Echoes the index of the command-request being answered.
        index: u64,
        /// JSON-serialized command result, or the literal string "null" when
        /// the command produced no value.
        result: String,
    },
}

/// Messages received server → client.
///
/// `task_id` is optional on the wire; untagged messages are routed to the
/// single currently registered listener (see the session routing rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "command-request", rename_all = "camelCase")]
    CommandRequest {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
        /// Opaque pairing index assigned by the planner, echoed back in the
        /// matching command-response.
        index: u64,
        name: String,
        #[serde(default)]
        arguments: serde_json::Map<String, Value>,
    },
    #[serde(rename = "task-complete", rename_all = "camelCase")]
    TaskComplete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<TaskId>,
        was_successful: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<TaskResult>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_message: Option<String>,
    },
}

impl ServerMessage {
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::CommandRequest { task_id, .. } => task_id.as_ref(),
            Self::TaskComplete { task_id, .. } => task_id.as_ref(),
        }
    }
}

/// Result payload of a task-complete message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Terminal value of a successfully completed task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValue {
    /// Task completed with no result body (typical for actions).
    None,
    /// Boolean outcome of an assert flow.
    Assertion(bool),
    /// String answer of a query flow.
    Answer(String),
    /// Raw terminal message, returned when the debug option is set.
    Raw(Value),
}
