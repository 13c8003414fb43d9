//! Planner protocol: wire messages, shared session, task engine, fan-out

pub mod batch;
pub mod engine;
pub mod messages;
pub mod session;

pub use batch::{BatchOptions, BatchOutcome, DEFAULT_PARALLELISM};
pub use engine::RunOptions;
pub use messages::{
    ClientMessage, FlowKind, FlowOptions, ServerMessage, TaskId, TaskResult, TaskValue,
};
pub use session::Session;
