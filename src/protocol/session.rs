//! Shared planner session: one WebSocket transport multiplexing all tasks
//!
//! The session is an explicitly constructed object owned by the [`Autoflow`]
//! handle, not a process-wide global. The transport is established lazily on
//! first send, reused by every in-flight task, and torn down by `close()`.
//!
//! [`Autoflow`]: crate::Autoflow

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use crate::config::AutoflowConfig;
use crate::error::{AutoflowError, Result};
use crate::protocol::messages::{ClientMessage, ServerMessage, TaskId};

/// Longest frame prefix written to the log.
const LOG_TRUNCATE_CHARS: usize = 250;

const AUTH_HELP: &str = "Make sure the $AUTOFLOW_TOKEN environment variable matches \
     the one in your account at https://autoflow.tools";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Routes incoming server messages to per-task listeners.
///
/// One registration per in-flight task, keyed by task id. Messages without a
/// task id are delivered only when exactly one listener is registered;
/// otherwise correlation is ambiguous and the message is dropped with a
/// warning.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<HashMap<TaskId, mpsc::UnboundedSender<ServerMessage>>>,
}

impl ListenerRegistry {
    fn register(&self, task_id: TaskId) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .expect("listener registry lock poisoned")
            .insert(task_id, tx);
        rx
    }

    fn remove(&self, task_id: &TaskId) {
        self.listeners
            .lock()
            .expect("listener registry lock poisoned")
            .remove(task_id);
    }

    fn route(&self, message: ServerMessage) {
        let listeners = self
            .listeners
            .lock()
            .expect("listener registry lock poisoned");

        let target = match message.task_id() {
            Some(id) => listeners.get(id),
            // Untagged message: unambiguous only with a single listener.
            None if listeners.len() == 1 => listeners.values().next(),
            None => {
                warn!(
                    listeners = listeners.len(),
                    "dropping untagged message, correlation is ambiguous"
                );
                None
            }
        };

        match target {
            Some(tx) => {
                // The listener may have been torn down between routing and
                // delivery; nothing to do then.
                let _ = tx.send(message);
            }
            None => {
                if let Some(id) = message.task_id() {
                    debug!(task_id = %id, "no listener registered for message");
                }
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.listeners
            .lock()
            .expect("listener registry lock poisoned")
            .len()
    }
}

/// Removes the task's listener registration when dropped, so the registration
/// is released exactly once on every exit path (completion, error, timeout).
pub(crate) struct TaskListener {
    registry: Arc<ListenerRegistry>,
    task_id: TaskId,
    pub(crate) receiver: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Drop for TaskListener {
    fn drop(&mut self) {
        self.registry.remove(&self.task_id);
    }
}

struct Transport {
    writer: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

/// Shared transport session to the planner.
pub struct Session {
    config: Arc<AutoflowConfig>,
    transport: tokio::sync::Mutex<Option<Transport>>,
    registry: Arc<ListenerRegistry>,
}

impl Session {
    pub fn new(config: Arc<AutoflowConfig>) -> Self {
        Self {
            config,
            transport: tokio::sync::Mutex::new(None),
            registry: Arc::new(ListenerRegistry::default()),
        }
    }

    /// Register a listener for the given task id. Messages tagged with the id
    /// (or untagged, when this is the only live task) arrive on the returned
    /// receiver.
    pub(crate) fn listen(&self, task_id: TaskId) -> TaskListener {
        let receiver = self.registry.register(task_id);
        TaskListener {
            registry: Arc::clone(&self.registry),
            task_id,
            receiver,
        }
    }

    /// Serialize and transmit a message, lazily establishing the connection.
    pub async fn send(&self, message: &ClientMessage) -> Result<()> {
        let text = serde_json::to_string(message)?;

        let mut guard = self.transport.lock().await;
        if guard.is_none() {
            *guard = Some(self.open_transport().await?);
        }
        let transport = guard.as_mut().expect("transport just established");

        if self.config.logs_enabled {
            debug!("> ws send: {}", truncate_for_log(&text, LOG_TRUNCATE_CHARS));
        }

        transport
            .writer
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| AutoflowError::Connection(format!("Failed to send message: {}", e)))
    }

    /// Close the transport and clear the shared reference. Idempotent; the
    /// next send reconnects.
    pub async fn close(&self) {
        let mut guard = self.transport.lock().await;
        if let Some(mut transport) = guard.take() {
            let _ = transport.writer.send(Message::Close(None)).await;
            transport.reader.abort();
        }
    }

    async fn open_transport(&self) -> Result<Transport> {
        let url = self.config.websocket_url();
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(map_connect_error)?;

        let (writer, mut reader) = stream.split();
        let registry = Arc::clone(&self.registry);
        let logs_enabled = self.config.logs_enabled;

        let reader = tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if logs_enabled {
                            debug!(
                                "< ws recv: {}",
                                truncate_for_log(text.as_str(), LOG_TRUNCATE_CHARS)
                            );
                        }
                        match serde_json::from_str::<ServerMessage>(text.as_str()) {
                            Ok(message) => registry.route(message),
                            Err(e) => warn!("ignoring unparseable frame: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {} // ping/pong/binary
                    Err(e) => {
                        warn!("websocket read failed: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Transport { writer, reader })
    }
}

fn map_connect_error(error: WsError) -> AutoflowError {
    match error {
        WsError::Http(response)
            if response.status() == StatusCode::UNAUTHORIZED
                || response.status() == StatusCode::FORBIDDEN =>
        {
            AutoflowError::Authentication(AUTH_HELP.to_string())
        }
        other => AutoflowError::Connection(other.to_string()),
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_for_log(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
