//! Public handle for the background stream task.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::connection::connection_loop;
use super::types::{ClientConfig, StreamCommand, StreamEvent};
use crate::bridge::Bridge;
use crate::state::ConnectionState;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle owning one persistent stream connection.
///
/// Dropping the handle aborts the background task; [`stop`](Self::stop)
/// shuts it down cleanly and waits for it.
pub struct StreamClient {
    command_tx: mpsc::Sender<StreamCommand>,
    state_rx: watch::Receiver<ConnectionState>,
    task: Option<JoinHandle<()>>,
}

impl StreamClient {
    /// Spawn the connection task. Returns `(client, event_receiver)`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: ClientConfig,
        transport: impl Transport + 'static,
        bridge: Bridge,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        Self::start_shared(config, Arc::new(transport), bridge)
    }

    /// Like [`start`](Self::start) with a transport shared elsewhere.
    pub fn start_shared(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        bridge: Bridge,
    ) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let task = tokio::spawn(connection_loop(
            config, transport, bridge, state_tx, event_tx, command_rx,
        ));

        let client = Self {
            command_tx,
            state_rx,
            task: Some(task),
        };
        (client, event_rx)
    }

    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Ask the task to flush buffered notifications, e.g. right after the
    /// target element was created.
    pub async fn replay_pending(&self) {
        let _ = self.command_tx.send(StreamCommand::ReplayPending).await;
    }

    /// Cancel any in-flight read, close the connection and wait for the
    /// task to exit.
    pub async fn stop(mut self) {
        let _ = self.command_tx.send(StreamCommand::Stop).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Stream task ended abnormally");
            }
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
