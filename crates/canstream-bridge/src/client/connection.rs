//! Background stream loop with auto-reconnect.

use std::future::Future;
use std::sync::Arc;

use canstream_common::ConnectionId;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};

use super::types::{ClientConfig, StreamCommand, StreamEvent};
use crate::bridge::{Bridge, BridgeError, Outcome};
use crate::sse::{SseItem, SseStream};
use crate::state::{ConnectionState, ReconnectMachine, Transition};
use crate::transport::{EventReader, Transport};

/// How a single open stream ended.
enum Ended {
    Closed(String),
    StopRequested,
}

/// Channels shared by every step of the loop.
struct Session {
    config: ClientConfig,
    bridge: Bridge,
    machine: ReconnectMachine,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::Sender<StreamEvent>,
    command_rx: mpsc::Receiver<StreamCommand>,
    last_event_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Connection Loop
// ---------------------------------------------------------------------------

/// Background task owning the connection and the bridge until stopped.
pub(crate) async fn connection_loop(
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    bridge: Bridge,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: mpsc::Sender<StreamEvent>,
    command_rx: mpsc::Receiver<StreamCommand>,
) {
    let machine = ReconnectMachine::from_config(&config.reconnect);
    let mut session = Session {
        config,
        bridge,
        machine,
        state_tx,
        event_tx,
        command_rx,
        last_event_id: None,
    };

    while session.machine.begin_connect() {
        session.publish_state();
        if let ConnectionState::Connecting { attempt } = session.machine.state() {
            debug!(attempt, "Opening event stream");
        }

        let opened = {
            let open = transport.open(session.last_event_id.as_deref());
            race_commands(open, &mut session.command_rx, &mut session.bridge).await
        };
        let Some(opened) = opened else {
            break;
        };

        match opened {
            Ok(reader) => {
                session.machine.connected();
                session.publish_state();
                let connection = ConnectionId::new();
                info!(connection = %connection, resume_from = ?session.last_event_id, "Event stream connected");
                session.emit(StreamEvent::Connected { connection });

                match session.pump(reader).await {
                    Ended::StopRequested => break,
                    Ended::Closed(reason) => {
                        info!(reason = %reason, "Event stream disconnected");
                        session.emit(StreamEvent::Disconnected { reason });
                    }
                }
            }
            Err(e) if !e.is_retryable() => {
                info!(error = %e, "Server refused the stream, not reconnecting");
                session.emit(StreamEvent::Error {
                    message: e.to_string(),
                });
                break;
            }
            Err(e) => {
                warn!(error = %e, "Failed to open event stream");
                session.emit(StreamEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        match session.machine.disconnected() {
            Transition::Retry(delay) => {
                session.publish_state();
                let attempt = match session.machine.state() {
                    ConnectionState::Backoff { attempt, .. } => attempt + 1,
                    _ => 1,
                };
                info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
                session.emit(StreamEvent::Reconnecting { attempt, delay });

                let sleep = tokio::time::sleep(delay);
                if race_commands(sleep, &mut session.command_rx, &mut session.bridge)
                    .await
                    .is_none()
                {
                    break;
                }
            }
            Transition::GiveUp => {
                warn!("Giving up on event stream");
                break;
            }
        }
    }

    session.machine.stop();
    session.publish_state();
    session.emit_stopped();
    info!("Stream client stopped");
}

impl Session {
    /// Read one open stream until it ends or a stop is requested.
    async fn pump(&mut self, reader: EventReader) -> Ended {
        let mut stream = SseStream::with_last_event_id(reader, self.last_event_id.take());

        let ended = loop {
            let next = race_commands(stream.next_item(), &mut self.command_rx, &mut self.bridge).await;
            let Some(next) = next else {
                break Ended::StopRequested;
            };

            match next {
                Ok(Some(SseItem::Event(event))) => {
                    if event.event_type() == self.config.event_name {
                        self.handle_message(&event.data);
                    } else {
                        trace!(event = %event.event_type(), "Ignoring event type");
                    }
                }
                Ok(Some(SseItem::Retry(delay))) => {
                    debug!(delay_ms = delay.as_millis() as u64, "Server set reconnect delay");
                    self.machine.server_retry(delay);
                }
                Ok(None) => break Ended::Closed("stream closed by server".to_string()),
                Err(e) => {
                    warn!(error = %e, "Event stream read failed");
                    self.emit(StreamEvent::Error {
                        message: e.to_string(),
                    });
                    break Ended::Closed(format!("read failed: {e}"));
                }
            }
        };

        self.last_event_id = stream.last_event_id().map(str::to_string);
        ended
    }

    fn handle_message(&mut self, data: &str) {
        match self.bridge.on_message(data) {
            Ok(Outcome::Delivered { replayed }) => {
                trace!(replayed, "Message delivered");
            }
            Ok(Outcome::Dropped) => {}
            Ok(Outcome::Buffered { pending }) => {
                trace!(pending, "Message buffered");
            }
            Err(BridgeError::Decode(e)) => {
                warn!(error = %e, "Discarding malformed payload");
                self.emit(StreamEvent::DecodeFailed {
                    error: e.to_string(),
                });
            }
            Err(BridgeError::TargetMissing { element }) => {
                warn!(element = %element, "Target element missing");
                self.emit(StreamEvent::TargetMissing { element });
            }
        }
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.machine.state().clone());
    }

    /// Never blocks the loop on a slow observer. The last free slot is
    /// held back for [`StreamEvent::Stopped`].
    fn emit(&self, event: StreamEvent) {
        if self.event_tx.capacity() <= 1 {
            debug!(?event, "Event channel full, dropping lifecycle event");
            return;
        }
        let _ = self.event_tx.try_send(event);
    }

    fn emit_stopped(&self) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(StreamEvent::Stopped)
        {
            debug!("Event channel full, Stopped not delivered");
        }
    }
}

/// Drive `fut` to completion while serving client commands.
/// Returns `None` if a stop was requested (or the client went away) first.
async fn race_commands<F: Future>(
    fut: F,
    command_rx: &mut mpsc::Receiver<StreamCommand>,
    bridge: &mut Bridge,
) -> Option<F::Output> {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return Some(out),
            cmd = command_rx.recv() => match cmd {
                Some(StreamCommand::ReplayPending) => {
                    bridge.replay_pending();
                }
                Some(StreamCommand::Stop) | None => return None,
            },
        }
    }
}
