//! Connection lifecycle as an explicit state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Backoff -> Connecting -> ...
//!                     |                         ^
//!                     +------- failed ----------+
//! any state -> Stopped (stop requested, retries exhausted, or disabled)
//! ```

use std::time::Duration;

use canstream_config::schema::ReconnectConfig;
use serde::Serialize;

use crate::backoff::Backoff;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// Not started yet.
    Disconnected,
    /// Dialing the endpoint. `attempt` counts since the last success.
    Connecting { attempt: u32 },
    Connected,
    /// Waiting `delay` before attempt number `attempt + 1`.
    Backoff { attempt: u32, delay: Duration },
    /// Terminal.
    Stopped,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// What the loop should do after a connection ended or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Retry(Duration),
    GiveUp,
}

#[derive(Debug)]
pub struct ReconnectMachine {
    state: ConnectionState,
    backoff: Backoff,
    enabled: bool,
    max_attempts: Option<u32>,
    attempt: u32,
}

impl ReconnectMachine {
    pub fn new(backoff: Backoff, enabled: bool, max_attempts: Option<u32>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            backoff,
            enabled,
            max_attempts,
            attempt: 0,
        }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Backoff::from_config(config),
            config.enabled,
            config.max_attempts(),
        )
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Enter `Connecting`. Returns false once stopped.
    pub fn begin_connect(&mut self) -> bool {
        if self.state.is_stopped() {
            return false;
        }
        self.attempt += 1;
        self.state = ConnectionState::Connecting {
            attempt: self.attempt,
        };
        true
    }

    /// The endpoint accepted the connection.
    pub fn connected(&mut self) {
        self.attempt = 0;
        self.backoff.reset();
        self.state = ConnectionState::Connected;
    }

    /// The connection failed to open or was lost.
    pub fn disconnected(&mut self) -> Transition {
        if self.state.is_stopped() {
            return Transition::GiveUp;
        }
        let exhausted = self
            .max_attempts
            .is_some_and(|max| self.attempt >= max);
        if !self.enabled || exhausted {
            self.state = ConnectionState::Stopped;
            return Transition::GiveUp;
        }

        let delay = self.backoff.next_delay();
        self.state = ConnectionState::Backoff {
            attempt: self.attempt,
            delay,
        };
        Transition::Retry(delay)
    }

    /// The server sent `retry:`; it becomes the base reconnect delay.
    pub fn server_retry(&mut self, delay: Duration) {
        self.backoff.set_initial(delay);
    }

    pub fn stop(&mut self) {
        self.state = ConnectionState::Stopped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn machine(enabled: bool, max_attempts: Option<u32>) -> ReconnectMachine {
        ReconnectMachine::new(Backoff::new(ms(10), ms(40), 2.0, 0.0), enabled, max_attempts)
    }

    #[test]
    fn starts_disconnected() {
        let m = machine(true, None);
        assert_eq!(m.state(), &ConnectionState::Disconnected);
    }

    #[test]
    fn full_cycle_with_retry() {
        let mut m = machine(true, None);
        assert!(m.begin_connect());
        assert_eq!(m.state(), &ConnectionState::Connecting { attempt: 1 });

        m.connected();
        assert!(m.state().is_connected());

        assert_eq!(m.disconnected(), Transition::Retry(ms(10)));
        assert_eq!(
            m.state(),
            &ConnectionState::Backoff {
                attempt: 0,
                delay: ms(10)
            }
        );

        assert!(m.begin_connect());
        assert_eq!(m.state(), &ConnectionState::Connecting { attempt: 1 });
    }

    #[test]
    fn failed_attempts_grow_delay_and_count() {
        let mut m = machine(true, None);
        let mut delays = Vec::new();
        for _ in 0..4 {
            m.begin_connect();
            match m.disconnected() {
                Transition::Retry(d) => delays.push(d),
                Transition::GiveUp => panic!("gave up"),
            }
        }
        assert_eq!(delays, [ms(10), ms(20), ms(40), ms(40)]);
        m.begin_connect();
        assert_eq!(m.state(), &ConnectionState::Connecting { attempt: 5 });
    }

    #[test]
    fn success_resets_backoff() {
        let mut m = machine(true, None);
        m.begin_connect();
        m.disconnected();
        m.begin_connect();
        m.disconnected();
        m.begin_connect();
        m.connected();
        assert_eq!(m.disconnected(), Transition::Retry(ms(10)));
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut m = machine(true, Some(2));
        m.begin_connect();
        assert!(matches!(m.disconnected(), Transition::Retry(_)));
        m.begin_connect();
        assert_eq!(m.disconnected(), Transition::GiveUp);
        assert!(m.state().is_stopped());
        assert!(!m.begin_connect());
    }

    #[test]
    fn disabled_reconnect_stops_after_first_drop() {
        let mut m = machine(false, None);
        m.begin_connect();
        m.connected();
        assert_eq!(m.disconnected(), Transition::GiveUp);
        assert!(m.state().is_stopped());
    }

    #[test]
    fn stop_is_terminal() {
        let mut m = machine(true, None);
        m.begin_connect();
        m.stop();
        assert_eq!(m.disconnected(), Transition::GiveUp);
        assert!(!m.begin_connect());
    }

    #[test]
    fn server_retry_sets_next_delay() {
        let mut m = machine(true, None);
        m.begin_connect();
        m.connected();
        m.server_retry(ms(3));
        assert_eq!(m.disconnected(), Transition::Retry(ms(3)));
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(ConnectionState::Connecting { attempt: 2 }).unwrap();
        assert_eq!(json["state"], "connecting");
        assert_eq!(json["attempt"], 2);
    }
}
