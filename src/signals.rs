//! Process-local signal bus
//!
//! Shortcuts publish named signals; any part of the window process may
//! subscribe. Publishing with nobody listening is not an error.

use std::fmt;

use tokio::sync::broadcast;
use tracing::debug;

use crate::common::constants::signals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Soft-reset the current encounter
    ResetRequest,
    /// Toggle encounter tracking pause
    PauseRequest,
}

impl Signal {
    pub fn name(self) -> &'static str {
        match self {
            Signal::ResetRequest => signals::RESET_REQUEST,
            Signal::PauseRequest => signals::PAUSE_REQUEST,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cloneable handle for publishing and subscribing to signals
#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<Signal>,
}

impl SignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(signals::BUS_CAPACITY);
        Self { tx }
    }

    /// Publish `signal` to current subscribers, returning how many got it
    pub fn broadcast(&self, signal: Signal) -> usize {
        let delivered = self.tx.send(signal).unwrap_or(0);
        debug!(signal = %signal, delivered, "Broadcast signal");
        delivered
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.tx.subscribe()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_without_subscribers() {
        let bus = SignalBus::new();
        assert_eq!(bus.broadcast(Signal::ResetRequest), 0);
    }

    #[test]
    fn test_every_subscriber_receives_signal() {
        let bus = SignalBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.clone().subscribe();

        assert_eq!(bus.broadcast(Signal::PauseRequest), 2);
        assert_eq!(first.try_recv().unwrap(), Signal::PauseRequest);
        assert_eq!(second.try_recv().unwrap(), Signal::PauseRequest);
    }

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::ResetRequest.name(), "reset-request");
        assert_eq!(Signal::PauseRequest.name(), "pause-request");
    }
}
