//! Domain event broadcasting.
//!
//! The engines emit a small set of domain events through the [`Broadcaster`]
//! capability. The default implementation fans out over a tokio broadcast
//! channel for in-process consumers; a gateway can provide its own.

use serde_json::Value;
use tokio::sync::broadcast;

/// Capability for emitting named domain events.
pub trait Broadcaster: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// An emitted event with its JSON payload.
#[derive(Debug, Clone)]
pub struct EngineEvent {
    pub event: String,
    pub payload: Value,
}

/// Broadcast-channel backed event sink.
pub struct ChannelBroadcaster {
    tx: broadcast::Sender<EngineEvent>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Subscribe to emitted events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn emit(&self, event: &str, payload: Value) {
        // No receivers is fine; events are fire-and-forget.
        let _ = self.tx.send(EngineEvent {
            event: event.to_string(),
            payload,
        });
    }
}
