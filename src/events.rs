/*!
 * Control events and their broadcast channel.
 *
 * Events form a closed set, each variant carrying its own typed payload.
 * Subscribers receive them through a tokio broadcast channel; publishing
 * with no subscriber is not an error.
 */

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::loop_control::LoopOrigin;
use crate::navigation::Direction;

/// Payload of a control event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEventKind {
    /// A navigation request was executed
    #[serde(rename_all = "camelCase")]
    SentenceNav {
        direction: Direction,
        from_time: f64,
        to_time: f64,
        matched_text: Option<String>,
    },

    /// A loop was enabled or disabled
    #[serde(rename_all = "camelCase")]
    LoopToggle {
        enabled: bool,
        start_time: Option<f64>,
        end_time: Option<f64>,
        origin: Option<LoopOrigin>,
    },

    /// The playback rate changed
    SpeedChange { from: f64, to: f64 },
}

/// A timestamped control event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    #[serde(flatten)]
    pub kind: ControlEventKind,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl ControlEvent {
    pub fn new(kind: ControlEventKind, timestamp: i64) -> Self {
        Self { kind, timestamp }
    }

    /// Wire name of the event type
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            ControlEventKind::SentenceNav { .. } => "sentence_nav",
            ControlEventKind::LoopToggle { .. } => "loop_toggle",
            ControlEventKind::SpeedChange { .. } => "speed_change",
        }
    }
}

/// Publish/subscribe channel for control events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ControlEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per lagging subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<ControlEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send `event` to every subscriber
    pub fn publish(&self, event: ControlEvent) {
        let event_type = event.event_type();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscribers", event_type, receivers),
            Err(_) => debug!("Dropped {} event: no subscribers", event_type),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Drain every event currently buffered for `receiver`
pub fn drain(receiver: &mut broadcast::Receiver<ControlEvent>) -> Vec<ControlEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Event subscriber lagged, {} events skipped", skipped);
            }
            Err(_) => break,
        }
    }
    events
}
