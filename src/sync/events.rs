//! Events exchanged with the sync peer

use serde::{Deserialize, Serialize};

/// A named sync event.
///
/// Serialized with the event name in an `event` field, e.g.
/// `{"event":"seek","time":4.2}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SyncEvent {
    Play { playing: bool, time: f64 },
    Pause { playing: bool, time: f64 },
    Seek { time: f64 },
    Speed { speed: f64 },
}

impl SyncEvent {
    /// Event name on the wire
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Pause { .. } => "pause",
            Self::Seek { .. } => "seek",
            Self::Speed { .. } => "speed",
        }
    }
}
