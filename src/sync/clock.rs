//! External playback clock abstraction

/// The media element that actually plays audio.
///
/// All times are in seconds of media time.
pub trait PlaybackClock: Send {
    /// Total media duration, `None` until metadata is known
    fn duration(&self) -> Option<f64>;

    /// Current playback position
    fn current_time(&self) -> f64;

    /// Move the playback position
    fn seek(&mut self, time: f64);

    fn is_paused(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&mut self, rate: f64);
}

/// Deterministic in-memory clock.
///
/// Time only moves through [`SimulatedClock::advance`] or `seek`.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    duration: Option<f64>,
    time: f64,
    paused: bool,
    rate: f64,
}

impl SimulatedClock {
    /// A paused clock at position zero
    #[must_use]
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            time: 0.0,
            paused: true,
            rate: 1.0,
        }
    }

    /// Advance by `wall_secs` of wall time, scaled by the playback rate.
    ///
    /// Playback pauses itself at the end of the media.
    pub fn advance(&mut self, wall_secs: f64) {
        if self.paused {
            return;
        }
        self.time += wall_secs * self.rate;
        if let Some(duration) = self.duration {
            if self.time >= duration {
                self.time = duration;
                self.paused = true;
            }
        }
    }
}

impl PlaybackClock for SimulatedClock {
    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn seek(&mut self, time: f64) {
        let upper = self.duration.unwrap_or(f64::MAX);
        self.time = time.clamp(0.0, upper.max(0.0));
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn play(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn playback_rate(&self) -> f64 {
        self.rate
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
}
