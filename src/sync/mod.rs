//! Row playback synchronized with an external clock
//!
//! [`SyncClock`] tracks which row is playing, computes each row's
//! playback window, and stops the clock when the window ends. The stop
//! check is a frame watch: while the clock is still short of the
//! boundary, a frame is requested and the host calls
//! [`SyncClock::on_frame`] on the next rendered frame.
//!
//! ```text
//!  Idle ──play(i)──▶ Playing(i) ──play(i) / stop / boundary / peer pause──▶ Idle
//!                       │
//!                       └──play(j)──▶ Playing(j)   (seeks to window start)
//! ```

pub mod clock;
pub mod events;

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::data::RowRecord;

pub use clock::{PlaybackClock, SimulatedClock};
pub use events::SyncEvent;

/// Playback time range of one row, clamped to the media duration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackWindow {
    pub start: f64,
    pub end: f64,
}

/// Handle of a requested frame check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u64);

/// Playback state for one component
pub struct SyncClock {
    clock: Option<Box<dyn PlaybackClock>>,
    outgoing: Option<UnboundedSender<SyncEvent>>,
    playing_id: Option<usize>,
    boundary: Option<f64>,
    pending_frame: Option<FrameId>,
    frame_seq: u64,
}

impl SyncClock {
    /// `outgoing` receives `play`/`pause` events for the sync peer
    #[must_use]
    pub fn new(outgoing: Option<UnboundedSender<SyncEvent>>) -> Self {
        Self {
            clock: None,
            outgoing,
            playing_id: None,
            boundary: None,
            pending_frame: None,
            frame_seq: 0,
        }
    }

    /// Replace the channel that receives outgoing events
    pub fn set_outgoing(&mut self, outgoing: Option<UnboundedSender<SyncEvent>>) {
        self.outgoing = outgoing;
    }

    pub fn attach_clock(&mut self, clock: Box<dyn PlaybackClock>) {
        self.clock = Some(clock);
    }

    /// Remove the clock; playback operations become no-ops
    pub fn detach_clock(&mut self) -> Option<Box<dyn PlaybackClock>> {
        self.cancel_watch();
        self.boundary = None;
        self.playing_id = None;
        self.clock.take()
    }

    #[must_use]
    pub fn clock(&self) -> Option<&dyn PlaybackClock> {
        self.clock.as_deref()
    }

    pub fn clock_mut(&mut self) -> Option<&mut (dyn PlaybackClock + 'static)> {
        self.clock.as_deref_mut()
    }

    /// Row currently playing
    #[must_use]
    pub fn playing_id(&self) -> Option<usize> {
        self.playing_id
    }

    /// Armed stop boundary
    #[must_use]
    pub fn boundary(&self) -> Option<f64> {
        self.boundary
    }

    /// Frame check waiting to run
    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    /// Window for row `index`, recorded as the stop boundary.
    ///
    /// `None` when there is no clock, its duration is unknown, or the
    /// row does not exist.
    pub fn current_window(&mut self, rows: &[RowRecord], index: usize) -> Option<PlaybackWindow> {
        let total = self.clock.as_ref()?.duration()?;
        if !total.is_finite() || total < 0.0 {
            return None;
        }
        let row = rows.get(index)?;

        let start = row.start.unwrap_or(0.0).clamp(0.0, total);
        let raw_end = match row.duration {
            Some(duration) => start + duration,
            None => row.end.unwrap_or(total),
        };
        let end = raw_end.clamp(start, total);

        self.boundary = Some(end);
        Some(PlaybackWindow { start, end })
    }

    /// Play row `index`, or pause it if it is already playing.
    pub fn play(&mut self, rows: &[RowRecord], index: usize) {
        if self.clock.is_none() {
            return;
        }
        let Some(window) = self.current_window(rows, index) else {
            return;
        };
        self.cancel_watch();

        let running = self.clock.as_ref().is_some_and(|c| !c.is_paused());
        if running && self.playing_id == Some(index) {
            if let Some(clock) = self.clock.as_mut() {
                clock.pause();
            }
            self.boundary = None;
            self.playing_id = None;
            self.emit_pause();
            info!(row = index, "toggled pause");
            return;
        }

        if let Some(clock) = self.clock.as_mut() {
            clock.seek(window.start);
            clock.play();
        }
        self.emit_play();
        self.playing_id = Some(index);
        info!(row = index, start = window.start, end = window.end, "playing row");

        self.stop(false);
    }

    /// Stop playback.
    ///
    /// Unless `forced`, a clock still short of the boundary is not
    /// stopped; a frame check is requested instead. A clock that is
    /// already paused ends row playback without another `pause` event.
    pub fn stop(&mut self, forced: bool) {
        let Some((paused, now)) = self.clock.as_ref().map(|c| (c.is_paused(), c.current_time()))
        else {
            return;
        };

        if !forced && !paused {
            if let Some(boundary) = self.boundary {
                if now < boundary {
                    self.request_frame();
                    return;
                }
            }
        }

        self.cancel_watch();
        self.boundary = None;
        if !paused {
            if let Some(clock) = self.clock.as_mut() {
                clock.pause();
            }
            self.emit_pause();
        }
        if let Some(row) = self.playing_id.take() {
            info!(row, forced, paused_elsewhere = paused, "stopped row");
        }
    }

    /// Run the frame check `id` if it is still the pending one.
    ///
    /// Returns `false` for stale or cancelled frames.
    pub fn on_frame(&mut self, id: FrameId) -> bool {
        if self.pending_frame != Some(id) {
            debug!(?id, "ignoring stale frame");
            return false;
        }
        self.pending_frame = None;
        self.stop(false);
        true
    }

    /// Recompute the playing row's window after a rate or duration change
    pub fn recalc(&mut self, rows: &[RowRecord]) {
        let Some(index) = self.playing_id else {
            return;
        };
        self.cancel_watch();
        if self.current_window(rows, index).is_some() {
            self.stop(false);
        } else {
            self.stop(true);
        }
    }

    /// Apply an event received from the sync peer
    pub fn handle_sync(&mut self, rows: &[RowRecord], event: SyncEvent) {
        debug!(event = event.name(), "sync event received");
        match event {
            SyncEvent::Pause { .. } => self.stop(true),
            SyncEvent::Seek { time } => {
                if let Some(clock) = self.clock.as_mut() {
                    clock.seek(time);
                }
                self.stop(false);
            }
            SyncEvent::Speed { speed } => {
                if let Some(clock) = self.clock.as_mut() {
                    clock.set_playback_rate(speed);
                }
                self.recalc(rows);
            }
            SyncEvent::Play { .. } => {}
        }
    }

    /// Cancel the watch and drop the peer channel
    pub fn teardown(&mut self) {
        self.cancel_watch();
        self.boundary = None;
        self.outgoing = None;
    }

    fn request_frame(&mut self) {
        self.frame_seq += 1;
        let id = FrameId(self.frame_seq);
        self.pending_frame = Some(id);
        debug!(?id, boundary = ?self.boundary, "boundary not reached, waiting a frame");
    }

    fn cancel_watch(&mut self) {
        self.pending_frame = None;
    }

    fn emit_play(&self) {
        if let Some((playing, time)) = self.clock_status() {
            self.emit(SyncEvent::Play { playing, time });
        }
    }

    fn emit_pause(&self) {
        if let Some((playing, time)) = self.clock_status() {
            self.emit(SyncEvent::Pause { playing, time });
        }
    }

    fn clock_status(&self) -> Option<(bool, f64)> {
        self.clock
            .as_ref()
            .map(|c| (!c.is_paused(), c.current_time()))
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.outgoing {
            if tx.send(event).is_err() {
                debug!(event = event.name(), "sync peer gone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    fn rows(values: serde_json::Value) -> Vec<RowRecord> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(RowRecord::from_json)
            .collect()
    }

    fn sync_with_clock(duration: Option<f64>) -> (SyncClock, UnboundedReceiver<SyncEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut sync = SyncClock::new(Some(tx));
        sync.attach_clock(Box::new(SimulatedClock::new(duration)));
        (sync, rx)
    }

    fn drain(rx: &mut UnboundedReceiver<SyncEvent>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        names
    }

    #[test]
    fn test_window_is_clamped() {
        let (mut sync, _rx) = sync_with_clock(Some(10.0));
        let rows = rows(json!([{"start": -2, "duration": 100}]));

        let window = sync.current_window(&rows, 0).unwrap();
        assert_eq!(window, PlaybackWindow { start: 0.0, end: 10.0 });
        assert_eq!(sync.boundary(), Some(10.0));
    }

    #[test]
    fn test_window_end_sources() {
        let (mut sync, _rx) = sync_with_clock(Some(60.0));
        let rows = rows(json!([
            {"start": 5, "duration": 2, "end": 40},
            {"start": 5, "end": 8},
            {"start": 5},
            {"start": 70},
            {"start": 10, "end": 3}
        ]));

        assert_eq!(sync.current_window(&rows, 0).unwrap().end, 7.0);
        assert_eq!(sync.current_window(&rows, 1).unwrap().end, 8.0);
        assert_eq!(sync.current_window(&rows, 2).unwrap().end, 60.0);
        assert_eq!(
            sync.current_window(&rows, 3).unwrap(),
            PlaybackWindow { start: 60.0, end: 60.0 }
        );
        assert_eq!(
            sync.current_window(&rows, 4).unwrap(),
            PlaybackWindow { start: 10.0, end: 10.0 }
        );
    }

    #[test]
    fn test_window_requires_duration() {
        let (mut sync, _rx) = sync_with_clock(None);
        let rows = rows(json!([{"start": 0, "end": 5}]));
        assert!(sync.current_window(&rows, 0).is_none());
        assert!(sync.boundary().is_none());
    }

    #[test]
    fn test_play_seeks_and_arms_watch() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}, {"start": 5, "end": 10}]));

        sync.play(&rows, 1);

        let clock = sync.clock().unwrap();
        assert!(!clock.is_paused());
        assert_eq!(clock.current_time(), 5.0);
        assert_eq!(sync.playing_id(), Some(1));
        assert_eq!(sync.boundary(), Some(10.0));
        assert!(sync.pending_frame().is_some());
        assert_eq!(drain(&mut rx), vec!["play"]);
    }

    #[test]
    fn test_play_twice_toggles_pause() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));

        sync.play(&rows, 0);
        sync.play(&rows, 0);

        assert!(sync.clock().unwrap().is_paused());
        assert_eq!(sync.playing_id(), None);
        assert!(sync.pending_frame().is_none());
        assert_eq!(drain(&mut rx), vec!["play", "pause"]);
    }

    #[test]
    fn test_switching_rows_supersedes_watch() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}, {"start": 20, "end": 25}]));

        sync.play(&rows, 0);
        let first = sync.pending_frame().unwrap();
        sync.play(&rows, 1);

        assert_eq!(sync.playing_id(), Some(1));
        assert_eq!(sync.clock().unwrap().current_time(), 20.0);
        assert!(!sync.on_frame(first));
        assert_eq!(sync.playing_id(), Some(1));
        assert_eq!(drain(&mut rx), vec!["play", "play"]);
    }

    #[test]
    fn test_frame_watch_stops_at_boundary() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        sync.clock_mut().unwrap().seek(4.0);
        let frame = sync.pending_frame().unwrap();
        assert!(sync.on_frame(frame));
        assert_eq!(sync.playing_id(), Some(0));

        sync.clock_mut().unwrap().seek(5.0);
        let frame = sync.pending_frame().unwrap();
        assert!(sync.on_frame(frame));

        assert_eq!(sync.playing_id(), None);
        assert!(sync.pending_frame().is_none());
        assert!(sync.boundary().is_none());
        assert!(sync.clock().unwrap().is_paused());
        assert_eq!(drain(&mut rx), vec!["play", "pause"]);
    }

    #[test]
    fn test_forced_stop_is_idempotent() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        sync.stop(true);
        sync.stop(true);

        assert_eq!(sync.playing_id(), None);
        assert_eq!(drain(&mut rx), vec!["play", "pause"]);
    }

    #[test]
    fn test_no_clock_is_noop() {
        let (tx, mut rx) = unbounded_channel();
        let mut sync = SyncClock::new(Some(tx));
        let rows = rows(json!([{"start": 0, "end": 5}]));

        sync.play(&rows, 0);
        sync.stop(true);
        sync.handle_sync(&rows, SyncEvent::Seek { time: 3.0 });

        assert_eq!(sync.playing_id(), None);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_peer_pause_forces_stop() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        sync.handle_sync(&rows, SyncEvent::Pause { playing: false, time: 1.0 });

        assert_eq!(sync.playing_id(), None);
        assert_eq!(drain(&mut rx), vec!["play", "pause"]);
    }

    #[test]
    fn test_peer_seek_inside_window_keeps_playing() {
        let (mut sync, _rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        sync.handle_sync(&rows, SyncEvent::Seek { time: 2.5 });

        assert_eq!(sync.playing_id(), Some(0));
        assert_eq!(sync.clock().unwrap().current_time(), 2.5);
        assert!(sync.pending_frame().is_some());
    }

    #[test]
    fn test_peer_seek_past_window_halts() {
        let (mut sync, _rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        sync.handle_sync(&rows, SyncEvent::Seek { time: 7.0 });

        assert_eq!(sync.playing_id(), None);
        assert!(sync.clock().unwrap().is_paused());
        assert_eq!(sync.clock().unwrap().current_time(), 7.0);
    }

    #[test]
    fn test_peer_speed_sets_rate_and_rearms() {
        let (mut sync, _rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);
        let before = sync.pending_frame().unwrap();

        sync.handle_sync(&rows, SyncEvent::Speed { speed: 1.5 });

        assert_eq!(sync.clock().unwrap().playback_rate(), 1.5);
        assert_eq!(sync.boundary(), Some(5.0));
        let after = sync.pending_frame().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_media_paused_at_end_returns_to_idle() {
        let (mut sync, mut rx) = sync_with_clock(Some(10.0));
        let rows = rows(json!([{"start": 2}]));
        sync.play(&rows, 0);

        // media reaches its end and pauses on its own
        let clock = sync.clock_mut().unwrap();
        clock.seek(10.0);
        clock.pause();
        let frame = sync.pending_frame().unwrap();
        assert!(sync.on_frame(frame));

        assert_eq!(sync.playing_id(), None);
        assert!(sync.boundary().is_none());
        assert!(sync.pending_frame().is_none());
        assert_eq!(drain(&mut rx), vec!["play"]);

        sync.play(&rows, 0);

        assert_eq!(sync.playing_id(), Some(0));
        assert!(!sync.clock().unwrap().is_paused());
        assert_eq!(sync.clock().unwrap().current_time(), 2.0);
        assert_eq!(drain(&mut rx), vec!["play"]);
    }

    #[test]
    fn test_peer_pause_on_paused_clock_returns_to_idle() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);
        sync.clock_mut().unwrap().pause();

        sync.handle_sync(&rows, SyncEvent::Pause { playing: false, time: 1.0 });

        assert_eq!(sync.playing_id(), None);
        assert!(sync.boundary().is_none());
        assert!(sync.pending_frame().is_none());
        assert_eq!(drain(&mut rx), vec!["play"]);
    }

    #[test]
    fn test_recalc_without_duration_stops_row() {
        let (mut sync, mut rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);

        // media swapped for a stream of unknown length
        sync.attach_clock(Box::new(SimulatedClock::new(None)));
        sync.clock_mut().unwrap().play();
        sync.recalc(&rows);

        assert_eq!(sync.playing_id(), None);
        assert!(sync.pending_frame().is_none());
        assert!(sync.clock().unwrap().is_paused());
        assert_eq!(drain(&mut rx), vec!["play", "pause"]);
    }

    #[test]
    fn test_recalc_when_idle_is_noop() {
        let (mut sync, _rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.recalc(&rows);
        assert!(sync.boundary().is_none());
        assert!(sync.pending_frame().is_none());
    }

    #[test]
    fn test_teardown_cancels_watch() {
        let (mut sync, _rx) = sync_with_clock(Some(30.0));
        let rows = rows(json!([{"start": 0, "end": 5}]));
        sync.play(&rows, 0);
        let frame = sync.pending_frame().unwrap();

        sync.teardown();

        assert!(sync.pending_frame().is_none());
        assert!(!sync.on_frame(frame));
    }
}
