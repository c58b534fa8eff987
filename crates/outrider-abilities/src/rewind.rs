//! Rewind history buffer.
//!
//! Snapshots are recorded newest-first on the fixed tick and evicted from
//! the tail once the buffer is full. Playback consumes a growing number of
//! snapshots per frame, proportional to how far through the playback
//! window it is, so any amount of history is covered in bounded time.

use std::collections::VecDeque;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Agent pose at one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub position: DVec3,
    pub orientation: DQuat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Playback {
    started_at: f64,
    duration_secs: f64,
}

#[derive(Debug, Clone)]
pub struct RewindBuffer {
    snapshots: VecDeque<Snapshot>,
    capacity: usize,
    speed_multiplier: f64,
    playback: Option<Playback>,
}

impl RewindBuffer {
    /// Buffer holding `window_secs` of history sampled every `tick_secs`.
    pub fn new(window_secs: f64, tick_secs: f64, speed_multiplier: f64) -> Self {
        let capacity = if tick_secs > 0.0 {
            (window_secs / tick_secs).round().max(1.0) as usize
        } else {
            1
        };
        Self::with_capacity(capacity, speed_multiplier)
    }

    pub fn with_capacity(capacity: usize, speed_multiplier: f64) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            speed_multiplier,
            playback: None,
        }
    }

    /// Prepend a snapshot. Ignored during playback.
    pub fn record(&mut self, snapshot: Snapshot) -> bool {
        if self.playback.is_some() {
            return false;
        }
        self.snapshots.push_front(snapshot);
        self.snapshots.truncate(self.capacity);
        true
    }

    /// Enter playback at time `now`. No-op when empty, already playing, or
    /// given a non-positive duration.
    pub fn start_playback(&mut self, duration_secs: f64, now: f64) -> bool {
        if self.snapshots.is_empty()
            || self.playback.is_some()
            || duration_secs.is_nan()
            || duration_secs <= 0.0
        {
            return false;
        }
        self.playback = Some(Playback {
            started_at: now,
            duration_secs,
        });
        true
    }

    /// Leave playback early. Returns whether playback was running.
    pub fn stop_playback(&mut self) -> bool {
        self.playback.take().is_some()
    }

    /// Advance playback to `now` and return the pose to apply, if any.
    ///
    /// Playback ends once the window has elapsed or the buffer runs dry.
    pub fn tick(&mut self, now: f64) -> Option<Snapshot> {
        let playback = self.playback?;
        let elapsed = (now - playback.started_at).max(0.0);
        if elapsed >= playback.duration_secs || self.snapshots.is_empty() {
            self.playback = None;
            return None;
        }

        let remaining = self.snapshots.len();
        let fraction = elapsed / playback.duration_secs;
        let wanted = (self.speed_multiplier * fraction * remaining as f64).ceil();
        let skip = if wanted.is_finite() && wanted > 1.0 {
            (wanted as usize).min(remaining)
        } else {
            1
        };

        let snapshot = self.snapshots[(skip - 1).min(remaining - 1)];
        self.snapshots.drain(..skip);
        if self.snapshots.is_empty() {
            self.playback = None;
        }
        Some(snapshot)
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Snapshots newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(i: usize) -> Snapshot {
        Snapshot {
            position: DVec3::new(i as f64, 0.0, 0.0),
            orientation: DQuat::IDENTITY,
        }
    }

    fn full_buffer(capacity: usize, speed: f64) -> RewindBuffer {
        let mut buf = RewindBuffer::with_capacity(capacity, speed);
        for i in 0..capacity {
            buf.record(snap(i));
        }
        buf
    }

    #[test]
    fn test_capacity_from_window() {
        let buf = RewindBuffer::new(3.0, 0.02, 2.0);
        assert_eq!(buf.capacity(), 150);
        let buf = RewindBuffer::new(1.0, 0.03, 2.0);
        assert_eq!(buf.capacity(), 33, "round(1 / 0.03) = 33");
    }

    #[test]
    fn test_record_evicts_oldest() {
        let mut buf = RewindBuffer::with_capacity(5, 2.0);
        for i in 0..8 {
            buf.record(snap(i));
            assert!(buf.len() <= 5, "Buffer grew past capacity");
        }
        let xs: Vec<f64> = buf.iter().map(|s| s.position.x).collect();
        assert_eq!(xs, vec![7.0, 6.0, 5.0, 4.0, 3.0], "Newest-first, oldest evicted");
    }

    #[test]
    fn test_start_playback_empty_is_noop() {
        let mut buf = RewindBuffer::with_capacity(5, 2.0);
        assert!(!buf.start_playback(2.0, 0.0));
        assert!(!buf.is_playing());
        assert_eq!(buf.tick(0.1), None);
    }

    #[test]
    fn test_record_ignored_during_playback() {
        let mut buf = full_buffer(4, 2.0);
        assert!(buf.start_playback(1.0, 0.0));
        assert!(!buf.record(snap(99)));
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_playback_consumes_everything_once() {
        let mut buf = full_buffer(10, 2.0);
        let initial = buf.len();
        assert!(buf.start_playback(2.0, 0.0));

        let mut consumed = 0;
        let mut applied = Vec::new();
        let mut now = 0.0;
        let mut ended_at = None;
        for _ in 0..1000 {
            let before = buf.len();
            if let Some(s) = buf.tick(now) {
                applied.push(s.position.x);
            }
            consumed += before - buf.len();
            if !buf.is_playing() {
                ended_at = Some(now);
                break;
            }
            now += 1.0 / 60.0;
        }

        assert_eq!(consumed, initial, "Every snapshot consumed exactly once");
        let ended_at = ended_at.expect("playback never ended");
        assert!(ended_at <= 2.0, "Playback ran past its duration: {ended_at}");
        // Poses move backwards through history.
        assert!(applied.windows(2).all(|w| w[1] < w[0]), "Applied {applied:?}");
    }

    #[test]
    fn test_playback_accelerates() {
        let mut buf = full_buffer(100, 2.0);
        buf.start_playback(2.0, 0.0);

        let before = buf.len();
        buf.tick(0.1);
        let early = before - buf.len();

        let before = buf.len();
        buf.tick(0.6);
        let late = before - buf.len();
        assert!(late > early, "Later frames should skip more: {early} vs {late}");
    }

    #[test]
    fn test_playback_ends_at_duration() {
        let mut buf = full_buffer(500, 0.01);
        buf.start_playback(1.0, 0.0);
        assert!(buf.tick(0.5).is_some());
        assert_eq!(buf.tick(1.0), None);
        assert!(!buf.is_playing());
        assert!(!buf.is_empty(), "Slow playback leaves history behind");
    }

    #[test]
    fn test_stop_playback() {
        let mut buf = full_buffer(3, 2.0);
        buf.start_playback(1.0, 0.0);
        assert!(buf.stop_playback());
        assert!(!buf.stop_playback());
        assert!(buf.record(snap(5)));
    }
}
