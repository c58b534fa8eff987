//! Target lock-on tracking.
//!
//! Each update re-evaluates every candidate from scratch. A candidate is
//! admitted when it is within range, inside half the field-of-view cone,
//! and the first thing a ray toward it hits. Admitted candidates that were
//! already locked accrue progress; newcomers start at zero. Anything not
//! admitted this update loses its lock and its progress.

use std::collections::BTreeMap;

use glam::DVec3;

use outrider_core::types::{EntityId, Transform, WidgetId};

/// Lock state for one target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetLock {
    pub target: EntityId,
    pub progress_secs: f64,
    pub widget: Option<WidgetId>,
}

/// A target candidate and where it currently is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub id: EntityId,
    pub position: DVec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Full cone angle in degrees.
    pub fov_angle_deg: f64,
    pub detection_radius: f64,
    /// Progress cap per target.
    pub max_lock_secs: f64,
}

/// Result of one update.
#[derive(Debug, Default)]
pub struct TrackerDelta {
    pub admitted: Vec<EntityId>,
    pub dropped: Vec<TargetLock>,
}

#[derive(Debug, Clone)]
pub struct TargetTracker {
    config: TrackerConfig,
    locks: BTreeMap<EntityId, TargetLock>,
}

impl TargetTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            locks: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Re-evaluate all candidates from the `eye` transform.
    ///
    /// `first_hit(origin, direction, max_distance)` reports the identity of
    /// the first collider along the ray.
    pub fn update<F>(
        &mut self,
        eye: &Transform,
        candidates: &[Candidate],
        dt: f64,
        mut first_hit: F,
    ) -> TrackerDelta
    where
        F: FnMut(DVec3, DVec3, f64) -> Option<EntityId>,
    {
        let mut delta = TrackerDelta::default();
        let mut next = BTreeMap::new();

        for candidate in candidates {
            if next.contains_key(&candidate.id) {
                continue;
            }
            if !self.admits(eye, candidate, &mut first_hit) {
                continue;
            }
            let lock = match self.locks.remove(&candidate.id) {
                Some(mut lock) => {
                    lock.progress_secs =
                        (lock.progress_secs + dt.max(0.0)).min(self.config.max_lock_secs);
                    lock
                }
                None => {
                    delta.admitted.push(candidate.id);
                    TargetLock {
                        target: candidate.id,
                        progress_secs: 0.0,
                        widget: None,
                    }
                }
            };
            next.insert(candidate.id, lock);
        }

        delta.dropped = std::mem::replace(&mut self.locks, next).into_values().collect();
        delta
    }

    /// Range, cone and line-of-sight gate for one candidate.
    pub fn admits<F>(&self, eye: &Transform, candidate: &Candidate, first_hit: &mut F) -> bool
    where
        F: FnMut(DVec3, DVec3, f64) -> Option<EntityId>,
    {
        let to = candidate.position - eye.position;
        let distance = to.length();
        if distance <= f64::EPSILON || distance > self.config.detection_radius {
            return false;
        }
        if eye.angle_to(candidate.position) >= self.config.fov_angle_deg / 2.0 {
            return false;
        }
        first_hit(eye.position, to / distance, self.config.detection_radius) == Some(candidate.id)
    }

    pub fn get(&self, target: EntityId) -> Option<&TargetLock> {
        self.locks.get(&target)
    }

    pub fn set_widget(&mut self, target: EntityId, widget: WidgetId) {
        if let Some(lock) = self.locks.get_mut(&target) {
            lock.widget = Some(widget);
        }
    }

    /// Locks in ascending target order.
    pub fn locks(&self) -> impl Iterator<Item = &TargetLock> {
        self.locks.values()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Drop every lock, returning them for widget cleanup.
    pub fn clear(&mut self) -> Vec<TargetLock> {
        std::mem::take(&mut self.locks).into_values().collect()
    }
}
