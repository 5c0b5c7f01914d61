//! Per-tile dirty flags and the interval timers that debounce rebuilds.

use crate::constants::{BOUNDS_REFRESH_INTERVAL, CLUSTER_REBUILD_INTERVAL, CONNECTION_REBUILD_INTERVAL};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RebuildState {
    pub bounds_dirty: bool,
    bounds_timer: f32,
    pub connections_dirty: bool,
    connections_timer: f32,
    pub cluster_dirty: bool,
    cluster_timer: f32,
}

impl RebuildState {
    /// State of a freshly placed tile: bounds known, everything derived still pending.
    pub fn fresh() -> Self {
        Self {
            connections_dirty: true,
            cluster_dirty: true,
            ..Self::default()
        }
    }

    /// Connectors and cluster surface need rebuilding; restarts both debounce timers.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.connections_dirty = true;
        self.connections_timer = 0.0;
        self.cluster_dirty = true;
        self.cluster_timer = 0.0;
    }

    #[inline]
    pub fn mark_bounds_dirty(&mut self) {
        self.bounds_dirty = true;
    }

    /// Requests a cluster rebuild without restarting a pending timer.
    #[inline]
    pub fn mark_cluster_dirty(&mut self) {
        self.cluster_dirty = true;
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        !self.bounds_dirty && !self.connections_dirty && !self.cluster_dirty
    }

    /// The bounds timer runs continuously; a refresh is due once it is dirty and
    /// the interval has elapsed.
    pub fn advance_bounds(&mut self, dt: f32) -> bool {
        self.bounds_timer += dt;
        if self.bounds_dirty && self.bounds_timer >= BOUNDS_REFRESH_INTERVAL {
            self.bounds_timer = 0.0;
            self.bounds_dirty = false;
            return true;
        }
        false
    }

    pub fn advance_connections(&mut self, dt: f32) -> bool {
        step(&mut self.connections_dirty, &mut self.connections_timer, dt, CONNECTION_REBUILD_INTERVAL)
    }

    pub fn advance_cluster(&mut self, dt: f32) -> bool {
        step(&mut self.cluster_dirty, &mut self.cluster_timer, dt, CLUSTER_REBUILD_INTERVAL)
    }

    /// Clears every flag; used after an immediate rebuild.
    pub(crate) fn settle(&mut self) {
        *self = Self {
            bounds_timer: self.bounds_timer,
            ..Self::default()
        };
    }
}

#[inline]
fn step(dirty: &mut bool, timer: &mut f32, dt: f32, interval: f32) -> bool {
    if !*dirty {
        return false;
    }
    *timer += dt;
    if *timer >= interval {
        *timer = 0.0;
        *dirty = false;
        return true;
    }
    false
}
