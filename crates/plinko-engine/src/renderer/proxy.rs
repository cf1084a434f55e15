//! Visual proxies for balls.
//!
//! The engine never owns visuals. It asks a [`Visualization`] for a proxy per
//! ball, pushes poses to it after stepping, and releases it on eviction.

use crate::api::types::{BallPose, ProxyId};

/// The visualization collaborator.
pub trait Visualization {
    /// Allocate a proxy for a new ball of the given radius.
    fn create_proxy(&mut self, radius: f32) -> ProxyId;

    /// Move a proxy to a new pose (rig frame).
    fn update_proxy(&mut self, proxy: ProxyId, pose: BallPose);

    /// Release a proxy. Called exactly once per proxy.
    fn release_proxy(&mut self, proxy: ProxyId);
}

/// Flat pose buffer read directly by the host (SharedArrayBuffer / wasm memory).
/// Each proxy is a slot; released slots are zeroed and reused.
pub struct PoseBuffer {
    slots: Vec<BallPose>,
    free: Vec<u32>,
    live: usize,
}

impl PoseBuffer {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of slots, live or free. The host iterates this many poses and
    /// skips those with zero radius.
    pub fn slot_count(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Number of live proxies.
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn get(&self, proxy: ProxyId) -> Option<&BallPose> {
        self.slots.get(proxy.0 as usize).filter(|p| p.radius > 0.0)
    }

    pub fn poses(&self) -> &[BallPose] {
        &self.slots
    }

    /// Raw pointer to pose data for SharedArrayBuffer reads.
    pub fn poses_ptr(&self) -> *const f32 {
        self.slots.as_ptr() as *const f32
    }
}

impl Default for PoseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Visualization for PoseBuffer {
    fn create_proxy(&mut self, radius: f32) -> ProxyId {
        let pose = BallPose {
            qw: 1.0,
            radius,
            ..BallPose::default()
        };
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = pose;
                ProxyId(slot)
            }
            None => {
                self.slots.push(pose);
                ProxyId(self.slots.len() as u32 - 1)
            }
        }
    }

    fn update_proxy(&mut self, proxy: ProxyId, pose: BallPose) {
        if let Some(slot) = self.slots.get_mut(proxy.0 as usize) {
            *slot = pose;
        }
    }

    fn release_proxy(&mut self, proxy: ProxyId) {
        // A zero radius marks a slot that is already free.
        if let Some(slot) = self.slots.get_mut(proxy.0 as usize).filter(|p| p.radius > 0.0) {
            *slot = BallPose::default();
            self.free.push(proxy.0);
            self.live -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_update_release() {
        let mut buf = PoseBuffer::new();
        let a = buf.create_proxy(0.05);
        let b = buf.create_proxy(0.05);
        assert_ne!(a, b);
        assert_eq!(buf.live_count(), 2);

        let pose = BallPose {
            x: 1.0,
            y: 2.0,
            qw: 1.0,
            radius: 0.05,
            ..BallPose::default()
        };
        buf.update_proxy(b, pose);
        assert_eq!(buf.get(b), Some(&pose));

        buf.release_proxy(a);
        assert_eq!(buf.live_count(), 1);
        assert!(buf.get(a).is_none());
        assert_eq!(buf.slot_count(), 2);
    }

    #[test]
    fn releasing_twice_is_harmless() {
        let mut buf = PoseBuffer::new();
        let a = buf.create_proxy(0.05);
        buf.release_proxy(a);
        buf.release_proxy(a);
        buf.release_proxy(ProxyId(99));
        assert_eq!(buf.live_count(), 0);

        let b = buf.create_proxy(0.05);
        let c = buf.create_proxy(0.05);
        assert_ne!(b, c);
        assert_eq!(buf.live_count(), 2);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut buf = PoseBuffer::new();
        let a = buf.create_proxy(0.05);
        let _b = buf.create_proxy(0.05);
        buf.release_proxy(a);
        let c = buf.create_proxy(0.05);
        assert_eq!(c, a);
        assert_eq!(buf.slot_count(), 2);
        assert_eq!(buf.live_count(), 2);
    }
}
