//! Debug rendering: opt-in collider wireframes.
//!
//! The simulation rebuilds the buffer after stepping only while the toggle is
//! on. Output is a line list in the rig frame: `[x, y, z]` per vertex, two
//! vertices per line.

use glam::Vec3;

use crate::api::types::Transform;
use crate::core::coords::CoordinateMapper;
use crate::core::physics::{ColliderShape, PhysicsWorld};

/// Floats per vertex.
pub const DEBUG_VERTEX_FLOATS: usize = 3;

const CIRCLE_SEGMENTS: usize = 16;

/// Line-list vertex buffer for collider outlines.
#[derive(Default)]
pub struct DebugWireframe {
    vertices: Vec<f32>,
}

impl DebugWireframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear and re-emit outlines for every collider in the world.
    pub fn rebuild(&mut self, physics: &PhysicsWorld, mapper: &CoordinateMapper) {
        self.vertices.clear();
        for (shape, transform) in physics.colliders() {
            let local = mapper.transform_to_local(&transform);
            collider_outline(&local, &shape, &mut self.vertices);
        }
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / DEBUG_VERTEX_FLOATS
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

fn push_line(out: &mut Vec<f32>, a: Vec3, b: Vec3) {
    out.extend_from_slice(&[a.x, a.y, a.z, b.x, b.y, b.z]);
}

/// Emit line segments for a collider shape at a given transform.
fn collider_outline(transform: &Transform, shape: &ColliderShape, out: &mut Vec<f32>) {
    let pos = transform.position;
    let rot = transform.rotation;
    match *shape {
        ColliderShape::Sphere { radius } => {
            // Three great circles, one per local plane.
            let planes: [(Vec3, Vec3); 3] = [
                (Vec3::X, Vec3::Y),
                (Vec3::Y, Vec3::Z),
                (Vec3::Z, Vec3::X),
            ];
            for (u, v) in planes {
                let point = |i: usize| {
                    let angle = (i as f32 / CIRCLE_SEGMENTS as f32) * std::f32::consts::TAU;
                    pos + rot * ((u * angle.cos() + v * angle.sin()) * radius)
                };
                for i in 0..CIRCLE_SEGMENTS {
                    push_line(out, point(i), point(i + 1));
                }
            }
        }
        ColliderShape::Cuboid { half_extents } => {
            let corner = |i: usize| {
                let sign = Vec3::new(
                    if i & 1 == 0 { -1.0 } else { 1.0 },
                    if i & 2 == 0 { -1.0 } else { 1.0 },
                    if i & 4 == 0 { -1.0 } else { 1.0 },
                );
                pos + rot * (sign * half_extents)
            };
            // Each edge joins two corners differing in exactly one bit.
            for i in 0..8usize {
                for bit in [1usize, 2, 4] {
                    if i & bit == 0 {
                        push_line(out, corner(i), corner(i | bit));
                    }
                }
            }
        }
    }
}
