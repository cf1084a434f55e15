use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::api::types::Transform;

// ---------------------------------------------------------------------------
// Conversion helpers (private): glam ↔ nalgebra
// ---------------------------------------------------------------------------

fn vec3_to_na(v: Vec3) -> nalgebra::Vector3<f32> {
    nalgebra::Vector3::new(v.x, v.y, v.z)
}

fn transform_to_na(t: &Transform) -> nalgebra::Isometry3<f32> {
    let q = t.rotation;
    let rotation =
        nalgebra::UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z));
    nalgebra::Isometry3::from_parts(
        nalgebra::Translation3::new(t.position.x, t.position.y, t.position.z),
        rotation,
    )
}

fn na_to_transform(iso: &nalgebra::Isometry3<f32>) -> Transform {
    let v = iso.translation.vector;
    let q = iso.rotation.quaternion().coords;
    Transform {
        position: Vec3::new(v.x, v.y, v.z),
        rotation: Quat::from_xyzw(q.x, q.y, q.z, q.w),
    }
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Collider shape attached to a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
}

impl ColliderShape {
    fn build_collider(&self) -> ColliderBuilder {
        match *self {
            ColliderShape::Sphere { radius } => ColliderBuilder::ball(radius),
            ColliderShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
        }
    }
}

/// Solver material parameters for a body and its collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub density: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.3,
            friction: 0.5,
            density: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

/// Handle pair referencing Rapier internals. Only the registry that created
/// a body should hold its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyId {
    body_handle: RigidBodyHandle,
    collider_handle: ColliderHandle,
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// Wraps the Rapier3D pipeline into a single struct. Operates in the
/// absolute frame; callers map through `CoordinateMapper`.
pub struct PhysicsWorld {
    gravity: nalgebra::Vector3<f32>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Create a new physics world. Y is up, so Earth gravity is `(0, -9.81, 0)`.
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: vec3_to_na(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Register an immovable body. Used for all board geometry.
    pub fn create_fixed(
        &mut self,
        transform: &Transform,
        shape: ColliderShape,
        material: Material,
    ) -> BodyId {
        let rb = RigidBodyBuilder::fixed()
            .position(transform_to_na(transform))
            .build();
        self.insert(rb, shape, material)
    }

    /// Register a body subject to gravity and damping. CCD is always on:
    /// small fast spheres would otherwise tunnel through thin pegs and walls.
    pub fn create_dynamic(
        &mut self,
        transform: &Transform,
        shape: ColliderShape,
        material: Material,
    ) -> BodyId {
        let rb = RigidBodyBuilder::dynamic()
            .position(transform_to_na(transform))
            .ccd_enabled(true)
            .linear_damping(material.linear_damping)
            .angular_damping(material.angular_damping)
            .build();
        self.insert(rb, shape, material)
    }

    fn insert(&mut self, rb: RigidBody, shape: ColliderShape, material: Material) -> BodyId {
        let body_handle = self.bodies.insert(rb);

        let collider = shape
            .build_collider()
            .restitution(material.restitution)
            .friction(material.friction)
            .density(material.density)
            .build();

        let collider_handle =
            self.colliders
                .insert_with_parent(collider, body_handle, &mut self.bodies);

        BodyId {
            body_handle,
            collider_handle,
        }
    }

    /// Remove a body and its collider. Takes the id by value: the caller
    /// gives up its handle.
    pub fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(
            id.body_handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    /// Advance the solver by exactly `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Current transform of a registered body.
    pub fn transform_of(&self, id: BodyId) -> Option<Transform> {
        self.bodies
            .get(id.body_handle)
            .map(|rb| na_to_transform(rb.position()))
    }

    /// Current linear velocity of a body, zero if it no longer exists.
    pub fn velocity(&self, id: BodyId) -> Vec3 {
        self.bodies
            .get(id.body_handle)
            .map(|rb| {
                let v = rb.linvel();
                Vec3::new(v.x, v.y, v.z)
            })
            .unwrap_or(Vec3::ZERO)
    }

    /// Number of rigid bodies in the simulation.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Query the collider shape of a body.
    pub fn collider_shape(&self, id: BodyId) -> Option<ColliderShape> {
        let collider = self.colliders.get(id.collider_handle)?;
        shape_of(collider)
    }

    /// Every collider with its world transform. Read-only; used for debug
    /// wireframes.
    pub fn colliders(&self) -> impl Iterator<Item = (ColliderShape, Transform)> + '_ {
        self.colliders
            .iter()
            .filter_map(|(_, c)| shape_of(c).map(|s| (s, na_to_transform(c.position()))))
    }
}

fn shape_of(collider: &Collider) -> Option<ColliderShape> {
    let shape = collider.shape();
    if let Some(ball) = shape.as_ball() {
        Some(ColliderShape::Sphere {
            radius: ball.radius,
        })
    } else {
        shape.as_cuboid().map(|cuboid| ColliderShape::Cuboid {
            half_extents: Vec3::new(
                cuboid.half_extents.x,
                cuboid.half_extents.y,
                cuboid.half_extents.z,
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
