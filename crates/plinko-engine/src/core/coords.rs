use glam::Vec3;

use crate::api::types::Transform;

/// Maps between the local rig frame (where the board is authored) and the
/// absolute frame the solver runs in. A pure translation, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    offset: Vec3,
}

impl CoordinateMapper {
    /// `offset` is the absolute position of the rig origin.
    pub fn new(offset: Vec3) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn to_absolute(&self, local: Vec3) -> Vec3 {
        local + self.offset
    }

    pub fn to_local(&self, absolute: Vec3) -> Vec3 {
        absolute - self.offset
    }

    /// Orientation is shared by both frames.
    pub fn transform_to_absolute(&self, local: &Transform) -> Transform {
        Transform {
            position: self.to_absolute(local.position),
            rotation: local.rotation,
        }
    }

    pub fn transform_to_local(&self, absolute: &Transform) -> Transform {
        Transform {
            position: self.to_local(absolute.position),
            rotation: absolute.rotation,
        }
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}
