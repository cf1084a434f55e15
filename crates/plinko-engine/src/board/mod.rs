pub mod config;
pub mod geometry;

use crate::api::config::BoardMaterials;
use crate::api::error::ConfigError;
use crate::board::config::BoardConfig;
use crate::board::geometry::{BoardLayout, BoardPart};
use crate::core::coords::CoordinateMapper;
use crate::core::physics::{BodyId, PhysicsWorld};

/// The board after registration: its layout plus the fixed bodies it owns
/// in the physics world. Built once; never regenerated at runtime.
pub struct Board {
    layout: BoardLayout,
    bodies: Vec<(BoardPart, BodyId)>,
}

impl Board {
    /// Generate the layout and register every piece as a fixed body.
    pub fn build(
        config: &BoardConfig,
        materials: &BoardMaterials,
        physics: &mut PhysicsWorld,
        mapper: &CoordinateMapper,
    ) -> Result<Self, ConfigError> {
        let layout = BoardLayout::generate(config)?;
        let descriptors = layout.fixed_bodies();
        let mut bodies = Vec::with_capacity(descriptors.len());
        for desc in descriptors {
            let material = match desc.part {
                BoardPart::Peg => materials.peg,
                _ => materials.wall,
            };
            let transform = mapper.transform_to_absolute(&desc.transform);
            let id = physics.create_fixed(&transform, desc.shape, material);
            bodies.push((desc.part, id));
        }
        log::info!(
            "board: {} rows, {} pegs, {} wall segments, {} bins, {} fixed bodies",
            config.rows,
            layout.pegs.len(),
            layout.left.len() + layout.right.len(),
            layout.bins.len(),
            bodies.len()
        );
        Ok(Self { layout, bodies })
    }

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn bodies(&self) -> &[(BoardPart, BodyId)] {
        &self.bodies
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
