pub mod api;
pub mod balls;
pub mod board;
pub mod core;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::config::{BallConfig, BoardMaterials, PhysicsConfig, PlinkoConfig};
pub use api::error::ConfigError;
pub use api::simulation::{FrameReport, Simulation, SimulationStats, SETTLED_SPEED};
pub use api::types::{BallId, BallPose, ProxyId, Transform};
pub use balls::lifecycle::{BallLifecycleManager, BallRecord};
pub use balls::schedule::SpawnSchedule;
pub use board::config::BoardConfig;
pub use board::geometry::{Bin, BoardLayout, BoardPart, Peg, Section, Side, WallSegment};
pub use board::Board;
pub use core::coords::CoordinateMapper;
pub use core::physics::{BodyId, ColliderShape, Material, PhysicsWorld};
pub use core::time::SimulationClock;
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::proxy::{PoseBuffer, Visualization};
pub use systems::debug::{DebugWireframe, DEBUG_VERTEX_FLOATS};
