use plinko_engine::{
    BallPose, ConfigError, FrameReport, InputEvent, PlinkoConfig, PoseBuffer, Simulation,
    SimulationStats, DEBUG_VERTEX_FLOATS,
};

/// Owns a simulation and the pose buffer the host reads.
///
/// The crate root keeps one of these in a `thread_local!` and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// structs holding generic collaborators directly.
pub struct PlinkoRunner {
    sim: Simulation,
    poses: PoseBuffer,
    last_report: FrameReport,
    /// Bin counts, refreshed after every frame for SharedArrayBuffer reads.
    histogram: Vec<u32>,
}

impl PlinkoRunner {
    pub fn new(config: PlinkoConfig) -> Result<Self, ConfigError> {
        let sim = Simulation::new(config)?;
        let poses = PoseBuffer::with_capacity(sim.config().balls.cap);
        let histogram = vec![0; sim.layout().channel_count()];
        Ok(Self {
            sim,
            poses,
            last_report: FrameReport::default(),
            histogram,
        })
    }

    /// Parse a JSON config (empty string means defaults) and build.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config = if json.trim().is_empty() {
            PlinkoConfig::default()
        } else {
            PlinkoConfig::from_json(json)?
        };
        Self::new(config)
    }

    /// Queue a command for the next frame.
    pub fn push_input(&mut self, event: InputEvent) {
        self.sim.push_input(event);
    }

    /// Advance to the host timestamp and refresh the readable buffers.
    pub fn frame(&mut self, timestamp_ms: f64) -> u32 {
        self.last_report = self.sim.frame(timestamp_ms, &mut self.poses);
        self.histogram = self.sim.bin_histogram();
        self.last_report.ticks
    }

    pub fn last_report(&self) -> FrameReport {
        self.last_report
    }

    pub fn stats(&self) -> SimulationStats {
        self.sim.stats()
    }

    pub fn board_json(&self) -> String {
        match self.sim.board_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("board layout serialization failed: {}", e);
                String::new()
            }
        }
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    // ---- Pointer accessors for SharedArrayBuffer reads ----

    pub fn poses_ptr(&self) -> *const f32 {
        self.poses.poses_ptr()
    }

    /// Slots in the pose buffer, live or released (radius 0).
    pub fn pose_slot_count(&self) -> u32 {
        self.poses.slot_count()
    }

    pub fn pose_floats(&self) -> u32 {
        BallPose::FLOATS as u32
    }

    pub fn live_balls(&self) -> u32 {
        self.poses.live_count() as u32
    }

    pub fn debug_ptr(&self) -> *const f32 {
        self.sim.debug_vertices().as_ptr()
    }

    pub fn debug_vertex_count(&self) -> u32 {
        (self.sim.debug_vertices().len() / DEBUG_VERTEX_FLOATS) as u32
    }

    pub fn histogram_ptr(&self) -> *const u32 {
        self.histogram.as_ptr()
    }

    pub fn histogram_len(&self) -> u32 {
        self.histogram.len() as u32
    }
}
