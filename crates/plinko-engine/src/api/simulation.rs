use serde::Serialize;

use crate::api::config::PlinkoConfig;
use crate::api::error::ConfigError;
use crate::api::types::BallId;
use crate::balls::lifecycle::BallLifecycleManager;
use crate::balls::schedule::SpawnSchedule;
use crate::board::geometry::BoardLayout;
use crate::board::Board;
use crate::core::coords::CoordinateMapper;
use crate::core::physics::PhysicsWorld;
use crate::core::time::SimulationClock;
use crate::input::queue::{InputEvent, InputQueue};
use crate::renderer::proxy::Visualization;
use crate::systems::debug::DebugWireframe;

/// Speed (m/s) below which a ball in a bin counts as landed.
pub const SETTLED_SPEED: f32 = 0.25;

/// What one call to [`Simulation::frame`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Physics ticks run this frame.
    pub ticks: u32,
    /// Balls dropped this frame, immediate and scheduled.
    pub spawned: u32,
}

/// Counters for the host UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimulationStats {
    pub total_ticks: u64,
    pub simulated_time: f64,
    pub active_balls: usize,
    pub total_spawned: u64,
    pub total_evicted: u64,
    pub pending_spawns: u64,
}

/// A Galton board: static geometry, a physics world and the live balls,
/// advanced by host frame timestamps.
pub struct Simulation {
    config: PlinkoConfig,
    mapper: CoordinateMapper,
    physics: PhysicsWorld,
    board: Board,
    balls: BallLifecycleManager,
    schedule: SpawnSchedule,
    clock: SimulationClock,
    input: InputQueue,
    debug: Option<DebugWireframe>,
    last_timestamp: Option<f64>,
    /// Simulation-side milliseconds (sum of clamped frame deltas). Drives the
    /// spawn schedule.
    now_ms: f64,
}

impl Simulation {
    /// Validate the config, bring up physics and register the board.
    /// Fails before any body exists if the config is unusable.
    pub fn new(config: PlinkoConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mapper = CoordinateMapper::new(config.origin);
        let mut physics = PhysicsWorld::new(config.physics.gravity);
        let board = Board::build(&config.board, &config.materials, &mut physics, &mapper)?;
        let balls = BallLifecycleManager::new(&config.balls, board.layout());
        let clock = SimulationClock::new(config.physics.fixed_dt, config.physics.max_frame_delta);

        log::info!(
            "simulation ready: tick {:.5}s, cap {} balls, origin {:?}",
            config.physics.fixed_dt,
            config.balls.cap,
            config.origin
        );

        Ok(Self {
            config,
            mapper,
            physics,
            board,
            balls,
            schedule: SpawnSchedule::new(),
            clock,
            input: InputQueue::new(),
            debug: None,
            last_timestamp: None,
            now_ms: 0.0,
        })
    }

    /// Queue a command for the start of the next frame.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Advance to `timestamp_ms` (host clock, milliseconds).
    ///
    /// Order: queued commands, at most one scheduled spawn, the due physics
    /// ticks, then one pose sync reflecting the last tick, then the optional
    /// wireframe. The first frame only establishes the time base.
    pub fn frame<V: Visualization>(&mut self, timestamp_ms: f64, vis: &mut V) -> FrameReport {
        let raw = match self.last_timestamp {
            Some(prev) => (timestamp_ms - prev) / 1000.0,
            None => 0.0,
        };
        if timestamp_ms.is_finite() {
            self.last_timestamp = Some(timestamp_ms);
        }
        let delta = self.clock.clamp_delta(raw);
        if raw > self.clock.max_frame_delta() {
            log::warn!("frame delta {:.3}s clamped to {:.3}s", raw, delta);
        }
        self.now_ms += delta * 1000.0;

        let mut report = FrameReport::default();

        for event in self.input.drain() {
            self.apply(event, vis, &mut report);
        }

        if self.schedule.pop_due(self.now_ms) {
            self.balls.spawn(&mut self.physics, &self.mapper, vis);
            report.spawned += 1;
        }

        let ticks = self.clock.advance(delta);
        let dt = self.clock.tick() as f32;
        for _ in 0..ticks {
            self.physics.step(dt);
        }
        report.ticks = ticks;

        if ticks > 0 {
            self.balls.sync_poses(&self.physics, &self.mapper, vis);
        }

        if let Some(wire) = self.debug.as_mut() {
            wire.rebuild(&self.physics, &self.mapper);
        }

        report
    }

    fn apply<V: Visualization>(&mut self, event: InputEvent, vis: &mut V, report: &mut FrameReport) {
        match event {
            InputEvent::SpawnBall => {
                self.spawn_ball(vis);
                report.spawned += 1;
            }
            InputEvent::SpawnBatch { count, delay_ms } => self.spawn_batch(count, delay_ms),
            InputEvent::CancelBatch => {
                self.cancel_batch();
            }
            InputEvent::SetDebug(enabled) => self.set_debug_wireframe(enabled),
            InputEvent::Reset => self.reset(vis),
        }
    }

    /// Drop one ball immediately, evicting the oldest if over the cap.
    pub fn spawn_ball<V: Visualization>(&mut self, vis: &mut V) -> BallId {
        self.balls.spawn(&mut self.physics, &self.mapper, vis)
    }

    /// Schedule `count` balls, `delay_ms` apart, starting now.
    pub fn spawn_batch(&mut self, count: u32, delay_ms: f64) {
        self.schedule.schedule_batch(self.now_ms, count, delay_ms);
    }

    /// Schedule a batch with the configured pacing.
    pub fn spawn_batch_default(&mut self, count: u32) {
        let delay = self.config.balls.batch_delay_ms;
        self.spawn_batch(count, delay);
    }

    /// Stop a running batch. Returns how many spawns were dropped.
    pub fn cancel_batch(&mut self) -> u64 {
        self.schedule.cancel()
    }

    pub fn set_debug_wireframe(&mut self, enabled: bool) {
        match (enabled, self.debug.is_some()) {
            (true, false) => self.debug = Some(DebugWireframe::new()),
            (false, true) => self.debug = None,
            _ => return,
        }
        log::info!("debug wireframe {}", if enabled { "on" } else { "off" });
    }

    pub fn debug_wireframe_enabled(&self) -> bool {
        self.debug.is_some()
    }

    /// The last rebuilt wireframe. Empty while disabled.
    pub fn debug_vertices(&self) -> &[f32] {
        self.debug.as_ref().map(|w| w.vertices()).unwrap_or(&[])
    }

    /// Remove every ball, cancel pending spawns and restart the clock and
    /// counters. The spawn RNG is reseeded, so a reset run replays the first.
    pub fn reset<V: Visualization>(&mut self, vis: &mut V) {
        let removed = self.balls.clear(&mut self.physics, vis);
        self.schedule.cancel();
        self.clock.reset();
        self.now_ms = 0.0;
        self.balls = BallLifecycleManager::new(&self.config.balls, self.board.layout());
        log::info!("simulation reset ({} balls removed)", removed);
    }

    /// Count balls resting below the divider tops, per channel. Balls still
    /// moving faster than [`SETTLED_SPEED`] are not counted yet.
    pub fn bin_histogram(&self) -> Vec<u32> {
        let layout = self.board.layout();
        let cfg = &layout.config;
        let top = cfg.floor_y + cfg.bin_height;
        let mut counts = vec![0u32; layout.channel_count()];
        for record in self.balls.iter() {
            let Some(t) = self.physics.transform_of(record.body) else {
                continue;
            };
            let p = self.mapper.to_local(t.position);
            let settled = self.physics.velocity(record.body).length() < SETTLED_SPEED;
            if settled && p.y < top && p.y > cfg.floor_y {
                counts[layout.bin_index(p.x)] += 1;
            }
        }
        counts
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            total_ticks: self.clock.total_ticks(),
            simulated_time: self.clock.simulated_time(),
            active_balls: self.balls.len(),
            total_spawned: self.balls.total_spawned(),
            total_evicted: self.balls.total_evicted(),
            pending_spawns: self.schedule.pending(),
        }
    }

    /// Board layout as JSON, for hosts that build their own board visuals.
    pub fn board_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self.board.layout())
    }

    pub fn config(&self) -> &PlinkoConfig {
        &self.config
    }

    pub fn layout(&self) -> &BoardLayout {
        self.board.layout()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn balls(&self) -> &BallLifecycleManager {
        &self.balls
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }
}
