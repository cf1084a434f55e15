use std::collections::VecDeque;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::api::config::BallConfig;
use crate::api::types::{BallId, BallPose, ProxyId, Transform};
use crate::board::geometry::BoardLayout;
use crate::core::coords::CoordinateMapper;
use crate::core::physics::{BodyId, ColliderShape, Material, PhysicsWorld};
use crate::renderer::proxy::Visualization;

/// Association between a ball, its body and its visual proxy.
/// The engine never stores body data on the visual side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallRecord {
    pub id: BallId,
    pub body: BodyId,
    pub proxy: ProxyId,
}

/// Spawns balls and keeps the live set bounded.
///
/// `active` is in creation order and is the only record of which ball
/// bodies are live: a record is moved out before its body is removed, so a
/// body can never be released twice.
pub struct BallLifecycleManager {
    active: VecDeque<BallRecord>,
    cap: usize,
    radius: f32,
    spawn_y: f32,
    half_range: f32,
    material: Material,
    rng: ChaCha8Rng,
    next_id: u64,
    evicted: u64,
}

impl BallLifecycleManager {
    pub fn new(config: &BallConfig, layout: &BoardLayout) -> Self {
        let board = &layout.config;
        // Never drop a ball outside the funnel mouth.
        let mouth = board.funnel_top_half_width - board.ball_radius;
        let half_range = (config.spawn_spread * board.board_width * 0.5)
            .min(mouth)
            .max(0.0);
        Self {
            active: VecDeque::with_capacity(config.cap + 1),
            cap: config.cap,
            radius: board.ball_radius,
            spawn_y: layout.spawn_y(),
            half_range,
            material: config.material,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            next_id: 1,
            evicted: 0,
        }
    }

    fn spawn_position(&mut self) -> Vec3 {
        let x = if self.half_range > 0.0 {
            self.rng.gen_range(-self.half_range..=self.half_range)
        } else {
            0.0
        };
        Vec3::new(x, self.spawn_y, 0.0)
    }

    /// Drop one ball, then evict the oldest while over the cap.
    pub fn spawn<V: Visualization>(
        &mut self,
        physics: &mut PhysicsWorld,
        mapper: &CoordinateMapper,
        vis: &mut V,
    ) -> BallId {
        let local = Transform::from_position(self.spawn_position());
        let body = physics.create_dynamic(
            &mapper.transform_to_absolute(&local),
            ColliderShape::Sphere {
                radius: self.radius,
            },
            self.material,
        );
        let proxy = vis.create_proxy(self.radius);
        vis.update_proxy(proxy, BallPose::from_transform(&local, self.radius));

        let id = BallId(self.next_id);
        self.next_id += 1;
        self.active.push_back(BallRecord { id, body, proxy });

        while self.active.len() > self.cap {
            self.evict_oldest(physics, vis);
        }
        id
    }

    fn evict_oldest<V: Visualization>(
        &mut self,
        physics: &mut PhysicsWorld,
        vis: &mut V,
    ) -> Option<BallId> {
        let record = self.active.pop_front()?;
        physics.remove_body(record.body);
        vis.release_proxy(record.proxy);
        self.evicted += 1;
        log::debug!("evicted ball {:?} ({} active)", record.id, self.active.len());
        Some(record.id)
    }

    /// Push every live ball's current pose to its proxy, in the rig frame.
    pub fn sync_poses<V: Visualization>(
        &self,
        physics: &PhysicsWorld,
        mapper: &CoordinateMapper,
        vis: &mut V,
    ) {
        for record in &self.active {
            if let Some(t) = physics.transform_of(record.body) {
                let local = mapper.transform_to_local(&t);
                vis.update_proxy(record.proxy, BallPose::from_transform(&local, self.radius));
            }
        }
    }

    /// Remove every ball. Returns how many were removed.
    pub fn clear<V: Visualization>(&mut self, physics: &mut PhysicsWorld, vis: &mut V) -> usize {
        let n = self.active.len();
        for record in self.active.drain(..) {
            physics.remove_body(record.body);
            vis.release_proxy(record.proxy);
        }
        n
    }

    /// Current rig-frame position of a live ball.
    pub fn position_of(
        &self,
        id: BallId,
        physics: &PhysicsWorld,
        mapper: &CoordinateMapper,
    ) -> Option<Vec3> {
        let record = self.active.iter().find(|r| r.id == id)?;
        physics
            .transform_of(record.body)
            .map(|t| mapper.to_local(t.position))
    }

    pub fn contains(&self, id: BallId) -> bool {
        self.active.iter().any(|r| r.id == id)
    }

    /// Live balls, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &BallRecord> {
        self.active.iter()
    }

    pub fn oldest(&self) -> Option<&BallRecord> {
        self.active.front()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn total_spawned(&self) -> u64 {
        self.next_id - 1
    }

    pub fn total_evicted(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::config::BoardMaterials;
    use crate::board::config::BoardConfig;
    use crate::board::Board;
    use crate::renderer::proxy::PoseBuffer;

    struct Rig {
        physics: PhysicsWorld,
        mapper: CoordinateMapper,
        board: Board,
        vis: PoseBuffer,
    }

    fn rig(board_config: BoardConfig) -> Rig {
        let mut physics = PhysicsWorld::new(Vec3::new(0.0, -9.81, 0.0));
        let mapper = CoordinateMapper::new(Vec3::new(0.0, 0.0, -2.0));
        let board = Board::build(
            &board_config,
            &BoardMaterials::default(),
            &mut physics,
            &mapper,
        )
        .unwrap();
        Rig {
            physics,
            mapper,
            board,
            vis: PoseBuffer::new(),
        }
    }

    fn manager(r: &Rig, cap: usize) -> BallLifecycleManager {
        let config = BallConfig {
            cap,
            ..Default::default()
        };
        BallLifecycleManager::new(&config, r.board.layout())
    }

    #[test]
    fn spawn_registers_body_and_proxy() {
        let mut r = rig(BoardConfig::default());
        let mut balls = manager(&r, 10);
        let fixed = r.physics.body_count();

        let id = balls.spawn(&mut r.physics, &r.mapper, &mut r.vis);
        assert_eq!(balls.len(), 1);
        assert_eq!(r.physics.body_count(), fixed + 1);
        assert_eq!(r.vis.live_count(), 1);

        let record = *balls.oldest().unwrap();
        assert_eq!(record.id, id);
        r.physics.step(1.0 / 120.0);
        assert!(r.physics.velocity(record.body).y < 0.0);

        let pose = r.vis.get(record.proxy).unwrap();
        let layout = r.board.layout();
        assert!((pose.y - layout.spawn_y()).abs() < 1e-5);
        assert_eq!(pose.z, 0.0);
        assert!(pose.x.abs() <= layout.config.funnel_top_half_width);
    }

    #[test]
    fn spawn_positions_stay_in_range() {
        let mut r = rig(BoardConfig::default());
        let mut balls = manager(&r, 100);
        let cfg = &r.board.layout().config;
        let limit = BallConfig::default().spawn_spread * cfg.board_width * 0.5;
        let spawn_y = r.board.layout().spawn_y();
        let mut xs = Vec::new();
        for _ in 0..50 {
            let id = balls.spawn(&mut r.physics, &r.mapper, &mut r.vis);
            let p = balls.position_of(id, &r.physics, &r.mapper).unwrap();
            assert!(p.x.abs() <= limit + 1e-5);
            assert!((p.y - spawn_y).abs() < 1e-4);
            xs.push(p.x);
        }
        // Randomized, not all stacked on one spot.
        assert!(xs.iter().any(|x| (x - xs[0]).abs() > 1e-3));
    }

    #[test]
    fn cap_evicts_oldest_first() {
        let mut r = rig(BoardConfig::default());
        let mut balls = manager(&r, 3);
        let ids: Vec<BallId> = (0..5)
            .map(|_| balls.spawn(&mut r.physics, &r.mapper, &mut r.vis))
            .collect();

        assert_eq!(balls.len(), 3);
        let live: Vec<BallId> = balls.iter().map(|b| b.id).collect();
        assert_eq!(live, ids[2..].to_vec());
        assert_eq!(balls.total_evicted(), 2);
        assert_eq!(balls.total_spawned(), 5);
        assert_eq!(r.vis.live_count(), 3);
    }

    #[test]
    fn three_hundred_spawns_leave_cap_balls() {
        let mut r = rig(BoardConfig {
            rows: 10,
            ..Default::default()
        });
        let mut balls = manager(&r, 250);
        let fixed = r.physics.body_count();

        let mut ids = Vec::with_capacity(300);
        for _ in 0..300 {
            ids.push(balls.spawn(&mut r.physics, &r.mapper, &mut r.vis));
            assert!(balls.len() <= 250);
        }
        assert_eq!(balls.len(), 250);
        assert_eq!(r.physics.body_count(), fixed + 250);
        assert_eq!(r.vis.live_count(), 250);
        for id in &ids[..50] {
            assert!(!balls.contains(*id));
        }
        for id in &ids[50..] {
            assert!(balls.contains(*id));
        }
    }

    #[test]
    fn clear_removes_everything() {
        let mut r = rig(BoardConfig::default());
        let mut balls = manager(&r, 20);
        let fixed = r.physics.body_count();
        for _ in 0..5 {
            balls.spawn(&mut r.physics, &r.mapper, &mut r.vis);
        }
        assert_eq!(balls.clear(&mut r.physics, &mut r.vis), 5);
        assert!(balls.is_empty());
        assert_eq!(r.physics.body_count(), fixed);
        assert_eq!(r.vis.live_count(), 0);
    }

    #[test]
    fn sync_poses_reports_rig_frame() {
        let mut r = rig(BoardConfig::default());
        let mut balls = manager(&r, 5);
        balls.spawn(&mut r.physics, &r.mapper, &mut r.vis);
        for _ in 0..12 {
            r.physics.step(1.0 / 120.0);
        }
        balls.sync_poses(&r.physics, &r.mapper, &mut r.vis);

        let record = *balls.oldest().unwrap();
        let pose = r.vis.get(record.proxy).unwrap();
        let abs = r.physics.transform_of(record.body).unwrap().position;
        assert!(pose.position().abs_diff_eq(r.mapper.to_local(abs), 1e-6));
        assert!(pose.y < r.board.layout().spawn_y());
    }
}
