//! Procedural board geometry.
//!
//! Everything here is a pure function of [`BoardConfig`]: the peg lattice, the
//! tapered containment walls on both sides, the bin dividers and the outer
//! frame. Coordinates are in the rig frame, X right, Y up, the board plane at
//! `z = 0` and the ball lane spanning `±chute_depth / 2`.

use glam::{Quat, Vec2, Vec3};
use serde::Serialize;

use crate::api::error::ConfigError;
use crate::api::types::Transform;
use crate::board::config::BoardConfig;
use crate::core::physics::ColliderShape;

/// Segments shorter than this are degenerate.
pub const SEGMENT_EPSILON: f32 = 1e-5;

/// Containment zone a wall segment belongs to, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Funnel,
    Throat,
    Chute,
    Skirt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Peg {
    pub position: Vec3,
    pub radius: f32,
    pub row: u32,
}

/// One straight piece of containment wall, built as a rotated cuboid whose
/// centreline runs from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WallSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub depth: f32,
    pub thickness: f32,
    pub section: Section,
}

impl WallSegment {
    pub fn new(
        start: Vec2,
        end: Vec2,
        depth: f32,
        thickness: f32,
        section: Section,
    ) -> Result<Self, ConfigError> {
        let len = start.distance(end);
        if !len.is_finite() || len <= SEGMENT_EPSILON {
            return Err(ConfigError::DegenerateSegment {
                x0: start.x,
                y0: start.y,
                x1: end.x,
                y1: end.y,
            });
        }
        Ok(Self {
            start,
            end,
            depth,
            thickness,
            section,
        })
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Rotation about Z that lays the cuboid's X axis along the segment.
    pub fn angle(&self) -> f32 {
        let d = self.end - self.start;
        d.y.atan2(d.x)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// The cuboid runs half a thickness past each endpoint so neighbouring
    /// segments overlap at the joint instead of leaving a notch.
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(
            (self.length() + self.thickness) * 0.5,
            self.thickness * 0.5,
            self.depth * 0.5,
        )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position(self.midpoint().extend(0.0))
            .with_rotation(Quat::from_rotation_z(self.angle()))
    }

    /// Centreline x at height `y`, if the segment spans that height.
    /// Horizontal segments never answer.
    pub fn x_at(&self, y: f32) -> Option<f32> {
        let dy = self.end.y - self.start.y;
        if dy.abs() <= SEGMENT_EPSILON {
            return None;
        }
        let (lo, hi) = if dy > 0.0 {
            (self.start.y, self.end.y)
        } else {
            (self.end.y, self.start.y)
        };
        if y < lo - SEGMENT_EPSILON || y > hi + SEGMENT_EPSILON {
            return None;
        }
        let t = (y - self.start.y) / dy;
        Some(self.start.x + (self.end.x - self.start.x) * t)
    }

    /// The four XY corners of the cuboid, including the overlap past each end.
    pub fn corners(&self) -> [Vec2; 4] {
        let h = self.half_extents();
        let dir = Vec2::from_angle(self.angle());
        let along = dir * h.x;
        let across = dir.perp() * h.y;
        let c = self.midpoint();
        [
            c - along - across,
            c + along - across,
            c + along + across,
            c - along + across,
        ]
    }

    /// Half the wall's thickness measured horizontally; grows as the wall leans.
    pub fn horizontal_half_thickness(&self) -> f32 {
        let dy = (self.end.y - self.start.y).abs();
        self.thickness * 0.5 * self.length() / dy.max(SEGMENT_EPSILON)
    }
}

/// A bin divider standing on the floor under one bottom-row peg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub x: f32,
    pub floor_y: f32,
    pub height: f32,
    pub thickness: f32,
    pub depth: f32,
}

impl Bin {
    pub fn top_y(&self) -> f32 {
        self.floor_y + self.height
    }

    pub fn transform(&self) -> Transform {
        Transform::from_position(Vec3::new(self.x, self.floor_y + self.height * 0.5, 0.0))
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.thickness * 0.5, self.height * 0.5, self.depth * 0.5)
    }
}

/// What a fixed body is for; picks its material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "part", content = "section", rename_all = "snake_case")]
pub enum BoardPart {
    Peg,
    Wall(Section),
    BinDivider,
    Floor,
    Backboard,
    FrontPanel,
    FrameSide,
    FrameCap,
}

/// A fixed-body descriptor: where it goes and what collider it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedBody {
    pub part: BoardPart,
    pub transform: Transform,
    pub shape: ColliderShape,
}

/// Lattice half-width at height `y`: 0 at the top row, widening linearly to
/// the bottom row's extreme peg, constant outside the lattice band.
pub fn edge_half_width(cfg: &BoardConfig, y: f32) -> f32 {
    let top = cfg.top_row_y;
    let bottom = cfg.last_row_y();
    if top - bottom <= SEGMENT_EPSILON {
        return 0.0;
    }
    let t = ((top - y) / (top - bottom)).clamp(0.0, 1.0);
    cfg.lattice_half_extent() * t
}

/// Half-width of a wall centreline at height `y` inside the lattice band.
/// The offset is scaled by the chute's lean so the sloped wall keeps
/// `wall_clearance` perpendicular to the outer pegs.
pub fn wall_half_width(cfg: &BoardConfig, y: f32) -> f32 {
    edge_half_width(cfg, y) + cfg.wall_offset()
}

/// Right-side key points top to bottom, each tagged with the section of the
/// segment that ends there.
fn side_profile(cfg: &BoardConfig) -> (Vec2, Vec<(Vec2, Section)>) {
    let half_t = cfg.wall_thickness * 0.5;
    let throat_w = wall_half_width(cfg, cfg.top_row_y);
    let bottom_y = cfg.last_row_y();
    let bottom_w = wall_half_width(cfg, bottom_y);

    let mouth = Vec2::new(cfg.funnel_top_half_width + half_t, cfg.funnel_top_y());
    let mut points = vec![
        (
            Vec2::new(throat_w, cfg.top_row_y + cfg.throat_height),
            Section::Funnel,
        ),
        (Vec2::new(throat_w, cfg.top_row_y), Section::Throat),
    ];
    // A single row has no taper: throat and skirt meet at the row height.
    if cfg.rows > 1 {
        points.push((Vec2::new(bottom_w, bottom_y), Section::Chute));
    }
    points.push((Vec2::new(bottom_w, cfg.floor_y), Section::Skirt));
    (mouth, points)
}

fn synthesize_side(cfg: &BoardConfig, side: Side) -> Result<Vec<WallSegment>, ConfigError> {
    let mirror = match side {
        Side::Left => Vec2::new(-1.0, 1.0),
        Side::Right => Vec2::ONE,
    };
    let (mouth, points) = side_profile(cfg);
    let mut segments = Vec::with_capacity(points.len());
    let mut prev = mouth * mirror;
    for (point, section) in points {
        let next = point * mirror;
        segments.push(WallSegment::new(
            prev,
            next,
            cfg.chute_depth,
            cfg.wall_thickness,
            section,
        )?);
        prev = next;
    }
    Ok(segments)
}

fn peg_lattice(cfg: &BoardConfig) -> Vec<Peg> {
    let total = (cfg.rows * (cfg.rows + 1) / 2) as usize;
    let mut pegs = Vec::with_capacity(total);
    for row in 0..cfg.rows {
        let y = cfg.row_y(row);
        let half = row as f32 * 0.5;
        for col in 0..=row {
            let x = (col as f32 - half) * cfg.column_spacing;
            pegs.push(Peg {
                position: Vec3::new(x, y, 0.0),
                radius: cfg.peg_radius,
                row,
            });
        }
    }
    pegs
}

/// The complete static layout of a board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardLayout {
    pub config: BoardConfig,
    pub pegs: Vec<Peg>,
    pub left: Vec<WallSegment>,
    pub right: Vec<WallSegment>,
    pub bins: Vec<Bin>,
    /// Inner half-width of the outer frame.
    pub frame_half_width: f32,
    /// Underside of the frame's top cap.
    pub cap_y: f32,
}

impl BoardLayout {
    /// Validate the config and derive every static shape from it.
    pub fn generate(cfg: &BoardConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let pegs = peg_lattice(cfg);
        let left = synthesize_side(cfg, Side::Left)?;
        let right = synthesize_side(cfg, Side::Right)?;

        let bin_xs: Vec<f32> = pegs
            .iter()
            .filter(|p| p.row + 1 == cfg.rows)
            .map(|p| p.position.x)
            .collect();
        let bins = bin_xs
            .into_iter()
            .map(|x| Bin {
                x,
                floor_y: cfg.floor_y,
                height: cfg.bin_height,
                thickness: cfg.wall_thickness,
                depth: cfg.chute_depth,
            })
            .collect();

        let widest = left
            .iter()
            .chain(right.iter())
            .flat_map(|s| s.corners())
            .map(|c| c.x.abs())
            .fold(0.0f32, f32::max);
        let frame_half_width = widest + cfg.frame_margin;
        let cap_y = cfg.spawn_y() + cfg.ball_radius + cfg.frame_margin;

        Ok(Self {
            config: cfg.clone(),
            pegs,
            left,
            right,
            bins,
            frame_half_width,
            cap_y,
        })
    }

    pub fn side(&self, side: Side) -> &[WallSegment] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Horizontal gap between the inner faces of the two walls at height `y`.
    /// `None` above the funnel mouth or below the floor.
    pub fn gap_at(&self, y: f32) -> Option<f32> {
        let inner = |segments: &[WallSegment], sign: f32| {
            segments
                .iter()
                .find_map(|s| s.x_at(y).map(|x| x - sign * s.horizontal_half_thickness()))
        };
        let right = inner(&self.right, 1.0)?;
        let left = inner(&self.left, -1.0)?;
        Some(right - left)
    }

    /// Channel index for a ball at `x`: 0 left of the first divider, up to
    /// `bins.len()` right of the last.
    pub fn bin_index(&self, x: f32) -> usize {
        self.bins.iter().filter(|b| b.x < x).count()
    }

    /// Number of collection channels.
    pub fn channel_count(&self) -> usize {
        self.bins.len() + 1
    }

    pub fn spawn_y(&self) -> f32 {
        self.config.spawn_y()
    }

    /// Every fixed body of the board, pegs first.
    pub fn fixed_bodies(&self) -> Vec<FixedBody> {
        let cfg = &self.config;
        let mut out = Vec::with_capacity(self.pegs.len() + self.bins.len() + 16);

        for peg in &self.pegs {
            out.push(FixedBody {
                part: BoardPart::Peg,
                transform: Transform::from_position(peg.position),
                shape: ColliderShape::Sphere { radius: peg.radius },
            });
        }
        for seg in self.left.iter().chain(self.right.iter()) {
            out.push(FixedBody {
                part: BoardPart::Wall(seg.section),
                transform: seg.transform(),
                shape: ColliderShape::Cuboid {
                    half_extents: seg.half_extents(),
                },
            });
        }
        for bin in &self.bins {
            out.push(FixedBody {
                part: BoardPart::BinDivider,
                transform: bin.transform(),
                shape: ColliderShape::Cuboid {
                    half_extents: bin.half_extents(),
                },
            });
        }

        let t = cfg.wall_thickness;
        let half_depth = cfg.chute_depth * 0.5;
        let outer_half = self.frame_half_width + t;
        let top = self.cap_y + t;
        let mid_y = (cfg.floor_y + top) * 0.5;
        let half_h = (top - cfg.floor_y) * 0.5;

        let cuboid = |part, position: Vec3, half_extents: Vec3| FixedBody {
            part,
            transform: Transform::from_position(position),
            shape: ColliderShape::Cuboid { half_extents },
        };

        out.push(cuboid(
            BoardPart::Floor,
            Vec3::new(0.0, cfg.floor_y - t * 0.5, 0.0),
            Vec3::new(outer_half, t * 0.5, half_depth + t),
        ));
        for z in [-1.0, 1.0] {
            let part = if z < 0.0 {
                BoardPart::Backboard
            } else {
                BoardPart::FrontPanel
            };
            out.push(cuboid(
                part,
                Vec3::new(0.0, mid_y, z * (half_depth + t * 0.5)),
                Vec3::new(outer_half, half_h, t * 0.5),
            ));
        }
        for x in [-1.0, 1.0] {
            out.push(cuboid(
                BoardPart::FrameSide,
                Vec3::new(x * (self.frame_half_width + t * 0.5), mid_y, 0.0),
                Vec3::new(t * 0.5, half_h, half_depth),
            ));
        }
        out.push(cuboid(
            BoardPart::FrameCap,
            Vec3::new(0.0, self.cap_y + t * 0.5, 0.0),
            Vec3::new(outer_half, t * 0.5, half_depth),
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(cfg: BoardConfig) -> BoardLayout {
        BoardLayout::generate(&cfg).expect("valid config")
    }

    #[test]
    fn peg_count_matches_triangle_number() {
        for rows in [1, 2, 5, 10, 14] {
            let cfg = BoardConfig {
                rows,
                column_spacing: 0.2,
                board_width: 4.0,
                ..Default::default()
            };
            let l = layout(cfg);
            assert_eq!(l.pegs.len() as u32, rows * (rows + 1) / 2);
            for r in 0..rows {
                assert_eq!(l.pegs.iter().filter(|p| p.row == r).count() as u32, r + 1);
            }
        }
    }

    #[test]
    fn rows_are_distinct_and_symmetric() {
        let l = layout(BoardConfig::default());
        for r in 0..l.config.rows {
            let mut xs: Vec<f32> = l
                .pegs
                .iter()
                .filter(|p| p.row == r)
                .map(|p| p.position.x)
                .collect();
            xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for pair in xs.windows(2) {
                assert!(pair[1] - pair[0] > 1e-4, "row {} has duplicate x", r);
            }
            let n = xs.len();
            for i in 0..n {
                assert!((xs[i] + xs[n - 1 - i]).abs() < 1e-5, "row {} not symmetric", r);
            }
        }
    }

    #[test]
    fn adjacent_segments_share_endpoints() {
        let l = layout(BoardConfig::default());
        for side in [Side::Left, Side::Right] {
            let segs = l.side(side);
            assert_eq!(segs.len(), 4);
            for pair in segs.windows(2) {
                assert!(pair[0].end.distance(pair[1].start) < 1e-6);
            }
        }
    }

    #[test]
    fn sides_mirror_each_other() {
        let l = layout(BoardConfig::default());
        for (a, b) in l.left.iter().zip(l.right.iter()) {
            assert_eq!(a.start, b.start * Vec2::new(-1.0, 1.0));
            assert_eq!(a.end, b.end * Vec2::new(-1.0, 1.0));
            assert_eq!(a.section, b.section);
        }
    }

    #[test]
    fn containment_gap_is_bounded() {
        let cfg = BoardConfig::default();
        let l = layout(cfg.clone());
        let lo = cfg.bottom_row_y;
        let hi = cfg.top_row_y + cfg.throat_height;
        for i in 0..=200 {
            let y = lo + (hi - lo) * i as f32 / 200.0;
            let gap = l.gap_at(y).expect("walls span the lattice band");
            assert!(gap >= 2.0 * cfg.ball_radius, "gap {} too small at y={}", gap, y);
            assert!(gap <= cfg.board_width, "gap {} too wide at y={}", gap, y);
        }
    }

    /// Distance from `p` to the segment's centreline, extended past both
    /// ends by the joint overlap.
    fn centreline_distance(s: &WallSegment, p: Vec2) -> f32 {
        let dir = (s.end - s.start).normalize();
        let a = s.start - dir * s.thickness * 0.5;
        let b = s.end + dir * s.thickness * 0.5;
        let t = ((p - a).dot(b - a) / (b - a).length_squared()).clamp(0.0, 1.0);
        p.distance(a + (b - a) * t)
    }

    #[test]
    fn walls_keep_clearance_from_every_peg() {
        for rows in [1, 4, 10, 14] {
            let cfg = BoardConfig {
                rows,
                column_spacing: 0.2,
                board_width: 4.0,
                ..Default::default()
            };
            let l = layout(cfg.clone());
            for seg in l.left.iter().chain(l.right.iter()) {
                for peg in &l.pegs {
                    let free = centreline_distance(seg, peg.position.truncate())
                        - seg.thickness * 0.5
                        - peg.radius;
                    assert!(
                        free >= 2.0 * cfg.ball_radius - 1e-4,
                        "rows {}: {:?} leaves {} beside peg {:?}",
                        rows,
                        seg.section,
                        free,
                        peg.position
                    );
                }
            }
        }
    }

    #[test]
    fn chute_runs_wall_clearance_from_outer_pegs() {
        let cfg = BoardConfig::default();
        let l = layout(cfg.clone());
        let chute = l.right.iter().find(|s| s.section == Section::Chute).unwrap();
        for row in 0..cfg.rows {
            let outer = Vec2::new(
                row as f32 * cfg.column_spacing * 0.5,
                cfg.row_y(row),
            );
            // Perpendicular distance to the chute's line: it runs parallel
            // to the lattice outline.
            let dir = (chute.end - chute.start).normalize();
            let to_face = (outer - chute.start).perp_dot(dir).abs() - cfg.wall_thickness * 0.5;
            assert!(
                (to_face - cfg.wall_clearance).abs() < 1e-4,
                "row {} face at {}",
                row,
                to_face
            );
        }
        // The perpendicular channel beside an outer peg fits a ball.
        assert!(cfg.wall_clearance - cfg.peg_radius >= 2.0 * cfg.ball_radius);
    }

    #[test]
    fn corners_span_the_overlap() {
        let s = WallSegment::new(
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
            0.1,
            0.06,
            Section::Skirt,
        )
        .unwrap();
        let c = s.corners();
        let (min_y, max_y) = c
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));
        assert!((min_y + 0.03).abs() < 1e-5);
        assert!((max_y - 1.03).abs() < 1e-5);
        for p in c {
            assert!((p.x.abs() - 0.03).abs() < 1e-5);
        }
    }

    #[test]
    fn single_row_has_no_degenerate_segments() {
        let cfg = BoardConfig {
            rows: 1,
            ..Default::default()
        };
        let l = layout(cfg.clone());
        assert_eq!(l.pegs.len(), 1);
        assert_eq!(l.bins.len(), 1);
        for side in [Side::Left, Side::Right] {
            let segs = l.side(side);
            assert_eq!(segs.len(), 3);
            for s in segs {
                assert!(s.length() > SEGMENT_EPSILON);
                assert!(!s.start.is_nan() && !s.end.is_nan());
                assert!(!s.half_extents().is_nan());
            }
            // Throat and skirt meet at the single row height.
            assert_eq!(segs[1].end.y, cfg.top_row_y);
            assert_eq!(segs[2].start.y, cfg.top_row_y);
        }
        for body in l.fixed_bodies() {
            assert!(!body.transform.position.is_nan());
            assert!(!body.transform.rotation.is_nan());
        }
    }

    #[test]
    fn degenerate_segment_is_rejected() {
        let p = Vec2::new(0.5, 0.5);
        let err = WallSegment::new(p, p, 0.1, 0.04, Section::Chute).unwrap_err();
        assert!(matches!(err, ConfigError::DegenerateSegment { .. }));
    }

    #[test]
    fn bins_sit_under_bottom_row() {
        let cfg = BoardConfig::default();
        let l = layout(cfg.clone());
        let bottom: Vec<f32> = l
            .pegs
            .iter()
            .filter(|p| p.row == cfg.rows - 1)
            .map(|p| p.position.x)
            .collect();
        assert_eq!(l.bins.len(), bottom.len());
        for (bin, x) in l.bins.iter().zip(bottom) {
            assert_eq!(bin.x, x);
            assert!(bin.top_y() < cfg.bottom_row_y - cfg.peg_radius);
        }
        assert_eq!(l.channel_count(), cfg.rows as usize + 1);
    }

    #[test]
    fn bin_index_counts_dividers_to_the_left() {
        let l = layout(BoardConfig::default());
        assert_eq!(l.bin_index(-10.0), 0);
        assert_eq!(l.bin_index(10.0), l.bins.len());
        let mid = (l.bins[2].x + l.bins[3].x) * 0.5;
        assert_eq!(l.bin_index(mid), 3);
    }

    #[test]
    fn frame_encloses_everything() {
        let l = layout(BoardConfig::default());
        let bodies = l.fixed_bodies();
        for body in bodies.iter().filter(|b| {
            !matches!(
                b.part,
                BoardPart::Floor
                    | BoardPart::Backboard
                    | BoardPart::FrontPanel
                    | BoardPart::FrameSide
                    | BoardPart::FrameCap
            )
        }) {
            let reach = match body.shape {
                ColliderShape::Sphere { radius } => radius,
                ColliderShape::Cuboid { half_extents: h } => {
                    let r = body.transform.rotation;
                    (r * Vec3::X * h.x).x.abs()
                        + (r * Vec3::Y * h.y).x.abs()
                        + (r * Vec3::Z * h.z).x.abs()
                }
            };
            assert!(
                body.transform.position.x.abs() + reach
                    <= l.frame_half_width - l.config.frame_margin + 1e-5,
                "{:?} sticks out of the frame",
                body.part
            );
        }
        assert!(l.cap_y > l.spawn_y());
        assert_eq!(
            bodies.iter().filter(|b| b.part == BoardPart::FrameSide).count(),
            2
        );
    }

    #[test]
    fn fixed_bodies_cover_every_piece() {
        let l = layout(BoardConfig::default());
        let bodies = l.fixed_bodies();
        // pegs + 8 wall segments + bins + floor, backboard, front, 2 sides, cap
        assert_eq!(bodies.len(), l.pegs.len() + 8 + l.bins.len() + 6);
    }

    #[test]
    fn layout_serializes_to_json() {
        let l = layout(BoardConfig::default());
        let json = serde_json::to_string(&l).unwrap();
        assert!(json.contains("\"pegs\""));
        assert!(json.contains("\"funnel\""));
    }
}
