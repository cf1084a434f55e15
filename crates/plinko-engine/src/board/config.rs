use serde::{Deserialize, Serialize};

use crate::api::error::ConfigError;

/// Dimensional constants for the board, in metres, Y up, in the rig frame.
/// Every piece of static geometry is a pure function of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of peg rows. Row `r` holds `r + 1` pegs.
    pub rows: u32,
    /// Horizontal distance between neighbouring pegs of a row.
    pub column_spacing: f32,
    /// Height of the first (single-peg) row.
    pub top_row_y: f32,
    /// Height of the last row.
    pub bottom_row_y: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
    pub floor_y: f32,
    /// Upper bound on any containment gap, and the nominal board width used
    /// to size the spawn spread.
    pub board_width: f32,
    /// Depth of the ball lane between backboard and front panel.
    pub chute_depth: f32,
    /// Must exceed `ball_radius`: half of it is the wall's half-thickness and
    /// half is the overlap past each joint.
    pub wall_thickness: f32,
    /// Distance from the lattice outline (peg centres) to a wall's inner face,
    /// measured along the wall's normal.
    pub wall_clearance: f32,
    /// Vertical section between the funnel and the first row.
    pub throat_height: f32,
    /// Tapering section above the throat.
    pub funnel_height: f32,
    /// Inner half-width of the funnel mouth.
    pub funnel_top_half_width: f32,
    /// Height of the bin dividers above the floor.
    pub bin_height: f32,
    /// Gap between the outermost geometry and the outer frame.
    pub frame_margin: f32,
    /// Drop height of new balls above the funnel mouth.
    pub spawn_height: f32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 10,
            column_spacing: 0.26,
            top_row_y: 2.6,
            bottom_row_y: 0.9,
            peg_radius: 0.04,
            ball_radius: 0.05,
            floor_y: 0.0,
            board_width: 3.6,
            chute_depth: 0.12,
            wall_thickness: 0.06,
            wall_clearance: 0.16,
            throat_height: 0.3,
            funnel_height: 0.6,
            funnel_top_half_width: 1.0,
            bin_height: 0.5,
            frame_margin: 0.1,
            spawn_height: 0.25,
        }
    }
}

pub(crate) fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field,
            value: f64::from(value),
        })
    }
}

pub(crate) fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: f64::from(value),
        })
    }
}

impl BoardConfig {
    /// Vertical position of row `r`. A single row sits at `top_row_y`.
    pub fn row_y(&self, row: u32) -> f32 {
        if self.rows <= 1 {
            return self.top_row_y;
        }
        let t = row as f32 / (self.rows - 1) as f32;
        self.top_row_y + (self.bottom_row_y - self.top_row_y) * t
    }

    /// Height of the last row; equals `top_row_y` for a single row.
    pub fn last_row_y(&self) -> f32 {
        self.row_y(self.rows.saturating_sub(1))
    }

    /// Extreme |x| of the bottom row's peg centres.
    pub fn lattice_half_extent(&self) -> f32 {
        self.rows.saturating_sub(1) as f32 * self.column_spacing * 0.5
    }

    /// 1 / cos of the chute's lean from vertical. The chute runs parallel to
    /// the lattice outline, from the top peg to the bottom row's outer peg.
    pub fn chute_secant(&self) -> f32 {
        let rise = self.top_row_y - self.last_row_y();
        if self.rows <= 1 || rise <= 0.0 {
            return 1.0;
        }
        (1.0 + (self.lattice_half_extent() / rise).powi(2)).sqrt()
    }

    /// Horizontal distance from the lattice outline to a wall centreline, so
    /// that the perpendicular distance to the chute's inner face is
    /// `wall_clearance`.
    pub fn wall_offset(&self) -> f32 {
        (self.wall_clearance + self.wall_thickness * 0.5) * self.chute_secant()
    }

    /// Height of the funnel mouth.
    pub fn funnel_top_y(&self) -> f32 {
        self.top_row_y + self.throat_height + self.funnel_height
    }

    /// Height new balls are dropped from.
    pub fn spawn_y(&self) -> f32 {
        self.funnel_top_y() + self.spawn_height
    }

    /// Reject any config that would produce degenerate colliders or a board
    /// a ball can escape from or jam in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 {
            return Err(ConfigError::OutOfRange {
                field: "rows",
                value: 0.0,
            });
        }
        positive("column_spacing", self.column_spacing)?;
        positive("peg_radius", self.peg_radius)?;
        positive("ball_radius", self.ball_radius)?;
        positive("board_width", self.board_width)?;
        positive("chute_depth", self.chute_depth)?;
        positive("wall_thickness", self.wall_thickness)?;
        positive("wall_clearance", self.wall_clearance)?;
        positive("throat_height", self.throat_height)?;
        positive("funnel_height", self.funnel_height)?;
        positive("funnel_top_half_width", self.funnel_top_half_width)?;
        positive("bin_height", self.bin_height)?;
        positive("frame_margin", self.frame_margin)?;
        positive("spawn_height", self.spawn_height)?;
        finite("top_row_y", self.top_row_y)?;
        finite("bottom_row_y", self.bottom_row_y)?;
        finite("floor_y", self.floor_y)?;

        let ball_d = 2.0 * self.ball_radius;
        if self.rows > 1 && self.top_row_y <= self.bottom_row_y {
            return Err(ConfigError::Constraint(
                "top_row_y must be above bottom_row_y",
            ));
        }
        if self.rows > 1 && self.column_spacing - 2.0 * self.peg_radius <= ball_d {
            return Err(ConfigError::Constraint(
                "pegs are too close for a ball to pass between them",
            ));
        }
        // wall_clearance is perpendicular to every wall section, so this is
        // the narrowest channel beside the outer pegs.
        if self.wall_clearance - self.peg_radius < ball_d {
            return Err(ConfigError::Constraint(
                "wall_clearance leaves no room for a ball beside the outer pegs",
            ));
        }
        if self.wall_thickness <= self.ball_radius {
            return Err(ConfigError::Constraint(
                "wall_thickness must exceed ball_radius so wall joints stay closed",
            ));
        }
        if self.chute_depth <= ball_d {
            return Err(ConfigError::Constraint(
                "chute_depth must be wider than a ball",
            ));
        }
        let half_t = self.wall_thickness * 0.5;
        if self.funnel_top_half_width <= self.wall_offset() - half_t {
            return Err(ConfigError::Constraint(
                "funnel mouth must be wider than the throat",
            ));
        }
        let bin_top = self.floor_y + self.bin_height;
        if bin_top >= self.last_row_y() - self.peg_radius - ball_d {
            return Err(ConfigError::Constraint(
                "bin dividers must end a ball's width below the last peg row",
            ));
        }
        // Inner face of the vertical skirt is the widest point below the funnel.
        let widest = 2.0
            * (self.lattice_half_extent() + self.wall_offset() - half_t)
                .max(self.funnel_top_half_width);
        if widest > self.board_width {
            return Err(ConfigError::Constraint(
                "containment is wider than board_width",
            ));
        }
        Ok(())
    }
}
