use thiserror::Error;

/// Fatal configuration problems. Anything that would produce an invalid
/// collider or an unescapable/leaky board is rejected before the solver
/// sees it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`{field}` must be positive and finite (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("`{field}` is out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("{0}")]
    Constraint(&'static str),

    #[error("degenerate wall segment from ({x0}, {y0}) to ({x1}, {y1})")]
    DegenerateSegment { x0: f32, y0: f32, x1: f32, y1: f32 },
}
