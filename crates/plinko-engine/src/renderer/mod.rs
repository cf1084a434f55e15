pub mod proxy;

pub use proxy::{PoseBuffer, Visualization};
