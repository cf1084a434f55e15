pub mod coords;
pub mod physics;
pub mod time;
