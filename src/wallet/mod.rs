pub mod bridge;
pub mod verify;

pub use bridge::*;
pub use verify::*;
