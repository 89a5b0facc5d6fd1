//! Current-node state machine: direct jumps, edge following behind a
//! confirmation gate, and timed autoplay of a path.

pub mod confirm;
pub mod engine;
pub mod error;
pub mod hop;
pub mod playback;

pub use confirm::*;
pub use engine::*;
pub use error::*;
pub use hop::*;
pub use playback::*;
