//! Platform-independent tour session: one viewer's camera, scene, photo
//! slot and navigation engine wired together behind a host-facing API.

pub mod events;
pub mod session;

#[cfg(test)]
mod scenarios;

pub use events::*;
pub use session::*;
