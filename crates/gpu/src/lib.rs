//! Renderer-side math and bookkeeping that does not touch a GPU device.

pub mod camera;
pub mod ledger;
pub mod plan;
pub mod renderer;
pub mod sphere;
pub mod viewport;

pub use camera::*;
pub use ledger::*;
pub use plan::*;
pub use renderer::*;
pub use sphere::*;
pub use viewport::*;
