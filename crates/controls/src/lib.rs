//! Pointer, touch and wheel handling for the panorama camera.

pub mod camera;
pub mod gesture;

pub use camera::*;
pub use gesture::*;
