//! Scene graph and marker logic for the panorama viewer.
//!
//! Everything here is pure: it produces entities, pick results and intents
//! that a front end turns into GPU draws and DOM updates.

pub mod arrows;
pub mod components;
pub mod entity;
pub mod interaction;
pub mod markers;
pub mod picking;
pub mod prefabs;
pub mod projector;
pub mod tracker;
pub mod world;

pub use entity::EntityId;
pub use interaction::*;
pub use markers::*;
pub use projector::*;
pub use tracker::*;
pub use world::*;
