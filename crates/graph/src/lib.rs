//! Read-only lookups over the tour dataset.

pub mod graph;
pub mod integrity;
pub mod path;

pub use graph::*;
pub use integrity::*;
