//! Asset loading bookkeeping: a shared two-tier cache and the single photo
//! slot of a mounted viewer.

pub mod cache;
pub mod error;
pub mod slot;

pub use cache::*;
pub use error::*;
pub use slot::*;
