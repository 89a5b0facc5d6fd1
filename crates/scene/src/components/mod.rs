pub mod drawable;
pub mod interaction;
pub mod shape;
pub mod transform;
pub mod visibility;

pub use drawable::*;
pub use interaction::*;
pub use shape::*;
pub use transform::*;
pub use visibility::*;
