pub mod mat4;
pub mod precision;
pub mod spherical;
pub mod vec;

pub use mat4::*;
pub use precision::*;
pub use spherical::*;
pub use vec::*;
