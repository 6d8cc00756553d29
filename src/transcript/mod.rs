pub mod dates;
pub mod speakers;

pub use dates::*;
pub use speakers::*;
