pub mod index;
pub mod rank;
pub mod tokens;

pub use index::*;
pub use rank::*;
pub use tokens::*;
