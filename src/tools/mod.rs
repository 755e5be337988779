pub mod rebuild;
pub mod search;

pub use rebuild::*;
pub use search::*;
