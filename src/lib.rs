pub mod consent;
pub mod page;
pub mod storage;

pub use consent::*;
