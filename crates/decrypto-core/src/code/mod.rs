//! Code representation and the fixed enumeration order used for tie-breaking.

mod cache;
mod space;

pub use cache::{CodeSpaceCache, CodeSpaceKey};
pub use space::{Code, CodeSpace, enumerate_codes};
