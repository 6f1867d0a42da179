//! Handle-indexed scene data
//!
//! Everything a loaded model owns lives in a [`ResourceStore`]; the rest of the
//! engine only ever holds [`Handle`]s into it.

mod handle;
mod store;
mod types;

pub use handle::*;
pub use store::*;
pub use types::*;
