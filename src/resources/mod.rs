//! Resource management
//!
//! Render targets and shader materials used by the composer's passes.

mod shader;
mod target;

pub use shader::*;
pub use target::*;
