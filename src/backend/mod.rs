//! Device abstraction layer
//!
//! Provides the capability trait every host renderer implements, plus a
//! recording [`DummyDevice`](dummy::DummyDevice) that needs no GPU.

pub mod dummy;
pub mod traits;
pub mod types;

pub use dummy::*;
pub use traits::*;
pub use types::*;
