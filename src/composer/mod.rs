//! Effect composer
//!
//! Owns the ping-pong render targets and runs the pass list once per frame.

#[allow(clippy::module_inception)]
mod composer;
mod pass;

pub use composer::{Composer, ComposerError, ComposerResult, FrameReport, PassRecord};
pub use pass::{ComposerPass, Pass, PassContext, PassKind};
