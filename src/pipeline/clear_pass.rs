//! Clear pass

use crate::backend::traits::*;
use crate::composer::{ComposerPass, PassContext};

/// Clears the read buffer's color, depth and stencil without drawing
#[derive(Debug, Clone)]
pub struct ClearPass {
    pub enabled: bool,
    pub clear: bool,
    pub needs_swap: bool,
}

impl ClearPass {
    pub fn new() -> Self {
        Self {
            enabled: true,
            clear: true,
            needs_swap: false,
        }
    }
}

impl Default for ClearPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerPass for ClearPass {
    fn name(&self) -> &str {
        "Clear"
    }

    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        ctx.device.set_render_target(Some(ctx.read_buffer));
        ctx.device.clear();
    }
}
