//! Stencil mask passes

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::composer::{ComposerPass, PassContext};

/// Stencil value that marks the masked region
pub const MASK_REFERENCE: u32 = 1;

/// Writes a stencil mask from a scene's geometry without touching color or depth.
///
/// After this pass, draws only land where the stencil equals
/// [`MASK_REFERENCE`] until a [`ClearMaskPass`] runs.
#[derive(Debug, Clone)]
pub struct MaskPass {
    pub scene: SceneHandle,
    pub camera: CameraHandle,
    /// Mask everything except the scene's geometry
    pub inverse: bool,
    pub enabled: bool,
    pub clear: bool,
    pub needs_swap: bool,
}

impl MaskPass {
    pub fn new(scene: SceneHandle, camera: CameraHandle) -> Self {
        Self {
            scene,
            camera,
            inverse: false,
            enabled: true,
            clear: true,
            needs_swap: false,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverse = true;
        self
    }

    /// (write value, clear value) for the stencil buffer
    fn stencil_values(&self) -> (u32, u32) {
        if self.inverse {
            (0, 1)
        } else {
            (1, 0)
        }
    }
}

impl ComposerPass for MaskPass {
    fn name(&self) -> &str {
        "Mask"
    }

    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        let device = &mut *ctx.device;

        device.set_color_mask(false);
        device.set_depth_mask(false);

        let (write_value, clear_value) = self.stencil_values();
        device.set_stencil_test(true);
        device.set_stencil_op(StencilOps::replace());
        device.set_stencil_func(StencilFunc::always(write_value));
        device.set_clear_stencil(clear_value);

        // Whichever buffer the next pass touches must carry the mask.
        device.render(self.scene, self.camera, Some(ctx.read_buffer), self.clear);
        device.render(self.scene, self.camera, Some(ctx.write_buffer), self.clear);

        device.set_color_mask(true);
        device.set_depth_mask(true);

        device.set_stencil_func(StencilFunc::equal(MASK_REFERENCE));
        device.set_stencil_op(StencilOps::keep());
    }
}

/// Ends a masked region by disabling the stencil test
#[derive(Debug, Clone)]
pub struct ClearMaskPass {
    pub enabled: bool,
    pub clear: bool,
    pub needs_swap: bool,
}

impl ClearMaskPass {
    pub fn new() -> Self {
        Self {
            enabled: true,
            clear: false,
            needs_swap: false,
        }
    }
}

impl Default for ClearMaskPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposerPass for ClearMaskPass {
    fn name(&self) -> &str {
        "Clear Mask"
    }

    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        ctx.device.set_stencil_test(false);
    }
}
