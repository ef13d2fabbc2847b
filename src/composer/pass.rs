//! Pass definitions for the composer

use crate::backend::traits::*;
use crate::pipeline::{ClearMaskPass, ClearPass, MaskPass, ScenePass, ShaderPass};
use crate::resources::RenderTarget;

/// Context for executing a pass
///
/// Targets are borrowed for one pass invocation only; passes must not keep
/// them beyond the call.
pub struct PassContext<'a, D: RenderDevice + ?Sized> {
    pub device: &'a mut D,
    /// Buffer the pass writes its result into
    pub write_buffer: &'a RenderTarget,
    /// Buffer holding the previous pass's result
    pub read_buffer: &'a RenderTarget,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Whether a stencil mask is active for this pass
    pub mask_active: bool,
}

/// Trait for composer passes
pub trait ComposerPass {
    /// Get the pass name for debugging
    fn name(&self) -> &str;

    /// Record this pass's device calls
    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>);
}

/// Discriminant of [`Pass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    Scene,
    Mask,
    ClearMask,
    Clear,
    Shader,
}

/// A unit of work in the composer's pass list
#[derive(Debug)]
pub enum Pass {
    Scene(ScenePass),
    Mask(MaskPass),
    ClearMask(ClearMaskPass),
    Clear(ClearPass),
    Shader(ShaderPass),
}

impl Pass {
    pub fn kind(&self) -> PassKind {
        match self {
            Pass::Scene(_) => PassKind::Scene,
            Pass::Mask(_) => PassKind::Mask,
            Pass::ClearMask(_) => PassKind::ClearMask,
            Pass::Clear(_) => PassKind::Clear,
            Pass::Shader(_) => PassKind::Shader,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Pass::Scene(pass) => pass.name(),
            Pass::Mask(pass) => pass.name(),
            Pass::ClearMask(pass) => pass.name(),
            Pass::Clear(pass) => pass.name(),
            Pass::Shader(pass) => pass.name(),
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Pass::Scene(pass) => pass.enabled,
            Pass::Mask(pass) => pass.enabled,
            Pass::ClearMask(pass) => pass.enabled,
            Pass::Clear(pass) => pass.enabled,
            Pass::Shader(pass) => pass.enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Pass::Scene(pass) => pass.enabled = enabled,
            Pass::Mask(pass) => pass.enabled = enabled,
            Pass::ClearMask(pass) => pass.enabled = enabled,
            Pass::Clear(pass) => pass.enabled = enabled,
            Pass::Shader(pass) => pass.enabled = enabled,
        }
    }

    pub fn needs_swap(&self) -> bool {
        match self {
            Pass::Scene(pass) => pass.needs_swap,
            Pass::Mask(pass) => pass.needs_swap,
            Pass::ClearMask(pass) => pass.needs_swap,
            Pass::Clear(pass) => pass.needs_swap,
            Pass::Shader(pass) => pass.needs_swap,
        }
    }

    pub fn set_needs_swap(&mut self, needs_swap: bool) {
        match self {
            Pass::Scene(pass) => pass.needs_swap = needs_swap,
            Pass::Mask(pass) => pass.needs_swap = needs_swap,
            Pass::ClearMask(pass) => pass.needs_swap = needs_swap,
            Pass::Clear(pass) => pass.needs_swap = needs_swap,
            Pass::Shader(pass) => pass.needs_swap = needs_swap,
        }
    }

    pub fn clear(&self) -> bool {
        match self {
            Pass::Scene(pass) => pass.clear,
            Pass::Mask(pass) => pass.clear,
            Pass::ClearMask(pass) => pass.clear,
            Pass::Clear(pass) => pass.clear,
            Pass::Shader(pass) => pass.clear,
        }
    }

    pub fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        match self {
            Pass::Scene(pass) => pass.render(ctx),
            Pass::Mask(pass) => pass.render(ctx),
            Pass::ClearMask(pass) => pass.render(ctx),
            Pass::Clear(pass) => pass.render(ctx),
            Pass::Shader(pass) => pass.render(ctx),
        }
    }

    pub fn as_shader(&self) -> Option<&ShaderPass> {
        match self {
            Pass::Shader(pass) => Some(pass),
            _ => None,
        }
    }

    pub fn as_shader_mut(&mut self) -> Option<&mut ShaderPass> {
        match self {
            Pass::Shader(pass) => Some(pass),
            _ => None,
        }
    }
}

impl From<ScenePass> for Pass {
    fn from(pass: ScenePass) -> Self {
        Pass::Scene(pass)
    }
}

impl From<MaskPass> for Pass {
    fn from(pass: MaskPass) -> Self {
        Pass::Mask(pass)
    }
}

impl From<ClearMaskPass> for Pass {
    fn from(pass: ClearMaskPass) -> Self {
        Pass::ClearMask(pass)
    }
}

impl From<ClearPass> for Pass {
    fn from(pass: ClearPass) -> Self {
        Pass::Clear(pass)
    }
}

impl From<ShaderPass> for Pass {
    fn from(pass: ShaderPass) -> Self {
        Pass::Shader(pass)
    }
}
