//! Core device abstraction traits
//!
//! The composer never talks to a GPU API directly. Everything it needs from the
//! host renderer goes through [`RenderDevice`].

use crate::backend::types::*;
use crate::resources::{RenderTarget, ShaderMaterial};
use glam::Vec3;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create render target: {0}")]
    TargetCreationFailed(String),
    #[error("Invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },
    #[error("Unknown render target {0:?}")]
    UnknownTarget(TextureHandle),
    #[error("Device lost")]
    DeviceLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU texture backing a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Handle to a host scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneHandle(pub u64);

/// Handle to a host camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

/// Handle to a host material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Graphics device consumed by the composer and its passes.
///
/// All calls are synchronous from the caller's point of view. A `None` target
/// always means the device's final output (the screen).
pub trait RenderDevice {
    /// Current output size in pixels
    fn size(&self) -> (u32, u32);

    fn clear_color(&self) -> Vec3;

    fn clear_alpha(&self) -> f32;

    fn set_clear_color(&mut self, color: Vec3, alpha: f32);

    /// Render a scene from a camera, optionally clearing the target first
    fn render(
        &mut self,
        scene: SceneHandle,
        camera: CameraHandle,
        target: Option<&RenderTarget>,
        clear: bool,
    );

    /// Set or clear the material that replaces every material in `scene`
    fn set_override_material(&mut self, scene: SceneHandle, material: Option<MaterialHandle>);

    /// Draw a full-viewport quad (orthographic camera, 2x2 plane) with `material`
    fn draw_fullscreen(
        &mut self,
        material: &ShaderMaterial,
        target: Option<&RenderTarget>,
        clear: bool,
    );

    fn set_render_target(&mut self, target: Option<&RenderTarget>);

    /// Clear color, depth and stencil of the current render target
    fn clear(&mut self);

    // Resource management

    fn create_render_target(&mut self, desc: &RenderTargetDescriptor)
        -> BackendResult<TextureHandle>;

    fn resize_render_target(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()>;

    fn destroy_render_target(&mut self, texture: TextureHandle);

    // Low-level write and stencil state

    fn set_color_mask(&mut self, enabled: bool);

    fn set_depth_mask(&mut self, enabled: bool);

    fn set_stencil_test(&mut self, enabled: bool);

    fn set_stencil_op(&mut self, ops: StencilOps);

    fn set_stencil_func(&mut self, func: StencilFunc);

    fn set_clear_stencil(&mut self, value: u32);
}
