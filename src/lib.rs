//! Effect Composer - multi-pass post-processing over ping-pong render targets
//!
//! A [`Composer`] owns two off-screen render targets and an ordered list of
//! passes. Each frame it runs every enabled pass, swapping the targets after
//! passes that write their result into the write buffer, and keeps a stencil
//! mask active between a [`MaskPass`] and the next [`ClearMaskPass`].
//!
//! # Features
//! - Scene, mask, clear-mask, clear and full-screen shader passes
//! - Stencil-masked effects that leave unmasked pixels intact across swaps
//! - WGSL shader definitions validated with naga
//! - Device abstraction with a recording dummy device for tests

pub mod backend;
pub mod composer;
pub mod pipeline;
pub mod resources;

pub use backend::{DummyDevice, RenderDevice};
pub use composer::{
    Composer, ComposerError, ComposerPass, ComposerResult, FrameReport, Pass, PassContext,
    PassKind, PassRecord,
};
pub use pipeline::{ClearMaskPass, ClearPass, MaskPass, ScenePass, ShaderPass};
pub use resources::{RenderTarget, ShaderDefinition, ShaderMaterial, UniformValue, Uniforms};

use backend::{FilterMode, RenderTargetDescriptor, TextureFormat};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration for creating a composer
#[derive(Debug, Clone)]
pub struct ComposerConfig {
    /// Label given to the composer's own render targets
    pub label: String,
    /// Color format of the render targets
    pub format: TextureFormat,
    /// Minification filter of the render targets
    pub min_filter: FilterMode,
    /// Magnification filter of the render targets
    pub mag_filter: FilterMode,
    /// Shader used to carry unmasked pixels across a swap.
    /// Without one, masked effects fail at render time.
    pub copy_shader: Option<ShaderDefinition>,
    /// Uniform the copy pass binds its input to
    pub texture_uniform: String,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            label: "Composer Target".to_string(),
            format: TextureFormat::Rgba8Unorm,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            copy_shader: Some(pipeline::copy_shader()),
            texture_uniform: pipeline::DEFAULT_TEXTURE_UNIFORM.to_string(),
        }
    }
}

impl ComposerConfig {
    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filters(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    pub fn with_copy_shader(mut self, shader: ShaderDefinition, texture_uniform: &str) -> Self {
        self.copy_shader = Some(shader);
        self.texture_uniform = texture_uniform.to_string();
        self
    }

    pub fn without_copy_shader(mut self) -> Self {
        self.copy_shader = None;
        self
    }

    /// Descriptor for a composer-owned target of the given size
    pub fn target_descriptor(&self, width: u32, height: u32) -> RenderTargetDescriptor {
        RenderTargetDescriptor::new(width, height)
            .with_label(&self.label)
            .with_format(self.format)
            .with_filters(self.min_filter, self.mag_filter)
            .with_stencil_buffer(false)
    }
}

/// Install an `env_logger` logger filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs the logger.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init();
    });
}
