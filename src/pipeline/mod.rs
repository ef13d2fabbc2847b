//! Post-processing passes
//!
//! The five pass variants the composer runs:
//! 1. [`ScenePass`] - renders a scene into the read buffer
//! 2. [`MaskPass`] / [`ClearMaskPass`] - open and close a stencil-masked region
//! 3. [`ClearPass`] - clears the read buffer
//! 4. [`ShaderPass`] - full-screen effect from the read buffer into the write buffer

mod clear_pass;
mod mask_pass;
mod scene_pass;
mod shader_pass;
mod shaders;

pub use clear_pass::ClearPass;
pub use mask_pass::{ClearMaskPass, MaskPass, MASK_REFERENCE};
pub use scene_pass::ScenePass;
pub use shader_pass::{ShaderPass, DEFAULT_TEXTURE_UNIFORM};
pub use shaders::{copy_shader, scanline_shader, COPY_FRAGMENT_SHADER, FULLSCREEN_VERTEX_SHADER};
