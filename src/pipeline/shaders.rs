//! Built-in shader definitions

use crate::resources::{ShaderDefinition, UniformValue};

use super::DEFAULT_TEXTURE_UNIFORM;

/// Common fullscreen quad vertex shader
pub const FULLSCREEN_VERTEX_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;

    // Generate fullscreen triangle
    let x = f32((vertex_index << 1u) & 2u);
    let y = f32(vertex_index & 2u);

    output.position = vec4<f32>(x * 2.0 - 1.0, y * 2.0 - 1.0, 0.0, 1.0);
    output.uv = vec2<f32>(x, 1.0 - y);

    return output;
}
"#;

pub const COPY_FRAGMENT_SHADER: &str = r#"
struct CopyParams {
    opacity: f32,
}

@group(0) @binding(0) var tDiffuse: texture_2d<f32>;
@group(0) @binding(1) var tDiffuse_sampler: sampler;
@group(0) @binding(2) var<uniform> params: CopyParams;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    let texel = textureSample(tDiffuse, tDiffuse_sampler, uv);
    return params.opacity * texel;
}
"#;

/// Identity copy of the input texture scaled by `opacity`
pub fn copy_shader() -> ShaderDefinition {
    ShaderDefinition::new("copy")
        .with_uniform(DEFAULT_TEXTURE_UNIFORM, UniformValue::Texture(None))
        .with_uniform("opacity", UniformValue::Float(1.0))
        .with_vertex_shader(FULLSCREEN_VERTEX_SHADER)
        .with_fragment_shader(COPY_FRAGMENT_SHADER)
}

/// Scanline effect whose sources come from the host's asset pipeline
pub fn scanline_shader(vertex_shader: &str, fragment_shader: &str) -> ShaderDefinition {
    ShaderDefinition::new("scanline")
        .with_uniform(DEFAULT_TEXTURE_UNIFORM, UniformValue::Texture(None))
        .with_vertex_shader(vertex_shader)
        .with_fragment_shader(fragment_shader)
}
