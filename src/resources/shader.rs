//! Shader definitions, uniforms and materials for full-screen passes

use crate::backend::traits::TextureHandle;
use glam::{Mat4, Vec2, Vec3, Vec4};
use std::collections::BTreeMap;
use thiserror::Error;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// Shader error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    #[error("Failed to parse {stage:?} shader: {message}")]
    Parse { stage: ShaderStage, message: String },
    #[error("{stage:?} shader failed validation: {message}")]
    Validation { stage: ShaderStage, message: String },
    #[error("{stage:?} shader has no {stage:?} entry point")]
    MissingEntryPoint { stage: ShaderStage },
}

/// Type tag of a uniform value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Color,
    Mat4,
    Texture,
}

impl UniformKind {
    /// Short type code used in shader definitions ("f", "t", ...)
    pub fn code(&self) -> &'static str {
        match self {
            UniformKind::Float => "f",
            UniformKind::Int => "i",
            UniformKind::Vec2 => "v2",
            UniformKind::Vec3 => "v3",
            UniformKind::Vec4 => "v4",
            UniformKind::Color => "c",
            UniformKind::Mat4 => "m4",
            UniformKind::Texture => "t",
        }
    }
}

/// A single uniform value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Color(Vec3),
    Mat4(Mat4),
    /// Sampled texture; `None` until something is bound
    Texture(Option<TextureHandle>),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Color(_) => UniformKind::Color,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            UniformValue::Texture(_) => UniformKind::Texture,
        }
    }

    /// Raw bytes for upload. Textures are bound, not uploaded, so they pack to nothing.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Int(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec2(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec3(v) | UniformValue::Color(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Vec4(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Mat4(v) => bytemuck::bytes_of(v).to_vec(),
            UniformValue::Texture(_) => Vec::new(),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_texture(&self) -> Option<TextureHandle> {
        match self {
            UniformValue::Texture(texture) => *texture,
            _ => None,
        }
    }
}

/// Named uniform values, ordered by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms(BTreeMap<String, UniformValue>);

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: UniformValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: UniformValue) -> Option<UniformValue> {
        self.0.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut UniformValue> {
        self.0.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Pack all non-texture uniforms in name order
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.values().flat_map(|value| value.to_bytes()).collect()
    }
}

/// Shareable description of a full-screen effect: uniforms plus WGSL sources.
///
/// Passes never mutate a definition; each pass clones the uniforms it needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderDefinition {
    pub name: String,
    pub uniforms: Uniforms,
    pub defines: BTreeMap<String, String>,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl ShaderDefinition {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.uniforms.insert(name, value);
        self
    }

    pub fn with_define(mut self, name: &str, value: &str) -> Self {
        self.defines.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_vertex_shader(mut self, source: &str) -> Self {
        self.vertex_shader = source.to_string();
        self
    }

    pub fn with_fragment_shader(mut self, source: &str) -> Self {
        self.fragment_shader = source.to_string();
        self
    }

    /// Parse and validate both stages as WGSL
    pub fn validate(&self) -> Result<(), ShaderError> {
        validate_stage(ShaderStage::Vertex, &self.vertex_shader)?;
        validate_stage(ShaderStage::Fragment, &self.fragment_shader)
    }
}

fn validate_stage(stage: ShaderStage, source: &str) -> Result<(), ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| ShaderError::Parse {
        stage,
        message: err.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| ShaderError::Validation {
            stage,
            message: err.to_string(),
        })?;

    if !module
        .entry_points
        .iter()
        .any(|entry| entry.stage == stage.naga_stage())
    {
        return Err(ShaderError::MissingEntryPoint { stage });
    }

    Ok(())
}

/// Material drawn by a full-screen pass, with its own uniform state
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub name: String,
    pub uniforms: Uniforms,
    pub defines: BTreeMap<String, String>,
    pub vertex_shader: String,
    pub fragment_shader: String,
    /// Uniform holding the texture this material reads as its input
    pub input_uniform: Option<String>,
}

impl ShaderMaterial {
    /// Build a material with an independent copy of the definition's uniforms
    pub fn from_definition(definition: &ShaderDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            uniforms: definition.uniforms.clone(),
            defines: definition.defines.clone(),
            vertex_shader: definition.vertex_shader.clone(),
            fragment_shader: definition.fragment_shader.clone(),
            input_uniform: None,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniforms.get(name)
    }
}
