//! Shared helpers for composer integration tests.

use effect_composer::backend::{DeviceCommand, DummyDevice, TargetContent};
use effect_composer::backend::{CameraHandle, SceneHandle};
use effect_composer::{Composer, ShaderDefinition, UniformValue};

pub const SCENE: SceneHandle = SceneHandle(1);
pub const MASK_SCENE: SceneHandle = SceneHandle(2);
pub const CAMERA: CameraHandle = CameraHandle(1);

/// Composer over a fresh dummy device of the given output size.
pub fn composer(width: u32, height: u32) -> Composer<DummyDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    Composer::new(DummyDevice::new(width, height), None).unwrap()
}

/// Non-identity effect reading from `tDiffuse`.
pub fn tint_shader() -> ShaderDefinition {
    ShaderDefinition::new("tint")
        .with_uniform("tDiffuse", UniformValue::Texture(None))
        .with_uniform("amount", UniformValue::Float(0.5))
}

pub fn scene_content() -> TargetContent {
    TargetContent::Scene {
        scene: SCENE,
        camera: CAMERA,
        override_material: None,
    }
}

/// Index of every recorded fullscreen draw of `material`.
#[allow(dead_code)]
pub fn draws_of(device: &DummyDevice, material: &str) -> Vec<usize> {
    device
        .commands()
        .iter()
        .enumerate()
        .filter_map(|(index, command)| match command {
            DeviceCommand::DrawFullscreen { material: name, .. } if name == material => Some(index),
            _ => None,
        })
        .collect()
}
