//! Full-screen shader pass

use crate::backend::traits::*;
use crate::composer::{ComposerPass, PassContext};
use crate::resources::{ShaderDefinition, ShaderMaterial, UniformValue, Uniforms};

/// Uniform slot the read buffer is bound to unless configured otherwise
pub const DEFAULT_TEXTURE_UNIFORM: &str = "tDiffuse";

/// Applies a full-screen shader effect.
///
/// The read buffer is bound to the texture uniform and a full-viewport quad is
/// drawn into the write buffer, or straight to the device output when
/// `render_to_screen` is set. The draw overwrites every pixel, so no clear is
/// needed by default.
#[derive(Debug, Clone)]
pub struct ShaderPass {
    /// Name of the uniform that receives the read buffer
    pub texture_id: String,
    material: ShaderMaterial,
    pub render_to_screen: bool,
    pub enabled: bool,
    pub clear: bool,
    pub needs_swap: bool,
}

impl ShaderPass {
    /// Create a pass with its own copy of the definition's uniforms
    pub fn new(definition: &ShaderDefinition) -> Self {
        Self::with_texture_id(definition, DEFAULT_TEXTURE_UNIFORM)
    }

    pub fn with_texture_id(definition: &ShaderDefinition, texture_id: &str) -> Self {
        let mut pass = Self::from_material(ShaderMaterial::from_definition(definition));
        pass.texture_id = texture_id.to_string();
        pass
    }

    /// Use an existing material as is
    pub fn from_material(material: ShaderMaterial) -> Self {
        Self {
            texture_id: DEFAULT_TEXTURE_UNIFORM.to_string(),
            material,
            render_to_screen: false,
            enabled: true,
            clear: false,
            needs_swap: true,
        }
    }

    pub fn rendering_to_screen(mut self) -> Self {
        self.render_to_screen = true;
        self
    }

    pub fn material(&self) -> &ShaderMaterial {
        &self.material
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.material.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut Uniforms {
        &mut self.material.uniforms
    }

    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.material.uniforms.insert(name, value);
    }
}

impl ComposerPass for ShaderPass {
    fn name(&self) -> &str {
        &self.material.name
    }

    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        if let Some(slot) = self.material.uniforms.get_mut(&self.texture_id) {
            *slot = UniformValue::Texture(Some(ctx.read_buffer.texture()));
            if self.material.input_uniform.as_deref() != Some(self.texture_id.as_str()) {
                self.material.input_uniform = Some(self.texture_id.clone());
            }
        }

        let target = if self.render_to_screen {
            None
        } else {
            Some(ctx.write_buffer)
        };
        ctx.device.draw_fullscreen(&self.material, target, self.clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceCommand, DummyDevice, RenderTargetDescriptor, TargetContent};
    use crate::pipeline::copy_shader;
    use crate::resources::RenderTarget;

    fn targets(device: &mut DummyDevice) -> (RenderTarget, RenderTarget) {
        let write = RenderTarget::new(device, RenderTargetDescriptor::new(4, 4)).unwrap();
        let read = RenderTarget::new(device, RenderTargetDescriptor::new(4, 4)).unwrap();
        (write, read)
    }

    fn render(pass: &mut ShaderPass, device: &mut DummyDevice, write: &RenderTarget, read: &RenderTarget) {
        pass.render(&mut PassContext {
            device,
            write_buffer: write,
            read_buffer: read,
            delta: 0.016,
            mask_active: false,
        });
    }

    #[test]
    fn test_binds_read_buffer_and_draws_into_write_buffer() {
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        let mut pass = ShaderPass::new(&copy_shader());

        render(&mut pass, &mut device, &write, &read);

        assert_eq!(
            pass.uniforms().get(DEFAULT_TEXTURE_UNIFORM),
            Some(&UniformValue::Texture(Some(read.texture())))
        );
        assert_eq!(
            device.commands().last(),
            Some(&DeviceCommand::DrawFullscreen {
                material: "copy".to_string(),
                input: Some(read.texture()),
                target: Some(write.texture()),
                clear: false,
            })
        );
    }

    #[test]
    fn test_render_to_screen_bypasses_buffers() {
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        device.render(SceneHandle(1), CameraHandle(1), Some(&read), true);
        let mut pass = ShaderPass::new(&copy_shader()).rendering_to_screen();

        render(&mut pass, &mut device, &write, &read);

        assert!(matches!(
            device.screen_content().covered,
            TargetContent::Scene { .. }
        ));
        assert_eq!(
            device.target_content(write.texture()).unwrap().covered,
            TargetContent::Undefined
        );
    }

    #[test]
    fn test_custom_texture_id() {
        let definition = ShaderDefinition::new("blend")
            .with_uniform("tSource", UniformValue::Texture(None))
            .with_uniform(DEFAULT_TEXTURE_UNIFORM, UniformValue::Texture(None));
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        let mut pass = ShaderPass::with_texture_id(&definition, "tSource");

        render(&mut pass, &mut device, &write, &read);

        assert_eq!(
            pass.uniforms().get("tSource"),
            Some(&UniformValue::Texture(Some(read.texture())))
        );
        assert_eq!(
            pass.uniforms().get(DEFAULT_TEXTURE_UNIFORM),
            Some(&UniformValue::Texture(None))
        );
    }

    #[test]
    fn test_custom_texture_id_is_the_modelled_input() {
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        let other = RenderTarget::new(&mut device, RenderTargetDescriptor::new(4, 4)).unwrap();
        device.render(SceneHandle(3), CameraHandle(1), Some(&read), true);
        let definition = ShaderDefinition::new("blend")
            .with_uniform("tSource", UniformValue::Texture(None))
            .with_uniform("tBase", UniformValue::Texture(Some(other.texture())));
        let mut pass = ShaderPass::with_texture_id(&definition, "tSource");

        render(&mut pass, &mut device, &write, &read);

        assert_eq!(pass.material().input_uniform.as_deref(), Some("tSource"));
        assert!(matches!(
            device.commands().last(),
            Some(DeviceCommand::DrawFullscreen { input, .. }) if *input == Some(read.texture())
        ));
    }

    #[test]
    fn test_from_material_uses_material_as_is() {
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        let mut material = ShaderMaterial::from_definition(
            &ShaderDefinition::new("vignette")
                .with_uniform(DEFAULT_TEXTURE_UNIFORM, UniformValue::Texture(None))
                .with_uniform("darkness", UniformValue::Float(0.3)),
        );
        material.defines.insert("SAMPLES".to_string(), "4".to_string());
        let mut pass = ShaderPass::from_material(material.clone());

        assert_eq!(pass.material(), &material);
        assert_eq!(pass.name(), "vignette");
        assert!(pass.needs_swap);

        render(&mut pass, &mut device, &write, &read);

        assert_eq!(pass.uniforms().get("darkness"), Some(&UniformValue::Float(0.3)));
        assert_eq!(
            pass.uniforms().get(DEFAULT_TEXTURE_UNIFORM),
            Some(&UniformValue::Texture(Some(read.texture())))
        );
        assert_eq!(pass.material().defines, material.defines);
    }

    #[test]
    fn test_missing_texture_uniform_is_not_added() {
        let definition = ShaderDefinition::new("solid").with_uniform("tint", UniformValue::Float(1.0));
        let mut device = DummyDevice::new(4, 4);
        let (write, read) = targets(&mut device);
        let mut pass = ShaderPass::new(&definition);

        render(&mut pass, &mut device, &write, &read);

        assert!(!pass.uniforms().contains(DEFAULT_TEXTURE_UNIFORM));
    }

    #[test]
    fn test_passes_from_one_definition_have_independent_uniforms() {
        let definition = copy_shader();
        let mut first = ShaderPass::new(&definition);
        let second = ShaderPass::new(&definition);

        first.set_uniform("opacity", UniformValue::Float(0.25));

        assert_eq!(first.uniforms().get("opacity"), Some(&UniformValue::Float(0.25)));
        assert_eq!(second.uniforms().get("opacity"), Some(&UniformValue::Float(1.0)));
        assert_eq!(
            definition.uniforms.get("opacity"),
            Some(&UniformValue::Float(1.0))
        );
    }
}
