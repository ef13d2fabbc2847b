//! Scene render pass

use crate::backend::traits::*;
use crate::composer::{ComposerPass, PassContext};
use glam::Vec3;

/// Renders a scene from a camera into the read buffer.
///
/// This produces the base image the following passes read and write
/// alternately, so it does not swap.
#[derive(Debug, Clone)]
pub struct ScenePass {
    pub scene: SceneHandle,
    pub camera: CameraHandle,
    /// Material forced onto every object in the scene (depth/normal passes)
    pub override_material: Option<MaterialHandle>,
    /// Clear color used for this pass only; the device's color is restored afterwards
    pub clear_color: Option<Vec3>,
    pub clear_alpha: f32,
    pub enabled: bool,
    pub clear: bool,
    pub needs_swap: bool,
}

impl ScenePass {
    pub fn new(scene: SceneHandle, camera: CameraHandle) -> Self {
        Self {
            scene,
            camera,
            override_material: None,
            clear_color: None,
            clear_alpha: 1.0,
            enabled: true,
            clear: true,
            needs_swap: false,
        }
    }

    pub fn with_override_material(mut self, material: MaterialHandle) -> Self {
        self.override_material = Some(material);
        self
    }

    pub fn with_clear_color(mut self, color: Vec3, alpha: f32) -> Self {
        self.clear_color = Some(color);
        self.clear_alpha = alpha;
        self
    }
}

impl ComposerPass for ScenePass {
    fn name(&self) -> &str {
        "Scene"
    }

    fn render<D: RenderDevice + ?Sized>(&mut self, ctx: &mut PassContext<'_, D>) {
        let device = &mut *ctx.device;
        device.set_override_material(self.scene, self.override_material);

        let previous_clear = self.clear_color.map(|color| {
            let previous = (device.clear_color(), device.clear_alpha());
            device.set_clear_color(color, self.clear_alpha);
            previous
        });

        device.render(self.scene, self.camera, Some(ctx.read_buffer), self.clear);

        if let Some((color, alpha)) = previous_clear {
            device.set_clear_color(color, alpha);
        }
        device.set_override_material(self.scene, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceCommand, DummyDevice, RenderTargetDescriptor};
    use crate::resources::RenderTarget;

    fn run(pass: &mut ScenePass, device: &mut DummyDevice) -> (RenderTarget, RenderTarget) {
        let write = RenderTarget::new(device, RenderTargetDescriptor::new(4, 4)).unwrap();
        let read = RenderTarget::new(device, RenderTargetDescriptor::new(4, 4)).unwrap();
        device.clear_commands();
        pass.render(&mut PassContext {
            device,
            write_buffer: &write,
            read_buffer: &read,
            delta: 0.016,
            mask_active: false,
        });
        (write, read)
    }

    #[test]
    fn test_renders_into_read_buffer() {
        let mut device = DummyDevice::new(4, 4);
        let mut pass = ScenePass::new(SceneHandle(1), CameraHandle(2));
        let (_write, read) = run(&mut pass, &mut device);

        assert!(device.commands().contains(&DeviceCommand::Render {
            scene: SceneHandle(1),
            camera: CameraHandle(2),
            target: Some(read.texture()),
            clear: true,
        }));
    }

    #[test]
    fn test_override_material_is_scoped_to_the_pass() {
        let mut device = DummyDevice::new(4, 4);
        let mut pass =
            ScenePass::new(SceneHandle(1), CameraHandle(2)).with_override_material(MaterialHandle(9));
        let (_write, read) = run(&mut pass, &mut device);

        assert_eq!(device.override_material(SceneHandle(1)), None);
        assert_eq!(
            device.target_content(read.texture()).unwrap().covered,
            crate::backend::TargetContent::Scene {
                scene: SceneHandle(1),
                camera: CameraHandle(2),
                override_material: Some(MaterialHandle(9)),
            }
        );
    }

    #[test]
    fn test_clear_color_is_restored() {
        let mut device = DummyDevice::new(4, 4);
        device.set_clear_color(Vec3::new(0.1, 0.2, 0.3), 0.5);
        let mut pass =
            ScenePass::new(SceneHandle(1), CameraHandle(2)).with_clear_color(Vec3::ONE, 1.0);
        run(&mut pass, &mut device);

        assert_eq!(device.clear_color(), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(device.clear_alpha(), 0.5);
        assert_eq!(
            device.count_commands(|c| matches!(c, DeviceCommand::SetClearColor { .. })),
            2
        );
    }

    #[test]
    fn test_no_clear_color_leaves_device_untouched() {
        let mut device = DummyDevice::new(4, 4);
        let mut pass = ScenePass::new(SceneHandle(1), CameraHandle(2));
        run(&mut pass, &mut device);

        assert_eq!(
            device.count_commands(|c| matches!(c, DeviceCommand::SetClearColor { .. })),
            0
        );
    }
}
