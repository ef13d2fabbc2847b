//! Dummy device for testing and development.
//!
//! This device doesn't perform actual GPU operations. It records every call
//! and keeps a symbolic model of what each render target contains, which is
//! enough to check pass ordering, buffer swaps and stencil masking without
//! GPU hardware.
//!
//! The stencil model splits the frame into two regions: pixels covered by the
//! geometry of the last scene drawn with a `Replace` stencil op, and the rest.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::resources::{RenderTarget, ShaderMaterial, UniformValue};

/// Symbolic content of one region of a color buffer
#[derive(Debug, Clone, PartialEq)]
pub enum TargetContent {
    /// Never written
    Undefined,
    Cleared { color: Vec3, alpha: f32 },
    Scene {
        scene: SceneHandle,
        camera: CameraHandle,
        override_material: Option<MaterialHandle>,
    },
    Effect {
        material: String,
        input: Box<TargetContent>,
    },
}

/// Content of a color buffer split by stencil region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionContent {
    /// Pixels covered by the mask geometry
    pub covered: TargetContent,
    /// Every other pixel
    pub uncovered: TargetContent,
}

impl RegionContent {
    pub fn uniform(content: TargetContent) -> Self {
        Self {
            covered: content.clone(),
            uncovered: content,
        }
    }

    pub fn is_uniform(&self) -> bool {
        self.covered == self.uncovered
    }

    fn region(&self, region: Region) -> &TargetContent {
        match region {
            Region::Covered => &self.covered,
            Region::Uncovered => &self.uncovered,
        }
    }

    fn region_mut(&mut self, region: Region) -> &mut TargetContent {
        match region {
            Region::Covered => &mut self.covered,
            Region::Uncovered => &mut self.uncovered,
        }
    }
}

impl Default for RegionContent {
    fn default() -> Self {
        Self::uniform(TargetContent::Undefined)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Covered,
    Uncovered,
}

const REGIONS: [Region; 2] = [Region::Covered, Region::Uncovered];

/// A call made on the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    SetClearColor { color: Vec3, alpha: f32 },
    Render {
        scene: SceneHandle,
        camera: CameraHandle,
        target: Option<TextureHandle>,
        clear: bool,
    },
    SetOverrideMaterial {
        scene: SceneHandle,
        material: Option<MaterialHandle>,
    },
    DrawFullscreen {
        material: String,
        input: Option<TextureHandle>,
        target: Option<TextureHandle>,
        clear: bool,
    },
    SetRenderTarget(Option<TextureHandle>),
    Clear,
    CreateTarget(TextureHandle),
    ResizeTarget {
        texture: TextureHandle,
        width: u32,
        height: u32,
    },
    DestroyTarget(TextureHandle),
    ColorMask(bool),
    DepthMask(bool),
    StencilTest(bool),
    StencilOp(StencilOps),
    StencilFunc(StencilFunc),
    ClearStencil(u32),
}

#[derive(Debug)]
struct DummyTarget {
    desc: RenderTargetDescriptor,
    content: RegionContent,
}

/// Recording device with no GPU behind it
#[derive(Debug)]
pub struct DummyDevice {
    width: u32,
    height: u32,
    clear_color: Vec3,
    clear_alpha: f32,
    state: StencilState,
    /// Stencil values for the covered and uncovered regions
    stencil: [u32; 2],
    current_target: Option<TextureHandle>,
    targets: BTreeMap<TextureHandle, DummyTarget>,
    screen: RegionContent,
    overrides: HashMap<SceneHandle, MaterialHandle>,
    next_handle: u64,
    destroyed: usize,
    /// Maximum number of live targets; creation beyond it fails
    target_budget: Option<usize>,
    commands: Vec<DeviceCommand>,
}

impl DummyDevice {
    /// Create a device whose output is `width` x `height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_color: Vec3::ZERO,
            clear_alpha: 1.0,
            state: StencilState::default(),
            stencil: [0, 0],
            current_target: None,
            targets: BTreeMap::new(),
            screen: RegionContent::default(),
            overrides: HashMap::new(),
            next_handle: 1,
            destroyed: 0,
            target_budget: None,
            commands: Vec::new(),
        }
    }

    /// Get the device name.
    pub fn name(&self) -> &'static str {
        "Dummy Device"
    }

    /// Change the output size, as a window resize would
    pub fn resize_output(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Every call made so far, in order
    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded calls matching `predicate`
    pub fn count_commands(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }

    /// Limit the number of live targets, as a device running out of memory would
    pub fn set_target_budget(&mut self, budget: Option<usize>) {
        self.target_budget = budget;
    }

    pub fn stencil_state(&self) -> &StencilState {
        &self.state
    }

    pub fn target_content(&self, texture: TextureHandle) -> Option<&RegionContent> {
        self.targets.get(&texture).map(|target| &target.content)
    }

    pub fn screen_content(&self) -> &RegionContent {
        &self.screen
    }

    pub fn target_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.targets
            .get(&texture)
            .map(|target| (target.desc.width, target.desc.height))
    }

    pub fn target_descriptor(&self, texture: TextureHandle) -> Option<&RenderTargetDescriptor> {
        self.targets.get(&texture).map(|target| &target.desc)
    }

    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    pub fn destroyed_target_count(&self) -> usize {
        self.destroyed
    }

    pub fn override_material(&self, scene: SceneHandle) -> Option<MaterialHandle> {
        self.overrides.get(&scene).copied()
    }

    fn region_index(region: Region) -> usize {
        match region {
            Region::Covered => 0,
            Region::Uncovered => 1,
        }
    }

    fn region_writable(&self, region: Region) -> bool {
        if !self.state.color_write {
            return false;
        }
        !self.state.test_enabled || self.state.func.test(self.stencil[Self::region_index(region)])
    }

    fn content_mut(&mut self, target: Option<TextureHandle>) -> Option<&mut RegionContent> {
        match target {
            None => Some(&mut self.screen),
            Some(texture) => self.targets.get_mut(&texture).map(|target| &mut target.content),
        }
    }

    fn content(&self, target: Option<TextureHandle>) -> Option<&RegionContent> {
        match target {
            None => Some(&self.screen),
            Some(texture) => self.target_content(texture),
        }
    }

    /// Clear color, depth and stencil. Color respects the color mask; the
    /// stencil test does not apply to clears.
    fn clear_target(&mut self, target: Option<TextureHandle>) {
        let cleared = TargetContent::Cleared {
            color: self.clear_color,
            alpha: self.clear_alpha,
        };
        let color_write = self.state.color_write;
        if let Some(content) = self.content_mut(target) {
            if color_write {
                *content = RegionContent::uniform(cleared);
            }
        } else {
            log::warn!("DummyDevice: clear on unknown target {:?}", target);
        }
        self.stencil = [self.state.clear_value; 2];
    }

    fn write_regions(
        &mut self,
        target: Option<TextureHandle>,
        produce: impl Fn(Region) -> TargetContent,
    ) {
        let writable: Vec<Region> = REGIONS
            .iter()
            .copied()
            .filter(|&region| self.region_writable(region))
            .collect();

        let Some(content) = self.content_mut(target) else {
            log::warn!("DummyDevice: draw into unknown target {:?}", target);
            return;
        };
        for region in writable {
            *content.region_mut(region) = produce(region);
        }
    }

    /// Texture the draw samples. Without a declared input uniform, the first
    /// bound texture in name order.
    fn bound_input(material: &ShaderMaterial) -> Option<TextureHandle> {
        match &material.input_uniform {
            Some(name) => material.uniform(name).and_then(UniformValue::as_texture),
            None => material
                .uniforms
                .iter()
                .find_map(|(_, value)| value.as_texture()),
        }
    }

    fn is_identity_copy(material: &ShaderMaterial) -> bool {
        material.name == "copy"
            && material.uniform("opacity") == Some(&UniformValue::Float(1.0))
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl RenderDevice for DummyDevice {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_color(&self) -> Vec3 {
        self.clear_color
    }

    fn clear_alpha(&self) -> f32 {
        self.clear_alpha
    }

    fn set_clear_color(&mut self, color: Vec3, alpha: f32) {
        self.commands
            .push(DeviceCommand::SetClearColor { color, alpha });
        self.clear_color = color;
        self.clear_alpha = alpha;
    }

    fn render(
        &mut self,
        scene: SceneHandle,
        camera: CameraHandle,
        target: Option<&RenderTarget>,
        clear: bool,
    ) {
        let target = target.map(RenderTarget::texture);
        log::trace!("DummyDevice: render {:?} into {:?}", scene, target);
        self.commands.push(DeviceCommand::Render {
            scene,
            camera,
            target,
            clear,
        });

        if clear {
            self.clear_target(target);
        }

        // Scene geometry defines the covered region for stencil writes.
        if self.state.test_enabled
            && self.state.ops.pass == StencilOperation::Replace
            && self.state.func.test(self.stencil[0])
        {
            self.stencil[0] = self.state.func.reference;
        }

        let override_material = self.overrides.get(&scene).copied();
        self.write_regions(target, |_| TargetContent::Scene {
            scene,
            camera,
            override_material,
        });
    }

    fn set_override_material(&mut self, scene: SceneHandle, material: Option<MaterialHandle>) {
        self.commands
            .push(DeviceCommand::SetOverrideMaterial { scene, material });
        match material {
            Some(material) => {
                self.overrides.insert(scene, material);
            }
            None => {
                self.overrides.remove(&scene);
            }
        }
    }

    fn draw_fullscreen(
        &mut self,
        material: &ShaderMaterial,
        target: Option<&RenderTarget>,
        clear: bool,
    ) {
        let target = target.map(RenderTarget::texture);
        let input = Self::bound_input(material);
        log::trace!(
            "DummyDevice: fullscreen {} from {:?} into {:?}",
            material.name,
            input,
            target
        );
        self.commands.push(DeviceCommand::DrawFullscreen {
            material: material.name.clone(),
            input,
            target,
            clear,
        });

        if clear {
            self.clear_target(target);
        }

        let source = input
            .and_then(|texture| self.content(Some(texture)))
            .cloned()
            .unwrap_or_default();
        let identity = Self::is_identity_copy(material);
        let name = material.name.clone();
        self.write_regions(target, |region| {
            let sampled = source.region(region).clone();
            if identity {
                sampled
            } else {
                TargetContent::Effect {
                    material: name.clone(),
                    input: Box::new(sampled),
                }
            }
        });
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget>) {
        let target = target.map(RenderTarget::texture);
        self.commands.push(DeviceCommand::SetRenderTarget(target));
        self.current_target = target;
    }

    fn clear(&mut self) {
        self.commands.push(DeviceCommand::Clear);
        self.clear_target(self.current_target);
    }

    fn create_render_target(
        &mut self,
        desc: &RenderTargetDescriptor,
    ) -> BackendResult<TextureHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::InvalidTargetSize {
                width: desc.width,
                height: desc.height,
            });
        }

        if let Some(budget) = self.target_budget {
            if self.targets.len() >= budget {
                return Err(BackendError::TargetCreationFailed(format!(
                    "target budget of {} exhausted",
                    budget
                )));
            }
        }

        let texture = TextureHandle(self.next_handle);
        self.next_handle += 1;
        log::trace!(
            "DummyDevice: creating target {:?} {:?} ({}x{})",
            texture,
            desc.label,
            desc.width,
            desc.height
        );
        self.targets.insert(
            texture,
            DummyTarget {
                desc: desc.clone(),
                content: RegionContent::default(),
            },
        );
        self.commands.push(DeviceCommand::CreateTarget(texture));
        Ok(texture)
    }

    fn resize_render_target(
        &mut self,
        texture: TextureHandle,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        let target = self
            .targets
            .get_mut(&texture)
            .ok_or(BackendError::UnknownTarget(texture))?;
        target.desc.width = width;
        target.desc.height = height;
        self.commands.push(DeviceCommand::ResizeTarget {
            texture,
            width,
            height,
        });
        Ok(())
    }

    fn destroy_render_target(&mut self, texture: TextureHandle) {
        self.commands.push(DeviceCommand::DestroyTarget(texture));
        if self.targets.remove(&texture).is_some() {
            self.destroyed += 1;
        } else {
            log::warn!("DummyDevice: destroying unknown target {:?}", texture);
        }
    }

    fn set_color_mask(&mut self, enabled: bool) {
        self.commands.push(DeviceCommand::ColorMask(enabled));
        self.state.color_write = enabled;
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.commands.push(DeviceCommand::DepthMask(enabled));
        self.state.depth_write = enabled;
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.commands.push(DeviceCommand::StencilTest(enabled));
        self.state.test_enabled = enabled;
    }

    fn set_stencil_op(&mut self, ops: StencilOps) {
        self.commands.push(DeviceCommand::StencilOp(ops));
        self.state.ops = ops;
    }

    fn set_stencil_func(&mut self, func: StencilFunc) {
        self.commands.push(DeviceCommand::StencilFunc(func));
        self.state.func = func;
    }

    fn set_clear_stencil(&mut self, value: u32) {
        self.commands.push(DeviceCommand::ClearStencil(value));
        self.state.clear_value = value;
    }
}
