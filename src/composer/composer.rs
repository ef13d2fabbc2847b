//! The effect composer: ping-pong buffers, pass execution and mask bookkeeping

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::composer::pass::*;
use crate::pipeline::{ShaderPass, MASK_REFERENCE};
use crate::resources::RenderTarget;
use crate::ComposerConfig;
use thiserror::Error;

/// Composer error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposerError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("Render target {0:?} has been disposed")]
    TargetDisposed(TextureHandle),
    #[error("Render target size {width}x{height} is invalid")]
    InvalidTargetSize { width: u32, height: u32 },
    #[error("A masked swap needs the copy pass, but the composer was built without a copy shader")]
    MissingCopyPass,
}

pub type ComposerResult<T> = Result<T, ComposerError>;

/// What happened to one enabled pass during [`Composer::render`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRecord {
    /// Position in the pass list
    pub index: usize,
    pub kind: PassKind,
    pub name: String,
    /// Mask state handed to the pass
    pub mask_active: bool,
    /// Mask state once the pass has run
    pub mask_active_after: bool,
    pub swapped: bool,
    /// Whether a copy through the inverted stencil preceded the swap
    pub masked_copy: bool,
}

/// Summary of one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub records: Vec<PassRecord>,
    pub swaps: usize,
    pub masked_copies: usize,
}

impl FrameReport {
    pub fn executed(&self) -> usize {
        self.records.len()
    }

    /// Mask state after each executed pass
    pub fn mask_trace(&self) -> Vec<bool> {
        self.records
            .iter()
            .map(|record| record.mask_active_after)
            .collect()
    }
}

/// Runs an ordered list of passes over two ping-pong render targets.
///
/// The write and read buffers are two slots of a fixed pair; a swap flips
/// which slot is which and never copies pixels. Both slots are reset at the
/// start of every frame so pass ordering is reproducible.
pub struct Composer<D: RenderDevice> {
    device: D,
    targets: [RenderTarget; 2],
    /// Slot of the current write buffer; the read buffer is the other one
    write_index: usize,
    passes: Vec<Pass>,
    copy_pass: Option<ShaderPass>,
    config: ComposerConfig,
}

impl<D: RenderDevice> Composer<D> {
    /// Create a composer with the default configuration.
    ///
    /// Without a `target`, one sized to the device output is created. The
    /// second buffer is always a duplicate of the first.
    pub fn new(device: D, target: Option<RenderTarget>) -> ComposerResult<Self> {
        Self::with_config(device, ComposerConfig::default(), target)
    }

    pub fn with_config(
        mut device: D,
        config: ComposerConfig,
        target: Option<RenderTarget>,
    ) -> ComposerResult<Self> {
        let first = match target {
            Some(target) => target,
            None => {
                let (width, height) = device.size();
                RenderTarget::new(&mut device, config.target_descriptor(width, height))?
            }
        };
        let (first, second) = pair_from(&mut device, first)?;

        let copy_pass = match &config.copy_shader {
            Some(shader) => Some(ShaderPass::with_texture_id(shader, &config.texture_uniform)),
            None => {
                log::warn!("Composer created without a copy shader; masked swaps will fail");
                None
            }
        };

        log::debug!(
            "Composer created with {}x{} targets {:?} / {:?}",
            first.width(),
            first.height(),
            first.texture(),
            second.texture()
        );

        Ok(Self {
            device,
            targets: [first, second],
            write_index: 0,
            passes: Vec::new(),
            copy_pass,
            config,
        })
    }

    /// Append a pass to the end of the list
    pub fn add_pass(&mut self, pass: impl Into<Pass>) {
        self.passes.push(pass.into());
    }

    /// Insert a pass at `index`, shifting later passes back.
    ///
    /// An index past the end is clamped to an append. Returns the index used.
    pub fn insert_pass(&mut self, pass: impl Into<Pass>, index: usize) -> usize {
        let len = self.passes.len();
        let index = if index > len {
            log::warn!("insert_pass index {} out of range 0..={}, appending", index, len);
            len
        } else {
            index
        };
        self.passes.insert(index, pass.into());
        index
    }

    pub fn remove_pass(&mut self, index: usize) -> Option<Pass> {
        if index < self.passes.len() {
            Some(self.passes.remove(index))
        } else {
            None
        }
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn passes_mut(&mut self) -> &mut [Pass] {
        &mut self.passes
    }

    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn pass_mut(&mut self, index: usize) -> Option<&mut Pass> {
        self.passes.get_mut(index)
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Run every enabled pass once, in list order
    pub fn render(&mut self, delta: f32) -> ComposerResult<FrameReport> {
        self.check_targets()?;

        self.write_index = 0;
        let mut mask_active = false;
        let mut report = FrameReport::default();

        for (index, pass) in self.passes.iter_mut().enumerate() {
            if !pass.enabled() {
                continue;
            }

            let (write, read) = buffers(&self.targets, self.write_index);
            log::trace!(
                "pass {} ({}) write={:?} read={:?} mask={}",
                index,
                pass.name(),
                write.texture(),
                read.texture(),
                mask_active
            );

            pass.render(&mut PassContext {
                device: &mut self.device,
                write_buffer: write,
                read_buffer: read,
                delta,
                mask_active,
            });

            let mut swapped = false;
            let mut masked_copy = false;
            if pass.needs_swap() {
                if mask_active {
                    masked_copy_through(
                        &mut self.device,
                        self.copy_pass.as_mut(),
                        write,
                        read,
                        delta,
                    )?;
                    masked_copy = true;
                    report.masked_copies += 1;
                }
                self.write_index ^= 1;
                log::trace!("swap after pass {}, masked copy: {}", index, masked_copy);
                swapped = true;
                report.swaps += 1;
            }

            let mask_before = mask_active;
            match pass.kind() {
                PassKind::Mask => mask_active = true,
                PassKind::ClearMask => mask_active = false,
                _ => {}
            }

            report.records.push(PassRecord {
                index,
                kind: pass.kind(),
                name: pass.name().to_string(),
                mask_active: mask_before,
                mask_active_after: mask_active,
                swapped,
                masked_copy,
            });
        }

        Ok(report)
    }

    /// Exchange the write and read buffers
    pub fn swap_buffers(&mut self) {
        self.write_index ^= 1;
    }

    /// Replace both targets.
    ///
    /// Without a `target`, the first buffer is recreated with its current
    /// descriptor at the device's output size. The old targets are disposed.
    pub fn reset(&mut self, target: Option<RenderTarget>) -> ComposerResult<()> {
        let first = match target {
            Some(target) => target,
            None => {
                let (width, height) = self.device.size();
                let desc = RenderTargetDescriptor {
                    width,
                    height,
                    ..self.targets[0].descriptor().clone()
                };
                RenderTarget::new(&mut self.device, desc)?
            }
        };
        let (first, second) = pair_from(&mut self.device, first)?;

        for target in self.targets.iter_mut() {
            target.dispose(&mut self.device);
        }

        log::debug!(
            "Composer reset to {}x{} targets {:?} / {:?}",
            first.width(),
            first.height(),
            first.texture(),
            second.texture()
        );

        self.targets = [first, second];
        self.write_index = 0;
        Ok(())
    }

    /// Resize both targets in place.
    ///
    /// Both targets keep their previous size if either resize fails.
    pub fn set_size(&mut self, width: u32, height: u32) -> ComposerResult<()> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidTargetSize { width, height }.into());
        }

        let (previous_width, previous_height) = self.targets[0].size();
        self.targets[0].set_size(&mut self.device, width, height)?;
        if let Err(err) = self.targets[1].set_size(&mut self.device, width, height) {
            if let Err(rollback) =
                self.targets[0].set_size(&mut self.device, previous_width, previous_height)
            {
                log::error!("Composer resize rollback failed: {}", rollback);
            }
            log::error!("Composer resize to {}x{} failed: {}", width, height, err);
            return Err(err.into());
        }

        log::debug!("Composer resized to {}x{}", width, height);
        Ok(())
    }

    /// Release both targets. The composer can be revived with [`reset`](Self::reset).
    pub fn dispose(&mut self) {
        for target in self.targets.iter_mut() {
            target.dispose(&mut self.device);
        }
    }

    pub fn write_buffer(&self) -> &RenderTarget {
        &self.targets[self.write_index]
    }

    pub fn read_buffer(&self) -> &RenderTarget {
        &self.targets[self.write_index ^ 1]
    }

    /// Both targets in creation order, independent of the current aliasing
    pub fn render_targets(&self) -> &[RenderTarget; 2] {
        &self.targets
    }

    pub fn copy_pass(&self) -> Option<&ShaderPass> {
        self.copy_pass.as_ref()
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    fn check_targets(&self) -> ComposerResult<()> {
        for target in &self.targets {
            if target.is_disposed() {
                log::error!("Composer render with disposed target {:?}", target.texture());
                return Err(ComposerError::TargetDisposed(target.texture()));
            }
            let (width, height) = target.size();
            if width == 0 || height == 0 {
                log::error!("Composer render with {}x{} target", width, height);
                return Err(ComposerError::InvalidTargetSize { width, height });
            }
        }
        Ok(())
    }
}

/// Duplicate `first` into a ping-pong pair. `first` is released if the
/// duplicate cannot be allocated.
fn pair_from<D: RenderDevice>(
    device: &mut D,
    mut first: RenderTarget,
) -> ComposerResult<(RenderTarget, RenderTarget)> {
    match first.duplicate(device) {
        Ok(second) => Ok((first, second)),
        Err(err) => {
            log::error!("Failed to allocate second composer target: {}", err);
            first.dispose(device);
            Err(err.into())
        }
    }
}

fn buffers(targets: &[RenderTarget; 2], write_index: usize) -> (&RenderTarget, &RenderTarget) {
    (&targets[write_index], &targets[write_index ^ 1])
}

/// Carry the read buffer's pixels outside the mask into the write buffer, so
/// the swap does not lose them.
fn masked_copy_through<D: RenderDevice>(
    device: &mut D,
    copy_pass: Option<&mut ShaderPass>,
    write: &RenderTarget,
    read: &RenderTarget,
    delta: f32,
) -> ComposerResult<()> {
    let Some(copy_pass) = copy_pass else {
        log::error!("masked swap without a copy pass");
        return Err(ComposerError::MissingCopyPass);
    };

    device.set_stencil_func(StencilFunc::not_equal(MASK_REFERENCE));
    copy_pass.render(&mut PassContext {
        device: &mut *device,
        write_buffer: write,
        read_buffer: read,
        delta,
        mask_active: true,
    });
    device.set_stencil_func(StencilFunc::equal(MASK_REFERENCE));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;
    use crate::pipeline::{copy_shader, ClearMaskPass, ClearPass, MaskPass, ScenePass, ShaderPass};

    fn composer() -> Composer<DummyDevice> {
        Composer::new(DummyDevice::new(64, 32), None).unwrap()
    }

    #[test]
    fn test_construct_allocates_pair_at_device_size() {
        let composer = composer();
        let [first, second] = composer.render_targets();

        assert_ne!(first.texture(), second.texture());
        assert_eq!(first.size(), (64, 32));
        assert_eq!(second.size(), (64, 32));
        assert_eq!(first.descriptor().min_filter, FilterMode::Linear);
        assert_eq!(first.descriptor().format, TextureFormat::Rgba8Unorm);
        assert!(!first.descriptor().stencil_buffer);
        assert_eq!(composer.write_buffer().texture(), first.texture());
        assert_eq!(composer.read_buffer().texture(), second.texture());
        assert_eq!(composer.pass_count(), 0);
        assert!(composer.copy_pass().is_some());
    }

    #[test]
    fn test_supplied_target_is_used() {
        let mut device = DummyDevice::new(64, 32);
        let target =
            RenderTarget::new(&mut device, RenderTargetDescriptor::new(16, 16)).unwrap();
        let handle = target.texture();

        let composer = Composer::new(device, Some(target)).unwrap();

        assert_eq!(composer.write_buffer().texture(), handle);
        assert_eq!(composer.read_buffer().size(), (16, 16));
    }

    #[test]
    fn test_missing_copy_shader_is_not_fatal() {
        let config = ComposerConfig::default().without_copy_shader();
        let composer = Composer::with_config(DummyDevice::new(8, 8), config, None).unwrap();
        assert!(composer.copy_pass().is_none());
    }

    #[test]
    fn test_insert_pass_clamps() {
        let mut composer = composer();
        composer.add_pass(ClearPass::new());
        let index = composer.insert_pass(ClearMaskPass::new(), 10);

        assert_eq!(index, 1);
        assert_eq!(composer.pass(1).map(Pass::kind), Some(PassKind::ClearMask));
    }

    #[test]
    fn test_remove_pass() {
        let mut composer = composer();
        composer.add_pass(ClearPass::new());
        assert!(composer.remove_pass(3).is_none());
        assert_eq!(composer.remove_pass(0).map(|p| p.kind()), Some(PassKind::Clear));
        assert_eq!(composer.pass_count(), 0);
    }

    #[test]
    fn test_swap_buffers_flips_aliases() {
        let mut composer = composer();
        let write = composer.write_buffer().texture();
        let read = composer.read_buffer().texture();

        composer.swap_buffers();

        assert_eq!(composer.write_buffer().texture(), read);
        assert_eq!(composer.read_buffer().texture(), write);
    }

    #[test]
    fn test_render_resets_aliases_each_frame() {
        let mut composer = composer();
        composer.add_pass(ShaderPass::new(&copy_shader()));
        let first = composer.render_targets()[0].texture();

        composer.render(0.016).unwrap();
        assert_eq!(composer.read_buffer().texture(), first);

        composer.render(0.016).unwrap();
        assert_eq!(composer.read_buffer().texture(), first);
    }

    #[test]
    fn test_masked_swap_without_copy_pass_fails() {
        let config = ComposerConfig::default().without_copy_shader();
        let mut composer = Composer::with_config(DummyDevice::new(8, 8), config, None).unwrap();
        composer.add_pass(MaskPass::new(SceneHandle(1), CameraHandle(1)));
        composer.add_pass(ShaderPass::new(&copy_shader()));

        assert_eq!(composer.render(0.0), Err(ComposerError::MissingCopyPass));
    }

    #[test]
    fn test_render_after_dispose_fails() {
        let mut composer = composer();
        composer.add_pass(ScenePass::new(SceneHandle(1), CameraHandle(1)));
        composer.dispose();

        let disposed = composer.render_targets()[0].texture();
        assert_eq!(composer.render(0.0), Err(ComposerError::TargetDisposed(disposed)));

        composer.reset(None).unwrap();
        assert!(composer.render(0.0).is_ok());
    }

    #[test]
    fn test_reset_with_supplied_target() {
        let mut composer = composer();
        let old = composer.render_targets()[0].texture();
        let target = RenderTarget::new(
            composer.device_mut(),
            RenderTargetDescriptor::new(10, 20).with_label("custom"),
        )
        .unwrap();
        let handle = target.texture();

        composer.reset(Some(target)).unwrap();

        assert_eq!(composer.write_buffer().texture(), handle);
        assert_eq!(composer.read_buffer().size(), (10, 20));
        assert_eq!(composer.read_buffer().label(), Some("custom"));
        assert!(composer.device().target_size(old).is_none());
        assert_eq!(composer.device().live_target_count(), 2);
    }

    #[test]
    fn test_set_size_rejects_zero() {
        let mut composer = composer();
        assert_eq!(
            composer.set_size(0, 10),
            Err(ComposerError::Backend(BackendError::InvalidTargetSize {
                width: 0,
                height: 10
            }))
        );
    }

    #[test]
    fn test_failed_reset_releases_new_target() {
        let mut composer = composer();
        let old: Vec<_> = composer.render_targets().iter().map(|t| t.texture()).collect();
        composer.device_mut().set_target_budget(Some(3));

        let result = composer.reset(None);

        assert!(matches!(
            result,
            Err(ComposerError::Backend(BackendError::TargetCreationFailed(_)))
        ));
        assert_eq!(composer.device().live_target_count(), 2);
        let current: Vec<_> = composer.render_targets().iter().map(|t| t.texture()).collect();
        assert_eq!(current, old);
        assert!(composer.render(0.0).is_ok());
    }

    #[test]
    fn test_failed_reset_releases_supplied_target() {
        let mut composer = composer();
        let target = RenderTarget::new(composer.device_mut(), RenderTargetDescriptor::new(8, 8))
            .unwrap();
        let supplied = target.texture();
        composer.device_mut().set_target_budget(Some(3));

        assert!(composer.reset(Some(target)).is_err());
        assert!(composer.device().target_size(supplied).is_none());
        assert_eq!(composer.device().live_target_count(), 2);
    }

    #[test]
    fn test_failed_construction_releases_first_target() {
        let mut device = DummyDevice::new(8, 8);
        device.set_target_budget(Some(1));

        let result = Composer::new(device, None);

        assert!(matches!(
            result.err(),
            Some(ComposerError::Backend(BackendError::TargetCreationFailed(_)))
        ));
    }

    #[test]
    fn test_pair_from_disposes_first_on_failure() {
        let mut device = DummyDevice::new(8, 8);
        device.set_target_budget(Some(1));
        let first = RenderTarget::new(&mut device, RenderTargetDescriptor::new(8, 8)).unwrap();

        assert!(pair_from(&mut device, first).is_err());
        assert_eq!(device.live_target_count(), 0);
        assert_eq!(device.destroyed_target_count(), 1);
    }

    #[test]
    fn test_failed_set_size_keeps_pair_equal() {
        let mut composer = composer();
        let second = composer.render_targets()[1].texture();
        // The device loses the second texture behind the composer's back.
        composer.device_mut().destroy_render_target(second);

        let result = composer.set_size(128, 128);

        assert_eq!(
            result,
            Err(ComposerError::Backend(BackendError::UnknownTarget(second)))
        );
        let first = composer.render_targets()[0].texture();
        assert_eq!(composer.render_targets()[0].size(), (64, 32));
        assert_eq!(composer.device().target_size(first), Some((64, 32)));
    }

    #[test]
    fn test_into_device() {
        let composer = composer();
        let device = composer.into_device();
        assert_eq!(device.live_target_count(), 2);
    }
}
