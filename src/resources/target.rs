//! Off-screen render targets

use crate::backend::traits::*;
use crate::backend::types::*;

/// GPU-backed 2D color buffer the composer renders into and samples from.
///
/// The texture is owned by the device; this type only tracks the handle and
/// the descriptor it was created with. Release it explicitly with
/// [`dispose`](Self::dispose).
#[derive(Debug)]
pub struct RenderTarget {
    texture: TextureHandle,
    desc: RenderTargetDescriptor,
    disposed: bool,
}

impl RenderTarget {
    /// Allocate a new target on `device`
    pub fn new<D: RenderDevice + ?Sized>(
        device: &mut D,
        desc: RenderTargetDescriptor,
    ) -> BackendResult<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::InvalidTargetSize {
                width: desc.width,
                height: desc.height,
            });
        }

        let texture = device.create_render_target(&desc)?;
        log::trace!(
            "created render target {:?} {:?} ({}x{})",
            texture,
            desc.label,
            desc.width,
            desc.height
        );

        Ok(Self {
            texture,
            desc,
            disposed: false,
        })
    }

    /// Allocate a second target with the same descriptor
    pub fn duplicate<D: RenderDevice + ?Sized>(&self, device: &mut D) -> BackendResult<Self> {
        Self::new(device, self.desc.clone())
    }

    /// Resize in place; the texture handle is preserved
    pub fn set_size<D: RenderDevice + ?Sized>(
        &mut self,
        device: &mut D,
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        if width == 0 || height == 0 {
            return Err(BackendError::InvalidTargetSize { width, height });
        }

        device.resize_render_target(self.texture, width, height)?;
        self.desc.width = width;
        self.desc.height = height;
        Ok(())
    }

    /// Release the GPU texture. Disposing twice is a no-op.
    pub fn dispose<D: RenderDevice + ?Sized>(&mut self, device: &mut D) {
        if self.disposed {
            return;
        }
        device.destroy_render_target(self.texture);
        self.disposed = true;
        log::trace!("disposed render target {:?}", self.texture);
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn descriptor(&self) -> &RenderTargetDescriptor {
        &self.desc
    }

    pub fn label(&self) -> Option<&str> {
        self.desc.label.as_deref()
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.desc.width, self.desc.height)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}
