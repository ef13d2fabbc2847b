//! Common types shared between the composer and devices

/// Texture format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Rgba32Float,
}

impl TextureFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Filter mode for sampling a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// Compare function for depth/stencil
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

impl CompareFunction {
    /// Evaluate `reference <op> value` after both sides are masked.
    pub fn passes(&self, reference: u32, value: u32, mask: u32) -> bool {
        let reference = reference & mask;
        let value = value & mask;
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => reference < value,
            CompareFunction::Equal => reference == value,
            CompareFunction::LessEqual => reference <= value,
            CompareFunction::Greater => reference > value,
            CompareFunction::NotEqual => reference != value,
            CompareFunction::GreaterEqual => reference >= value,
            CompareFunction::Always => true,
        }
    }
}

/// Operation applied to the stencil buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StencilOperation {
    #[default]
    Keep,
    Zero,
    Replace,
    Invert,
}

/// Mask that compares every stencil bit.
pub const STENCIL_MASK_ALL: u32 = 0xFFFF_FFFF;

/// Stencil test function: comparison, reference value and compare mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilFunc {
    pub compare: CompareFunction,
    pub reference: u32,
    pub mask: u32,
}

impl StencilFunc {
    pub fn new(compare: CompareFunction, reference: u32) -> Self {
        Self {
            compare,
            reference,
            mask: STENCIL_MASK_ALL,
        }
    }

    pub fn always(reference: u32) -> Self {
        Self::new(CompareFunction::Always, reference)
    }

    pub fn equal(reference: u32) -> Self {
        Self::new(CompareFunction::Equal, reference)
    }

    pub fn not_equal(reference: u32) -> Self {
        Self::new(CompareFunction::NotEqual, reference)
    }

    pub fn test(&self, stencil: u32) -> bool {
        self.compare.passes(self.reference, stencil, self.mask)
    }
}

impl Default for StencilFunc {
    fn default() -> Self {
        Self::always(0)
    }
}

/// Stencil operations for (stencil fail, depth fail, depth pass)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StencilOps {
    pub fail: StencilOperation,
    pub depth_fail: StencilOperation,
    pub pass: StencilOperation,
}

impl StencilOps {
    pub fn uniform(op: StencilOperation) -> Self {
        Self {
            fail: op,
            depth_fail: op,
            pass: op,
        }
    }

    pub fn keep() -> Self {
        Self::uniform(StencilOperation::Keep)
    }

    pub fn replace() -> Self {
        Self::uniform(StencilOperation::Replace)
    }
}

/// Snapshot of the device's fixed-function write/stencil state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilState {
    pub color_write: bool,
    pub depth_write: bool,
    pub test_enabled: bool,
    pub func: StencilFunc,
    pub ops: StencilOps,
    pub clear_value: u32,
}

impl Default for StencilState {
    fn default() -> Self {
        Self {
            color_write: true,
            depth_write: true,
            test_enabled: false,
            func: StencilFunc::default(),
            ops: StencilOps::default(),
            clear_value: 0,
        }
    }
}

/// Render target descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    pub label: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    /// Whether the target carries its own depth attachment.
    pub depth_buffer: bool,
    /// Whether the target carries its own stencil attachment. Masking uses the
    /// device's shared depth-stencil attachment, so composer targets leave this off.
    pub stencil_buffer: bool,
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            label: None,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            min_filter: FilterMode::Linear,
            mag_filter: FilterMode::Linear,
            depth_buffer: false,
            stencil_buffer: false,
        }
    }
}

impl RenderTargetDescriptor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_format(mut self, format: TextureFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_filters(mut self, min_filter: FilterMode, mag_filter: FilterMode) -> Self {
        self.min_filter = min_filter;
        self.mag_filter = mag_filter;
        self
    }

    pub fn with_stencil_buffer(mut self, enabled: bool) -> Self {
        self.stencil_buffer = enabled;
        self
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_pixel() as u64
    }
}
