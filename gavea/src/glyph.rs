use crate::atlas::PlotId;
use crate::gpu::PixelFormat;

/// Pixel encoding of a rasterized glyph mask.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum MaskFormat {
    /// 8-bit coverage.
    A8,
    /// 16-bit color, 5-6-5.
    Rgb565,
    /// 32-bit color with alpha.
    Rgba8,
}

impl MaskFormat {
    pub const COUNT: usize = 3;

    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 => 1,
            Self::Rgb565 => 2,
            Self::Rgba8 => 4,
        }
    }

    /// Pixel format of the backing texture for this mask format.
    #[inline]
    pub fn pixel_format(self) -> PixelFormat {
        match self {
            Self::A8 => PixelFormat::A8,
            Self::Rgb565 => PixelFormat::Rgb565,
            Self::Rgba8 => PixelFormat::Rgba8,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Self::A8 => 0,
            Self::Rgb565 => 1,
            Self::Rgba8 => 2,
        }
    }

    pub(crate) fn from_index(index: usize) -> Self {
        match index {
            0 => Self::A8,
            1 => Self::Rgb565,
            _ => Self::Rgba8,
        }
    }
}

/// How a mask's pixels are interpreted by the sampler.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MaskStyle {
    /// Plain coverage or color values.
    Coverage,
    /// Signed distance field.
    DistanceField,
}

/// Padding baked into each side of a distance field mask.
pub const DISTANCE_FIELD_PAD: u16 = 4;

const STYLE_BIT: u32 = 1 << 20;
const SUBPIXEL_X_SHIFT: u32 = 18;
const SUBPIXEL_Y_SHIFT: u32 = 16;
const SUBPIXEL_MASK: u32 = 0b11;

/// Identity of a rendered glyph within a strike: a 16-bit glyph id,
/// two bits of sub-pixel position per axis and a mask style bit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PackedGlyph(u32);

impl PackedGlyph {
    /// Packs a glyph id with its quantized fractional pixel position.
    pub fn pack(glyph_id: u16, x: f32, y: f32, style: MaskStyle) -> Self {
        let mut bits = glyph_id as u32;
        bits |= quantize(x) << SUBPIXEL_X_SHIFT;
        bits |= quantize(y) << SUBPIXEL_Y_SHIFT;
        if style == MaskStyle::DistanceField {
            bits |= STYLE_BIT;
        }
        Self(bits)
    }

    #[inline]
    pub fn glyph_id(self) -> u16 {
        self.0 as u16
    }

    #[inline]
    pub fn subpixel_x(self) -> u8 {
        ((self.0 >> SUBPIXEL_X_SHIFT) & SUBPIXEL_MASK) as u8
    }

    #[inline]
    pub fn subpixel_y(self) -> u8 {
        ((self.0 >> SUBPIXEL_Y_SHIFT) & SUBPIXEL_MASK) as u8
    }

    #[inline]
    pub fn mask_style(self) -> MaskStyle {
        if self.0 & STYLE_BIT != 0 {
            MaskStyle::DistanceField
        } else {
            MaskStyle::Coverage
        }
    }
}

/// Four sub-pixel steps: the two most significant bits of the
/// fractional position.
fn quantize(position: f32) -> u32 {
    let fraction = position - position.floor();
    ((fraction * 4.0) as u32) & SUBPIXEL_MASK
}

/// Placement metrics reported by a scaler for one glyph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBounds {
    /// Left bearing, in pixels.
    pub left: i32,
    /// Top bearing, in pixels.
    pub top: i32,
    pub width: u16,
    pub height: u16,
}

/// Cached glyph record.
///
/// `plot` describes residency: `None` until the mask is placed into
/// an atlas, and `None` again after its plot is recycled. The same
/// record can go through any number of place/evict rounds.
#[derive(Clone, Debug)]
pub struct Glyph {
    packed: PackedGlyph,
    /// Left bearing, in pixels.
    pub left: i32,
    /// Top bearing, in pixels.
    pub top: i32,
    pub width: u16,
    pub height: u16,
    pub mask_format: MaskFormat,
    pub(crate) plot: Option<PlotId>,
    pub(crate) atlas_location: (u16, u16),
}

impl Glyph {
    pub(crate) fn new(packed: PackedGlyph, bounds: GlyphBounds, mask_format: MaskFormat) -> Self {
        Self {
            packed,
            left: bounds.left,
            top: bounds.top,
            width: bounds.width,
            height: bounds.height,
            mask_format,
            plot: None,
            atlas_location: (0, 0),
        }
    }

    #[inline]
    pub fn packed(&self) -> PackedGlyph {
        self.packed
    }

    /// Plot holding this glyph's mask, while resident.
    #[inline]
    pub fn plot(&self) -> Option<PlotId> {
        self.plot
    }

    /// Absolute top-left of the mask in the backing texture. Only
    /// meaningful while [`plot`](Self::plot) is `Some`.
    #[inline]
    pub fn atlas_location(&self) -> (u16, u16) {
        self.atlas_location
    }
}
