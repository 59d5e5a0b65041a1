mod pow2;
mod skyline;

pub use pow2::Pow2Packer;
pub use skyline::SkylinePacker;

/// Packing strategy for a plot's rectangle packer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackerKind {
    /// Rows bucketed by power-of-two height. Cheap inserts, coarse
    /// packing.
    Pow2Rows,
    /// Skyline contour. Slower per insert, tighter packing.
    #[default]
    Skyline,
}

/// Online rectangle packer over a fixed region.
///
/// Rectangles are placed once and never moved or individually
/// removed; the only way space comes back is a full [`reset`].
///
/// [`reset`]: RectPacker::reset
#[derive(Debug, Clone)]
pub enum RectPacker {
    Pow2Rows(Pow2Packer),
    Skyline(SkylinePacker),
}

impl RectPacker {
    pub fn new(kind: PackerKind, width: u16, height: u16) -> Self {
        match kind {
            PackerKind::Pow2Rows => Self::Pow2Rows(Pow2Packer::new(width, height)),
            PackerKind::Skyline => Self::Skyline(SkylinePacker::new(width, height)),
        }
    }

    /// Places a `width` x `height` rectangle and returns its top-left
    /// corner. A failed placement leaves the packer untouched.
    #[inline]
    pub fn add_rect(&mut self, width: u16, height: u16) -> Option<(u16, u16)> {
        match self {
            Self::Pow2Rows(packer) => packer.add_rect(width, height),
            Self::Skyline(packer) => packer.add_rect(width, height),
        }
    }

    /// Fraction of the region covered by placed rectangles.
    #[inline]
    pub fn percent_full(&self) -> f32 {
        match self {
            Self::Pow2Rows(packer) => packer.percent_full(),
            Self::Skyline(packer) => packer.percent_full(),
        }
    }

    /// Forgets every placement.
    pub fn reset(&mut self) {
        match self {
            Self::Pow2Rows(packer) => packer.reset(),
            Self::Skyline(packer) => packer.reset(),
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        match self {
            Self::Pow2Rows(packer) => packer.width(),
            Self::Skyline(packer) => packer.width(),
        }
    }

    #[inline]
    pub fn height(&self) -> u16 {
        match self {
            Self::Pow2Rows(packer) => packer.height(),
            Self::Skyline(packer) => packer.height(),
        }
    }
}
