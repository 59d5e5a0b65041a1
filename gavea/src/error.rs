use crate::glyph::MaskFormat;
use thiserror::Error;

/// Errors surfaced by atlas placement and the strike cache.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// Every plot of the atlas rejected the sub-image. This is the
    /// expected miss: recycle a plot with
    /// [`FontCache::free_unused_plot`](crate::cache::FontCache::free_unused_plot)
    /// and retry, or fall back to a direct draw path.
    #[error("atlas for {format:?} has no room for a {width}x{height} sub-image")]
    AtlasFull {
        format: MaskFormat,
        width: u16,
        height: u16,
    },

    /// The mask can never fit a plot, even after eviction.
    #[error("{width}x{height} mask exceeds the {max_width}x{max_height} plot")]
    GlyphTooLarge {
        width: u16,
        height: u16,
        max_width: u16,
        max_height: u16,
    },

    /// The provider could not allocate the backing texture. Hard
    /// failure for this mask format; the caller decides whether to
    /// stop atlas rendering for it.
    #[error("backing texture allocation failed for {0:?}")]
    TextureCreate(MaskFormat),

    /// The scaler produced no bounds or no bitmap for the glyph.
    #[error("glyph rasterization failed")]
    Raster,
}

pub type Result<T> = std::result::Result<T, CacheError>;
