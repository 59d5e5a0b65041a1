use crate::glyph::{GlyphBounds, MaskFormat, PackedGlyph};

/// Identity of a scaler configuration; one strike exists per key.
///
/// The fields are opaque to the cache. Collaborators decide what a
/// font id or the flag bits mean (hinting, style, transform hash).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ScalerKey {
    pub font_id: u64,
    /// Font size quantized by the scaler, e.g. to whole pixels.
    pub quant_size: u16,
    pub flags: u16,
}

/// Produces glyph metrics and rasterized masks for one scaler
/// configuration.
///
/// The cache owns no font machinery; everything it knows about a
/// glyph's pixels comes through this trait.
pub trait FontScaler {
    /// Key identifying this configuration.
    fn key(&self) -> ScalerKey;

    /// Style-appropriate bounds for the glyph, or `None` when the
    /// glyph cannot be produced.
    fn glyph_bounds(&mut self, packed: PackedGlyph) -> Option<GlyphBounds>;

    /// Mask format the glyph rasterizes to.
    fn mask_format(&self, packed: PackedGlyph) -> MaskFormat;

    /// Rasterizes the glyph into `out` (cleared by the caller) as
    /// `width * height` tightly packed pixels. Returns false when
    /// rasterization fails.
    fn rasterize(&mut self, packed: PackedGlyph, width: u16, height: u16, out: &mut Vec<u8>)
        -> bool;
}
