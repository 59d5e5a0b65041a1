pub mod atlas;
pub mod cache;
pub mod error;
pub mod glyph;
pub mod gpu;
pub mod packer;
pub mod scaler;
pub mod strike;

pub use crate::atlas::{Atlas, AtlasConfig, Plot, PlotId, PlotUsage};
pub use crate::cache::FontCache;
pub use crate::error::CacheError;
pub use crate::glyph::{
    Glyph, GlyphBounds, MaskFormat, MaskStyle, PackedGlyph, DISTANCE_FIELD_PAD,
};
pub use crate::gpu::{
    DrawToken, PixelFormat, TextureId, TextureProvider, TokenTracker, UploadFlags,
};
pub use crate::packer::{PackerKind, RectPacker};
pub use crate::scaler::{FontScaler, ScalerKey};
pub use crate::strike::Strike;
