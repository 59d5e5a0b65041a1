use crate::atlas::{Atlas, AtlasConfig, PlotId};
use crate::error::CacheError;
use crate::glyph::{Glyph, MaskFormat, MaskStyle, PackedGlyph, DISTANCE_FIELD_PAD};
use crate::gpu::{DrawToken, TextureId, TextureProvider, TokenTracker};
use crate::scaler::{FontScaler, ScalerKey};
use crate::strike::Strike;
use lru::LruCache;

/// Top-level glyph cache: one strike per scaler configuration, one
/// atlas per mask format.
///
/// The cache owns no GPU resources and no scalers. Both come in as
/// arguments on the calls that need them, so a renderer can thread its
/// own device and font stack through without the cache taking a
/// dependency on either.
pub struct FontCache {
    strikes: LruCache<ScalerKey, Strike>,
    atlases: [Option<Atlas>; MaskFormat::COUNT],
    config: AtlasConfig,
    scratch: Vec<u8>,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FontCache {
    pub fn new() -> Self {
        Self::with_config(AtlasConfig::default())
    }

    pub fn with_config(config: AtlasConfig) -> Self {
        debug_assert!(config.plots_x > 0 && config.plots_y > 0);
        Self {
            strikes: LruCache::unbounded(),
            atlases: [None, None, None],
            config,
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Strike for `scaler`, created on first sight. Returns the key
    /// the other calls take; looking it up again promotes the strike.
    pub fn get_strike(&mut self, scaler: &dyn FontScaler) -> ScalerKey {
        let key = scaler.key();
        if self.strikes.get(&key).is_none() {
            tracing::debug!(font_id = key.font_id, size = key.quant_size, "new strike");
            self.strikes.put(key, Strike::new());
        }
        key
    }

    /// Strike lookup that does not disturb the LRU order.
    #[inline]
    pub fn strike(&self, key: ScalerKey) -> Option<&Strike> {
        self.strikes.peek(&key)
    }

    #[inline]
    pub fn strike_count(&self) -> usize {
        self.strikes.len()
    }

    /// Glyph record for `packed`, measured on first sight. `None` for
    /// empty glyphs or when no strike exists for `key`.
    pub fn get_glyph(
        &mut self,
        key: ScalerKey,
        packed: PackedGlyph,
        scaler: &mut dyn FontScaler,
    ) -> Option<&Glyph> {
        self.strikes
            .peek_mut(&key)?
            .get_or_create_glyph(packed, scaler)
            .map(|glyph| &*glyph)
    }

    /// Rasterizes `packed` and places its mask in the atlas for the
    /// glyph's format, creating texture and record as needed.
    ///
    /// [`CacheError::AtlasFull`] is the expected steady-state miss:
    /// recycle a plot with [`free_unused_plot`](Self::free_unused_plot)
    /// and call again.
    pub fn add_glyph_to_atlas(
        &mut self,
        key: ScalerKey,
        packed: PackedGlyph,
        scaler: &mut dyn FontScaler,
        gpu: &mut dyn TextureProvider,
    ) -> Result<(), CacheError> {
        let Self {
            strikes,
            atlases,
            config,
            scratch,
        } = self;
        let strike = strikes.get_or_insert_mut(key, Strike::new);
        let Some(glyph) = strike.get_or_create_glyph(packed, scaler) else {
            return Err(CacheError::Raster);
        };
        if glyph.plot().is_some() {
            debug_assert!(false, "glyph is already resident");
            return Ok(());
        }
        if let Some(err) = oversize_error(config, glyph) {
            tracing::warn!(
                glyph = packed.glyph_id(),
                width = glyph.width,
                height = glyph.height,
                "glyph mask larger than a plot"
            );
            return Err(err);
        }

        let format = glyph.mask_format;
        let atlas =
            atlases[format.index()].get_or_insert_with(|| Atlas::new(format, config));
        strike.add_glyph_to_atlas(packed, scaler, atlas, scratch, gpu)
    }

    /// True when the mask can never fit a plot and the caller must
    /// draw it through some other path.
    pub fn glyph_too_large_for_atlas(&self, glyph: &Glyph) -> bool {
        oversize_error(&self.config, glyph).is_some()
    }

    /// Recycles the least recently used plot of `format`'s atlas that
    /// no in-flight draw still reads, clearing residency of every
    /// glyph that lived there. Strikes left without any plot are
    /// purged, except the one behind `preserve`.
    ///
    /// Returns false when there is no atlas yet or every plot is
    /// pinned; the caller may flush the GPU and try again.
    pub fn free_unused_plot(
        &mut self,
        preserve: ScalerKey,
        format: MaskFormat,
        tokens: &dyn TokenTracker,
    ) -> bool {
        let Some(atlas) = self.atlases[format.index()].as_mut() else {
            return false;
        };
        let Some(index) = atlas.unused_plot(tokens) else {
            tracing::debug!(format = ?format, "all plots pinned by in-flight draws");
            return false;
        };
        atlas.reset_plot(index);
        let plot = PlotId::new(format, index);
        tracing::debug!(format = ?format, plot = index, "recycled plot");

        let mut emptied: Vec<ScalerKey> = Vec::new();
        for (key, strike) in self.strikes.iter_mut() {
            strike.remove_plot(plot);
            if strike.is_unused() && *key != preserve {
                emptied.push(*key);
            }
        }
        for key in emptied {
            self.strikes.pop(&key);
            tracing::debug!(font_id = key.font_id, "purged idle strike");
        }
        true
    }

    /// Flushes staged pixels of every atlas. Call once per frame,
    /// after placements and before drawing.
    pub fn update_textures(&mut self, gpu: &mut dyn TextureProvider) {
        for atlas in self.atlases.iter_mut().flatten() {
            atlas.upload_plots_to_texture(gpu);
        }
    }

    /// Stamps `token` on the plot a draw just sampled, pinning it
    /// until the token retires.
    pub fn mark_plot_read(&mut self, plot: PlotId, token: DrawToken) {
        let Some(atlas) = self.atlases[plot.format().index()].as_mut() else {
            debug_assert!(false, "read of a plot with no atlas");
            return;
        };
        atlas.mark_read(plot, token);
    }

    /// Texture backing `plot`, once created.
    pub fn plot_texture(&self, plot: PlotId) -> Option<TextureId> {
        self.atlases[plot.format().index()]
            .as_ref()
            .and_then(|atlas| atlas.texture())
    }

    #[inline]
    pub fn atlas(&self, format: MaskFormat) -> Option<&Atlas> {
        self.atlases[format.index()].as_ref()
    }

    /// Drops every strike and atlas and releases the backing textures.
    pub fn free_all(&mut self, gpu: &mut dyn TextureProvider) {
        self.strikes.clear();
        for slot in &mut self.atlases {
            if let Some(atlas) = slot.take() {
                if let Some(texture) = atlas.texture() {
                    gpu.delete_texture(texture);
                }
            }
        }
        tracing::debug!("font cache freed");
    }
}

/// A mask taller or wider than one plot can never be placed. Distance
/// fields also reserve their outset on each side.
fn oversize_error(config: &AtlasConfig, glyph: &Glyph) -> Option<CacheError> {
    let pad = match glyph.packed().mask_style() {
        MaskStyle::DistanceField => 2 * DISTANCE_FIELD_PAD as u32,
        MaskStyle::Coverage => 0,
    };
    let max_width = config.plot_width();
    let max_height = config.plot_height();
    if glyph.width as u32 + pad > max_width as u32
        || glyph.height as u32 + pad > max_height as u32
    {
        return Some(CacheError::GlyphTooLarge {
            width: glyph.width,
            height: glyph.height,
            max_width,
            max_height,
        });
    }
    None
}
