use crate::atlas::{Atlas, PlotId, PlotUsage};
use crate::error::CacheError;
use crate::glyph::{Glyph, PackedGlyph};
use crate::gpu::TextureProvider;
use crate::scaler::FontScaler;
use rustc_hash::FxHashMap;

/// Glyph records for one scaler configuration.
///
/// Records are created lazily as glyphs are measured and live for the
/// strike's whole lifetime; only their atlas residency comes and goes
/// as plots are recycled.
pub struct Strike {
    glyphs: FxHashMap<PackedGlyph, Glyph>,
    plot_usage: PlotUsage,
}

impl Strike {
    pub(crate) fn new() -> Self {
        Self {
            glyphs: FxHashMap::default(),
            plot_usage: PlotUsage::new(),
        }
    }

    #[inline]
    pub fn glyph(&self, packed: PackedGlyph) -> Option<&Glyph> {
        self.glyphs.get(&packed)
    }

    /// Plots currently holding masks of this strike.
    #[inline]
    pub fn plot_usage(&self) -> &PlotUsage {
        &self.plot_usage
    }

    /// True when no plot holds a mask of this strike.
    #[inline]
    pub fn is_unused(&self) -> bool {
        self.plot_usage.is_empty()
    }

    #[inline]
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Looks up the record for `packed`, measuring the glyph on first
    /// sight. `None` means the scaler has no bounds for it (an empty
    /// glyph such as a space).
    pub(crate) fn get_or_create_glyph(
        &mut self,
        packed: PackedGlyph,
        scaler: &mut dyn FontScaler,
    ) -> Option<&mut Glyph> {
        if !self.glyphs.contains_key(&packed) {
            let bounds = scaler.glyph_bounds(packed)?;
            let format = scaler.mask_format(packed);
            self.glyphs
                .insert(packed, Glyph::new(packed, bounds, format));
        }
        self.glyphs.get_mut(&packed)
    }

    /// Rasterizes `packed` into `scratch` and places the mask in
    /// `atlas`. The record must exist and must not be resident.
    pub(crate) fn add_glyph_to_atlas(
        &mut self,
        packed: PackedGlyph,
        scaler: &mut dyn FontScaler,
        atlas: &mut Atlas,
        scratch: &mut Vec<u8>,
        gpu: &mut dyn TextureProvider,
    ) -> Result<(), CacheError> {
        let Self { glyphs, plot_usage } = self;
        let Some(glyph) = glyphs.get_mut(&packed) else {
            debug_assert!(false, "placement without a glyph record");
            return Err(CacheError::Raster);
        };
        debug_assert!(glyph.plot.is_none());

        scratch.clear();
        if !scaler.rasterize(packed, glyph.width, glyph.height, scratch) {
            return Err(CacheError::Raster);
        }
        debug_assert_eq!(
            scratch.len(),
            glyph.width as usize
                * glyph.height as usize
                * glyph.mask_format.bytes_per_pixel()
        );

        let (plot, location) =
            atlas.add_to_atlas(plot_usage, glyph.width, glyph.height, scratch, gpu)?;
        glyph.plot = Some(plot);
        glyph.atlas_location = location;
        Ok(())
    }

    /// Clears residency of every glyph sitting in `plot`. Called when
    /// the plot is recycled; the records themselves stay cached.
    pub(crate) fn remove_plot(&mut self, plot: PlotId) {
        for glyph in self.glyphs.values_mut() {
            if glyph.plot == Some(plot) {
                glyph.plot = None;
            }
        }
        self.plot_usage.remove(plot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::AtlasConfig;
    use crate::glyph::{MaskFormat, MaskStyle};
    use crate::gpu::testing::RecordingGpu;
    use crate::scaler::testing::StubScaler;

    fn small_atlas() -> Atlas {
        let config = AtlasConfig {
            texture_width: 64,
            texture_height: 64,
            plots_x: 2,
            plots_y: 2,
            ..AtlasConfig::default()
        };
        Atlas::new(MaskFormat::A8, &config)
    }

    fn packed(id: u16) -> PackedGlyph {
        PackedGlyph::pack(id, 0.0, 0.0, MaskStyle::Coverage)
    }

    #[test]
    fn test_records_created_on_first_lookup() {
        let mut scaler = StubScaler::new(1);
        let mut strike = Strike::new();

        let glyph = strike.get_or_create_glyph(packed(5), &mut scaler).unwrap();
        assert_eq!((glyph.width, glyph.height), (5, 5));
        assert_eq!((glyph.left, glyph.top), (1, -2));
        assert_eq!(glyph.plot(), None);
        assert_eq!(strike.glyph_count(), 1);

        // Second lookup reuses the record.
        strike.get_or_create_glyph(packed(5), &mut scaler).unwrap();
        assert_eq!(strike.glyph_count(), 1);

        // Empty glyphs have no record.
        assert!(strike.get_or_create_glyph(packed(0), &mut scaler).is_none());
        assert_eq!(strike.glyph_count(), 1);
    }

    #[test]
    fn test_placement_sets_residency() {
        let mut gpu = RecordingGpu::default();
        let mut scaler = StubScaler::new(1);
        let mut strike = Strike::new();
        let mut atlas = small_atlas();
        let mut scratch = Vec::new();

        strike.get_or_create_glyph(packed(8), &mut scaler).unwrap();
        strike
            .add_glyph_to_atlas(packed(8), &mut scaler, &mut atlas, &mut scratch, &mut gpu)
            .unwrap();

        let glyph = strike.glyph(packed(8)).unwrap();
        let plot = glyph.plot().unwrap();
        assert_eq!(plot.format(), MaskFormat::A8);
        assert_eq!(glyph.atlas_location(), (0, 0));
        assert!(strike.plot_usage().contains(plot));
        assert!(!strike.is_unused());
        assert_eq!(scratch, vec![8; 64]);
    }

    #[test]
    fn test_raster_failure_leaves_no_residency() {
        let mut gpu = RecordingGpu::default();
        let mut scaler = StubScaler::new(1);
        scaler.fail_raster = true;
        let mut strike = Strike::new();
        let mut atlas = small_atlas();
        let mut scratch = Vec::new();

        strike.get_or_create_glyph(packed(8), &mut scaler).unwrap();
        let err = strike
            .add_glyph_to_atlas(packed(8), &mut scaler, &mut atlas, &mut scratch, &mut gpu)
            .unwrap_err();
        assert_eq!(err, CacheError::Raster);
        assert_eq!(strike.glyph(packed(8)).unwrap().plot(), None);
        assert!(strike.is_unused());
        assert!(gpu.created.is_empty());
    }

    #[test]
    fn test_remove_plot_clears_back_references() {
        let mut gpu = RecordingGpu::default();
        let mut scaler = StubScaler::new(1);
        let mut strike = Strike::new();
        let mut atlas = small_atlas();
        let mut scratch = Vec::new();

        for id in [8, 10] {
            strike.get_or_create_glyph(packed(id), &mut scaler).unwrap();
            strike
                .add_glyph_to_atlas(packed(id), &mut scaler, &mut atlas, &mut scratch, &mut gpu)
                .unwrap();
        }

        // Both masks fit in the first plot.
        let plot = strike.glyph(packed(8)).unwrap().plot().unwrap();
        assert_eq!(strike.glyph(packed(10)).unwrap().plot(), Some(plot));
        assert_eq!(strike.plot_usage().len(), 1);

        strike.remove_plot(plot);
        assert_eq!(strike.glyph(packed(8)).unwrap().plot(), None);
        assert_eq!(strike.glyph(packed(10)).unwrap().plot(), None);
        assert!(strike.is_unused());
        // The records survive; only residency is gone.
        assert_eq!(strike.glyph_count(), 2);
    }
}
