extern crate criterion;
extern crate gavea;

use criterion::{criterion_group, criterion_main, Criterion};
use gavea::*;

struct NullGpu {
    next_texture: u64,
}

impl TextureProvider for NullGpu {
    fn create_texture(
        &mut self,
        _width: u16,
        _height: u16,
        _format: PixelFormat,
    ) -> Option<TextureId> {
        self.next_texture += 1;
        Some(TextureId(self.next_texture))
    }

    fn upload_pixels(
        &mut self,
        _texture: TextureId,
        _x: u16,
        _y: u16,
        _width: u16,
        _height: u16,
        _format: PixelFormat,
        _data: &[u8],
        _row_bytes: usize,
        _flags: UploadFlags,
    ) {
    }

    fn delete_texture(&mut self, _texture: TextureId) {}
}

struct AlwaysRetired;

impl TokenTracker for AlwaysRetired {
    fn is_retired(&self, _token: DrawToken) -> bool {
        true
    }
}

struct BenchScaler {
    key: ScalerKey,
}

impl FontScaler for BenchScaler {
    fn key(&self) -> ScalerKey {
        self.key
    }

    fn glyph_bounds(&mut self, packed: PackedGlyph) -> Option<GlyphBounds> {
        let size = 8 + (packed.glyph_id() % 24);
        Some(GlyphBounds {
            left: 0,
            top: 0,
            width: size,
            height: size,
        })
    }

    fn mask_format(&self, _packed: PackedGlyph) -> MaskFormat {
        MaskFormat::A8
    }

    fn rasterize(
        &mut self,
        _packed: PackedGlyph,
        width: u16,
        height: u16,
        out: &mut Vec<u8>,
    ) -> bool {
        out.resize(width as usize * height as usize, 0x7F);
        true
    }
}

fn next_size(seed: &mut u32) -> u16 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    (6 + (*seed >> 8) % 28) as u16
}

fn bench_packers(c: &mut Criterion) {
    for (kind, name) in [
        (PackerKind::Pow2Rows, "pow2_rows_fill"),
        (PackerKind::Skyline, "skyline_fill"),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut packer = RectPacker::new(kind, 341, 341);
                let mut seed = 0x2545_F491u32;
                let mut placed = 0u32;
                while packer
                    .add_rect(next_size(&mut seed), next_size(&mut seed))
                    .is_some()
                {
                    placed += 1;
                }
                placed
            })
        });
    }
}

fn bench_cache_fill_and_evict(c: &mut Criterion) {
    c.bench_function("cache_fill_and_evict", |b| {
        let mut gpu = NullGpu { next_texture: 0 };
        let tokens = AlwaysRetired;
        b.iter(|| {
            let mut cache = FontCache::new();
            let mut scaler = BenchScaler {
                key: ScalerKey {
                    font_id: 1,
                    quant_size: 14,
                    flags: 0,
                },
            };
            let key = cache.get_strike(&scaler);
            for id in 0..4000u16 {
                let packed = PackedGlyph::pack(id, 0.0, 0.0, MaskStyle::Coverage);
                loop {
                    match cache.add_glyph_to_atlas(key, packed, &mut scaler, &mut gpu) {
                        Ok(()) => break,
                        Err(CacheError::AtlasFull { .. }) => {
                            if !cache.free_unused_plot(key, MaskFormat::A8, &tokens) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            }
            cache.update_textures(&mut gpu);
            cache.strike_count()
        })
    });
}

criterion_group!(benches, bench_packers, bench_cache_fill_and_evict);
criterion_main!(benches);
