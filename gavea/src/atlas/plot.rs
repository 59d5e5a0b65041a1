use super::AtlasConfig;
use crate::gpu::{DrawToken, PixelFormat, TextureId, TextureProvider, TokenTracker, UploadFlags};
use crate::packer::RectPacker;

/// Plot-local region awaiting upload. Right/bottom exclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct DirtyRect {
    left: u16,
    top: u16,
    right: u16,
    bottom: u16,
}

impl DirtyRect {
    fn join(&mut self, x: u16, y: u16, width: u16, height: u16) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x + width);
        self.bottom = self.bottom.max(y + height);
    }
}

/// One fixed cell of an atlas texture, with its own packer.
///
/// In batched mode placed pixels land in a CPU shadow of the cell and
/// the dirty region is flushed once per frame by `upload_to_texture`.
/// Once the cell is nearly full the shadow is dropped and later
/// placements upload straight to the texture.
pub struct Plot {
    index: u16,
    offset: (u16, u16),
    format: PixelFormat,
    packer: RectPacker,
    dirty: Option<DirtyRect>,
    shadow: Option<Vec<u8>>,
    batch_uploads: bool,
    nearly_full_ratio: f32,
    texture: Option<TextureId>,
    last_read: Option<DrawToken>,
}

impl Plot {
    pub(crate) fn new(
        index: u16,
        offset: (u16, u16),
        format: PixelFormat,
        config: &AtlasConfig,
    ) -> Self {
        Self {
            index,
            offset,
            format,
            packer: RectPacker::new(config.packer, config.plot_width(), config.plot_height()),
            dirty: None,
            shadow: None,
            batch_uploads: config.batch_uploads,
            nearly_full_ratio: config.nearly_full_ratio,
            texture: None,
            last_read: None,
        }
    }

    #[inline]
    pub fn index(&self) -> u16 {
        self.index
    }

    /// Pixel offset of this cell in the backing texture.
    #[inline]
    pub fn offset(&self) -> (u16, u16) {
        self.offset
    }

    #[inline]
    pub fn percent_full(&self) -> f32 {
        self.packer.percent_full()
    }

    pub(crate) fn set_texture(&mut self, texture: TextureId) {
        self.texture = Some(texture);
    }

    pub(crate) fn set_last_read(&mut self, token: DrawToken) {
        self.last_read = Some(token);
    }

    /// True when no in-flight draw still reads this cell. A cell that
    /// was never read counts as retired.
    pub(crate) fn last_read_retired(&self, tokens: &dyn TokenTracker) -> bool {
        self.last_read.is_none_or(|token| tokens.is_retired(token))
    }

    /// Places a `width` x `height` pixel block and returns its
    /// top-left in the backing texture, or `None` when the cell has
    /// no room. A failed placement changes nothing.
    pub(crate) fn add_sub_image(
        &mut self,
        width: u16,
        height: u16,
        pixels: &[u8],
        gpu: &mut dyn TextureProvider,
    ) -> Option<(u16, u16)> {
        let bpp = self.format.bytes_per_pixel();
        let row_len = width as usize * bpp;
        debug_assert_eq!(pixels.len(), row_len * height as usize);

        let was_empty = self.packer.percent_full() == 0.0;
        let (x, y) = self.packer.add_rect(width, height)?;

        // The shadow is allocated on the first placement into a fresh
        // or recycled cell, never eagerly for all of them.
        if self.batch_uploads && self.shadow.is_none() && was_empty {
            let size =
                self.packer.width() as usize * self.packer.height() as usize * bpp;
            self.shadow = Some(vec![0; size]);
        }

        if let Some(shadow) = &mut self.shadow {
            // Copy rows into the shadow at the packer-local slot.
            let pitch = self.packer.width() as usize * bpp;
            let mut start = y as usize * pitch + x as usize * bpp;
            for row in pixels.chunks_exact(row_len) {
                shadow[start..start + row_len].copy_from_slice(row);
                start += pitch;
            }
            match &mut self.dirty {
                Some(dirty) => dirty.join(x, y, width, height),
                None => {
                    self.dirty = Some(DirtyRect {
                        left: x,
                        top: y,
                        right: x + width,
                        bottom: y + height,
                    })
                }
            }
        } else {
            // No shadow: push the pixels straight to the texture.
            debug_assert!(self.texture.is_some());
            if let Some(texture) = self.texture {
                gpu.upload_pixels(
                    texture,
                    self.offset.0 + x,
                    self.offset.1 + y,
                    width,
                    height,
                    self.format,
                    pixels,
                    row_len,
                    UploadFlags::DONT_FLUSH,
                );
            }
        }

        Some((self.offset.0 + x, self.offset.1 + y))
    }

    /// Flushes the dirty region from the shadow to the texture, then
    /// drops the shadow once the cell is nearly full — from there on
    /// placements upload directly.
    pub(crate) fn upload_to_texture(&mut self, gpu: &mut dyn TextureProvider) {
        debug_assert!(self.batch_uploads);
        let Some(dirty) = self.dirty.take() else {
            return;
        };
        let Some(shadow) = self.shadow.as_deref() else {
            debug_assert!(false, "dirty region without a shadow buffer");
            return;
        };
        let Some(texture) = self.texture else {
            debug_assert!(false, "dirty region without a backing texture");
            return;
        };

        let bpp = self.format.bytes_per_pixel();
        let pitch = self.packer.width() as usize * bpp;
        let width = dirty.right - dirty.left;
        let height = dirty.bottom - dirty.top;
        let start = dirty.top as usize * pitch + dirty.left as usize * bpp;
        let end = start + (height as usize - 1) * pitch + width as usize * bpp;
        gpu.upload_pixels(
            texture,
            self.offset.0 + dirty.left,
            self.offset.1 + dirty.top,
            width,
            height,
            self.format,
            &shadow[start..end],
            pitch,
            UploadFlags::DONT_FLUSH,
        );

        if self.percent_full() > self.nearly_full_ratio {
            tracing::debug!(plot = self.index, "plot nearly full, dropping shadow");
            self.shadow = None;
        }
    }

    /// Recycles the cell: only the packer forgets its placements.
    /// Shadow bytes, the dirty region and the stamped draw token stay
    /// as they are; new placements overwrite regions as they re-pack.
    pub(crate) fn reset_rects(&mut self) {
        self.packer.reset();
    }
}
