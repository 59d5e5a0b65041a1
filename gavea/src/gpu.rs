use bitflags::bitflags;

/// Identifier for a texture in GPU memory.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct TextureId(pub u64);

/// Pixel encoding of a backing texture.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum PixelFormat {
    A8,
    Rgb565,
    Rgba8,
}

impl PixelFormat {
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::A8 => 1,
            Self::Rgb565 => 2,
            Self::Rgba8 => 4,
        }
    }
}

bitflags! {
    /// Flags qualifying a pixel upload.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
    pub struct UploadFlags: u8 {
        /// The upload happens mid-frame and must not force a flush of
        /// pending draws.
        const DONT_FLUSH = 1 << 0;
    }
}

/// Point in the issued stream of draws, stamped on a plot whenever a
/// draw reads its content.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Debug, Default)]
pub struct DrawToken(pub u64);

/// Texture storage owned by the renderer.
///
/// The cache never talks to a GPU itself; it asks this collaborator to
/// create backing textures and to copy pixel regions into them.
pub trait TextureProvider {
    /// Creates a texture, or `None` when the allocation fails.
    fn create_texture(
        &mut self,
        width: u16,
        height: u16,
        format: PixelFormat,
    ) -> Option<TextureId>;

    /// Copies a region of pixels into `texture` at (`x`, `y`). `data`
    /// holds `height` rows of `width` pixels, each row `row_bytes`
    /// bytes apart.
    #[allow(clippy::too_many_arguments)]
    fn upload_pixels(
        &mut self,
        texture: TextureId,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        format: PixelFormat,
        data: &[u8],
        row_bytes: usize,
        flags: UploadFlags,
    );

    /// Releases a texture previously returned by `create_texture`.
    fn delete_texture(&mut self, texture: TextureId);
}

/// Tracks which draw tokens the GPU has retired.
///
/// The cache only ever polls; it never blocks on in-flight work.
pub trait TokenTracker {
    /// True when the draw that stamped `token` has completed.
    fn is_retired(&self, token: DrawToken) -> bool;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub(crate) struct UploadRecord {
        pub texture: TextureId,
        pub x: u16,
        pub y: u16,
        pub width: u16,
        pub height: u16,
        pub format: PixelFormat,
        /// Region rows, compacted to `width * bpp` each.
        pub data: Vec<u8>,
        pub flags: UploadFlags,
    }

    /// Provider that records every call for assertions.
    #[derive(Default)]
    pub(crate) struct RecordingGpu {
        next_texture: u64,
        pub fail_create: bool,
        pub created: Vec<(TextureId, u16, u16, PixelFormat)>,
        pub deleted: Vec<TextureId>,
        pub uploads: Vec<UploadRecord>,
    }

    impl TextureProvider for RecordingGpu {
        fn create_texture(
            &mut self,
            width: u16,
            height: u16,
            format: PixelFormat,
        ) -> Option<TextureId> {
            if self.fail_create {
                return None;
            }
            self.next_texture += 1;
            let id = TextureId(self.next_texture);
            self.created.push((id, width, height, format));
            Some(id)
        }

        fn upload_pixels(
            &mut self,
            texture: TextureId,
            x: u16,
            y: u16,
            width: u16,
            height: u16,
            format: PixelFormat,
            data: &[u8],
            row_bytes: usize,
            flags: UploadFlags,
        ) {
            let row_len = width as usize * format.bytes_per_pixel();
            let mut compact = Vec::with_capacity(row_len * height as usize);
            for row in 0..height as usize {
                let start = row * row_bytes;
                compact.extend_from_slice(&data[start..start + row_len]);
            }
            self.uploads.push(UploadRecord {
                texture,
                x,
                y,
                width,
                height,
                format,
                data: compact,
                flags,
            });
        }

        fn delete_texture(&mut self, texture: TextureId) {
            self.deleted.push(texture);
        }
    }

    /// Tracker that retires every token up to a settable horizon.
    #[derive(Default)]
    pub(crate) struct ManualTokens {
        pub retired_up_to: u64,
    }

    impl TokenTracker for ManualTokens {
        fn is_retired(&self, token: DrawToken) -> bool {
            token.0 <= self.retired_up_to
        }
    }
}
