mod plot;

pub use plot::Plot;

use crate::error::CacheError;
use crate::glyph::MaskFormat;
use crate::gpu::{DrawToken, TextureId, TextureProvider, TokenTracker};
use crate::packer::PackerKind;
use smallvec::SmallVec;

/// Atlas geometry and upload policy.
#[derive(Debug, Clone, Copy)]
pub struct AtlasConfig {
    pub texture_width: u16,
    pub texture_height: u16,
    /// Plot grid columns.
    pub plots_x: u16,
    /// Plot grid rows.
    pub plots_y: u16,
    /// Stage placements in CPU shadows and flush once per frame,
    /// instead of uploading every mask as it lands.
    pub batch_uploads: bool,
    /// Fullness past which a flushed plot drops its shadow buffer.
    pub nearly_full_ratio: f32,
    pub packer: PackerKind,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_width: 1024,
            texture_height: 2048,
            plots_x: 3,
            plots_y: 6,
            batch_uploads: true,
            nearly_full_ratio: 0.85,
            packer: PackerKind::default(),
        }
    }
}

impl AtlasConfig {
    #[inline]
    pub fn plot_width(&self) -> u16 {
        self.texture_width / self.plots_x
    }

    #[inline]
    pub fn plot_height(&self) -> u16 {
        self.texture_height / self.plots_y
    }

    fn plot_count(&self) -> u16 {
        self.plots_x * self.plots_y
    }
}

const PLOT_INDEX_MASK: u16 = 0x3FFF;
const PLOT_FORMAT_SHIFT: u16 = 14;

/// Handle to one plot of one atlas: the mask format in the top two
/// bits, the plot index below.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct PlotId(u16);

impl PlotId {
    pub(crate) fn new(format: MaskFormat, index: u16) -> Self {
        debug_assert_eq!(index & PLOT_INDEX_MASK, index);
        Self(((format.index() as u16) << PLOT_FORMAT_SHIFT) | index)
    }

    #[inline]
    pub fn format(self) -> MaskFormat {
        MaskFormat::from_index((self.0 >> PLOT_FORMAT_SHIFT) as usize)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.0 & PLOT_INDEX_MASK) as usize
    }
}

/// Plots a consumer has placed masks into, oldest first.
///
/// One consumer may hold plots of several atlases. Placement scans the
/// list newest-first before falling back to the atlas-wide walk, so a
/// consumer's masks cluster in the plots it already occupies.
#[derive(Default, Debug, Clone)]
pub struct PlotUsage {
    plots: SmallVec<[PlotId; 4]>,
}

impl PlotUsage {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.plots.len()
    }

    #[inline]
    pub fn contains(&self, plot: PlotId) -> bool {
        self.plots.contains(&plot)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = PlotId> + '_ {
        self.plots.iter().copied()
    }

    fn push(&mut self, plot: PlotId) {
        debug_assert!(!self.contains(plot));
        self.plots.push(plot);
    }

    /// Drops `plot` from the list, keeping append order intact.
    pub(crate) fn remove(&mut self, plot: PlotId) {
        if let Some(at) = self.plots.iter().position(|&p| p == plot) {
            self.plots.remove(at);
        }
    }
}

/// Index-linked MRU list over the plot arena: O(1) relink, no
/// allocation after construction.
#[derive(Debug)]
struct PlotList {
    head: Option<u16>,
    tail: Option<u16>,
    links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Link {
    prev: Option<u16>,
    next: Option<u16>,
}

impl PlotList {
    fn new(count: u16) -> Self {
        let links = (0..count)
            .map(|i| Link {
                prev: i.checked_sub(1),
                next: (i + 1 < count).then_some(i + 1),
            })
            .collect();
        Self {
            head: (count > 0).then_some(0),
            tail: count.checked_sub(1),
            links,
        }
    }

    fn unlink(&mut self, index: u16) {
        let Link { prev, next } = self.links[index as usize];
        match prev {
            Some(p) => self.links[p as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.links[n as usize].prev = prev,
            None => self.tail = prev,
        }
        self.links[index as usize] = Link::default();
    }

    fn make_head(&mut self, index: u16) {
        if self.head == Some(index) {
            return;
        }
        self.unlink(index);
        let old_head = self.head;
        self.links[index as usize] = Link {
            prev: None,
            next: old_head,
        };
        if let Some(o) = old_head {
            self.links[o as usize].prev = Some(index);
        }
        self.head = Some(index);
        debug_assert!(self.tail.is_some());
    }

    /// Plot indices, most recently used first.
    fn iter(&self) -> PlotIter<'_> {
        PlotIter {
            links: &self.links,
            cursor: self.head,
            forward: true,
        }
    }

    /// Plot indices, least recently used first.
    fn iter_lru(&self) -> PlotIter<'_> {
        PlotIter {
            links: &self.links,
            cursor: self.tail,
            forward: false,
        }
    }
}

struct PlotIter<'a> {
    links: &'a [Link],
    cursor: Option<u16>,
    forward: bool,
}

impl Iterator for PlotIter<'_> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let index = self.cursor?;
        let link = self.links[index as usize];
        self.cursor = if self.forward { link.next } else { link.prev };
        Some(index)
    }
}

/// Backing texture for one mask format, divided into a fixed grid of
/// plots recycled in LRU order.
///
/// The texture itself is created on the first placement, not up
/// front; an atlas that never sees a glyph costs no GPU memory.
pub struct Atlas {
    format: MaskFormat,
    texture: Option<TextureId>,
    texture_width: u16,
    texture_height: u16,
    plot_width: u16,
    plot_height: u16,
    batch_uploads: bool,
    plots: Vec<Plot>,
    mru: PlotList,
}

impl Atlas {
    pub fn new(format: MaskFormat, config: &AtlasConfig) -> Self {
        debug_assert!(config.plots_x > 0 && config.plots_y > 0);
        let count = config.plot_count();
        let mut plots = Vec::with_capacity(count as usize);
        for y in 0..config.plots_y {
            for x in 0..config.plots_x {
                plots.push(Plot::new(
                    y * config.plots_x + x,
                    (x * config.plot_width(), y * config.plot_height()),
                    format.pixel_format(),
                    config,
                ));
            }
        }
        Self {
            format,
            texture: None,
            texture_width: config.texture_width,
            texture_height: config.texture_height,
            plot_width: config.plot_width(),
            plot_height: config.plot_height(),
            batch_uploads: config.batch_uploads,
            plots,
            mru: PlotList::new(count),
        }
    }

    #[inline]
    pub fn format(&self) -> MaskFormat {
        self.format
    }

    /// Backing texture, once the first placement has created it.
    #[inline]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    #[inline]
    pub fn plot_width(&self) -> u16 {
        self.plot_width
    }

    #[inline]
    pub fn plot_height(&self) -> u16 {
        self.plot_height
    }

    /// Places a pixel block somewhere in the atlas.
    ///
    /// Plots the consumer already occupies are tried first, newest
    /// first, then every other plot in MRU order. On success the
    /// winning plot is made MRU and is guaranteed to be in `usage`.
    pub fn add_to_atlas(
        &mut self,
        usage: &mut PlotUsage,
        width: u16,
        height: u16,
        pixels: &[u8],
        gpu: &mut dyn TextureProvider,
    ) -> Result<(PlotId, (u16, u16)), CacheError> {
        let mut hit = None;
        for id in usage.iter().rev() {
            if id.format() != self.format {
                continue;
            }
            let index = id.index();
            if let Some(location) =
                self.plots[index].add_sub_image(width, height, pixels, gpu)
            {
                hit = Some((index as u16, location));
                break;
            }
        }

        if hit.is_none() {
            self.ensure_texture(gpu)?;
            for index in self.mru.iter() {
                let id = PlotId::new(self.format, index);
                if usage.contains(id) {
                    continue;
                }
                if let Some(location) =
                    self.plots[index as usize].add_sub_image(width, height, pixels, gpu)
                {
                    usage.push(id);
                    hit = Some((index, location));
                    break;
                }
            }
        }

        match hit {
            Some((index, location)) => {
                self.mru.make_head(index);
                Ok((PlotId::new(self.format, index), location))
            }
            None => Err(CacheError::AtlasFull {
                format: self.format,
                width,
                height,
            }),
        }
    }

    fn ensure_texture(&mut self, gpu: &mut dyn TextureProvider) -> Result<(), CacheError> {
        if self.texture.is_some() {
            return Ok(());
        }
        let pixel_format = self.format.pixel_format();
        let Some(texture) =
            gpu.create_texture(self.texture_width, self.texture_height, pixel_format)
        else {
            tracing::warn!(format = ?self.format, "backing texture allocation failed");
            return Err(CacheError::TextureCreate(self.format));
        };
        tracing::debug!(
            format = ?self.format,
            texture = texture.0,
            width = self.texture_width,
            height = self.texture_height,
            "created atlas texture"
        );
        for plot in &mut self.plots {
            plot.set_texture(texture);
        }
        self.texture = Some(texture);
        Ok(())
    }

    /// Least recently used plot that no in-flight draw still reads,
    /// or `None` when every plot is pinned by unretired work.
    pub fn unused_plot(&self, tokens: &dyn TokenTracker) -> Option<u16> {
        self.mru
            .iter_lru()
            .find(|&index| self.plots[index as usize].last_read_retired(tokens))
    }

    /// Recycles one plot's packer. Content already uploaded stays in
    /// the texture until new placements overwrite it.
    pub(crate) fn reset_plot(&mut self, index: u16) {
        self.plots[index as usize].reset_rects();
    }

    /// Flushes every plot's staged pixels. Call once per frame, after
    /// placements and before any draw samples the atlas.
    pub fn upload_plots_to_texture(&mut self, gpu: &mut dyn TextureProvider) {
        if !self.batch_uploads {
            return;
        }
        for index in self.mru.iter() {
            self.plots[index as usize].upload_to_texture(gpu);
        }
    }

    /// Stamps the draw token on a plot a draw just read.
    pub fn mark_read(&mut self, plot: PlotId, token: DrawToken) {
        debug_assert_eq!(plot.format(), self.format);
        self.plots[plot.index()].set_last_read(token);
    }

    pub(crate) fn plot(&self, index: u16) -> &Plot {
        &self.plots[index as usize]
    }
}
