/// Minimum row height, so tiny masks share rows instead of each
/// spawning a one-pixel strip.
const MIN_ROW_HEIGHT: u32 = 2;

/// One open row per power-of-two height, 2 through 2^15.
const NUM_ROWS: usize = 15;

/// Rectangle packer that groups placements into rows of power-of-two
/// height.
///
/// Each height bucket keeps at most one open row. Rows are carved top
/// to bottom from the remaining vertical space; when an open row runs
/// out of width, a fresh strip of the same height replaces it and the
/// tail of the old row is wasted.
#[derive(Debug, Clone)]
pub struct Pow2Packer {
    width: u16,
    height: u16,
    rows: [Row; NUM_ROWS],
    next_strip_y: u16,
    area_so_far: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct Row {
    x: u16,
    y: u16,
    height: u16, // 0 while the bucket has no open row
}

impl Pow2Packer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            rows: [Row::default(); NUM_ROWS],
            next_strip_y: 0,
            area_so_far: 0,
        }
    }

    pub fn add_rect(&mut self, width: u16, height: u16) -> Option<(u16, u16)> {
        debug_assert!(width > 0 && height > 0);
        if width > self.width || height > self.height {
            return None;
        }

        // Fullness tracks the requested area, not the rounded row.
        let area = width as u32 * height as u32;

        let row_height = (height as u32).next_power_of_two().max(MIN_ROW_HEIGHT);
        if row_height > self.height as u32 {
            return None;
        }
        let bucket = (row_height.trailing_zeros() - 1) as usize;
        debug_assert!(bucket < NUM_ROWS);

        let open = self.rows[bucket];
        if open.height == 0 || open.x as u32 + width as u32 > self.width as u32 {
            // Carve a fresh strip for this bucket.
            if self.next_strip_y as u32 + row_height > self.height as u32 {
                return None;
            }
            self.rows[bucket] = Row {
                x: 0,
                y: self.next_strip_y,
                height: row_height as u16,
            };
            self.next_strip_y += row_height as u16;
        }

        let row = &mut self.rows[bucket];
        let location = (row.x, row.y);
        row.x += width;
        self.area_so_far += area;
        Some(location)
    }

    pub fn percent_full(&self) -> f32 {
        self.area_so_far as f32 / (self.width as f32 * self.height as f32)
    }

    pub fn reset(&mut self) {
        self.rows = [Row::default(); NUM_ROWS];
        self.next_strip_y = 0;
        self.area_so_far = 0;
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }
}
