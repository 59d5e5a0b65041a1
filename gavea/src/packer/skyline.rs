/// Rectangle packer that maintains a skyline of placed rectangles.
///
/// The skyline is the upper contour of everything placed so far, kept
/// as left-to-right segments that jointly span the full region width.
/// Each insert picks the lowest fitting position (ties go to the
/// narrowest segment), then folds the rectangle's top edge back into
/// the contour.
#[derive(Debug, Clone)]
pub struct SkylinePacker {
    width: u16,
    height: u16,
    skyline: Vec<Segment>,
    area_so_far: u32,
}

/// One segment of the contour.
#[derive(Debug, Clone, Copy)]
struct Segment {
    x: u16,
    y: u16,
    width: u16,
}

impl SkylinePacker {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            skyline: vec![Segment { x: 0, y: 0, width }],
            area_so_far: 0,
        }
    }

    pub fn add_rect(&mut self, width: u16, height: u16) -> Option<(u16, u16)> {
        debug_assert!(width > 0 && height > 0);

        // (segment index, y, segment width)
        let mut best: Option<(usize, u16, u16)> = None;
        for index in 0..self.skyline.len() {
            if let Some(y) = self.fits_at(index, width, height) {
                let segment_width = self.skyline[index].width;
                let better = match best {
                    None => true,
                    Some((_, best_y, best_width)) => {
                        y < best_y || (y == best_y && segment_width < best_width)
                    }
                };
                if better {
                    best = Some((index, y, segment_width));
                }
            }
        }

        let (index, y, _) = best?;
        let x = self.skyline[index].x;
        self.insert_level(index, x, y, width, height);
        self.area_so_far += width as u32 * height as u32;
        Some((x, y))
    }

    /// Lowest y at which the rectangle fits with its left edge at
    /// segment `index`, if it fits at all.
    fn fits_at(&self, index: usize, width: u16, height: u16) -> Option<u16> {
        let x = self.skyline[index].x;
        if x as u32 + width as u32 > self.width as u32 {
            return None;
        }

        // The contour spans the full region width, so this walk always
        // consumes `width` before running off the end.
        let mut remaining = width as i32;
        let mut i = index;
        let mut y = 0u16;
        while remaining > 0 {
            let segment = self.skyline[i];
            y = y.max(segment.y);
            if y as u32 + height as u32 > self.height as u32 {
                return None;
            }
            remaining -= segment.width as i32;
            i += 1;
        }
        Some(y)
    }

    /// Replaces the contour over `[x, x + width)` with a segment at
    /// `y + height`, shrinking or swallowing whatever it overlaps.
    fn insert_level(&mut self, index: usize, x: u16, y: u16, width: u16, height: u16) {
        self.skyline.insert(
            index,
            Segment {
                x,
                y: y + height,
                width,
            },
        );

        let mut i = index + 1;
        while i < self.skyline.len() {
            let previous = self.skyline[i - 1];
            let previous_right = previous.x + previous.width;
            let segment = self.skyline[i];
            if segment.x >= previous_right {
                break;
            }
            let shrink = previous_right - segment.x;
            if segment.width <= shrink {
                self.skyline.remove(i);
            } else {
                let segment = &mut self.skyline[i];
                segment.x += shrink;
                segment.width -= shrink;
                break;
            }
        }

        // Merge runs of equal height back into single segments.
        let mut i = 0;
        while i + 1 < self.skyline.len() {
            if self.skyline[i].y == self.skyline[i + 1].y {
                self.skyline[i].width += self.skyline[i + 1].width;
                self.skyline.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    pub fn percent_full(&self) -> f32 {
        self.area_so_far as f32 / (self.width as f32 * self.height as f32)
    }

    pub fn reset(&mut self) {
        self.skyline.clear();
        self.skyline.push(Segment {
            x: 0,
            y: 0,
            width: self.width,
        });
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
