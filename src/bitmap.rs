// Binary pixel grid the tracer walks over.
// Cells are mutated in place while tracing (flip = "visited"), so a Bitmap
// belongs to exactly one trace pass.
use image::RgbaImage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    cells: Vec<bool>, // length = width * height, index = x + y * width
}

impl Bitmap {
    /// All-off bitmap.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![false; width * height] }
    }

    /// Build from a predicate evaluated at every (x, y).
    pub fn from_fn(width: usize, height: usize, mut on: impl FnMut(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(on(x, y));
            }
        }
        Self { width, height, cells }
    }

    /// Threshold an RGBA image: a pixel is "on" when it is visible
    /// (alpha above `alpha_threshold`) and darker than `luma_threshold`.
    pub fn from_luma(img: &RgbaImage, luma_threshold: u8, alpha_threshold: u8) -> Self {
        Self::from_fn(img.width() as usize, img.height() as usize, |x, y| {
            let [r, g, b, a] = img.get_pixel(x as u32, y as u32).0;
            // Rec. 601 weights, integer math
            let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
            a > alpha_threshold && luma < luma_threshold as u32
        })
    }

    /// Parse rows of `#` (on) and anything else (off). Handy for fixtures.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        Self::from_fn(width, height, |x, y| rows[y].as_bytes().get(x) == Some(&b'#'))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(x + y * self.width)
    }

    /// Out-of-range coordinates are never set.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.cells[i])
    }

    pub fn set(&mut self, x: i32, y: i32, on: bool) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = on;
        }
    }

    /// Toggle one cell; a no-op outside the grid.
    #[inline]
    pub fn flip(&mut self, x: i32, y: i32) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = !self.cells[i];
        }
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.cells.iter().any(|c| *c)
    }

    /// First "on" cell at or after linear index `from`, in row-major order.
    pub fn next_on(&self, from: usize) -> Option<(i32, i32)> {
        self.cells
            .iter()
            .skip(from)
            .position(|c| *c)
            .map(|offset| {
                let i = from + offset;
                ((i % self.width) as i32, (i / self.width) as i32)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn out_of_range_is_never_set() {
        let mut bm = Bitmap::new(2, 2);
        bm.set(-1, 0, true);
        bm.set(2, 0, true);
        bm.flip(0, 5);
        assert!(bm.is_empty());
        assert!(!bm.at(-1, -1));
        assert!(!bm.at(2, 1));
    }

    #[test]
    fn flip_toggles() {
        let mut bm = Bitmap::new(3, 1);
        bm.flip(1, 0);
        assert!(bm.at(1, 0));
        assert_eq!(bm.count(), 1);
        bm.flip(1, 0);
        assert!(!bm.at(1, 0));
    }

    #[test]
    fn next_on_scans_row_major() {
        let bm = Bitmap::from_ascii(&["....", "..#.", "#..."]);
        assert_eq!(bm.next_on(0), Some((2, 1)));
        assert_eq!(bm.next_on(7), Some((0, 2)));
        assert_eq!(bm.next_on(9), None);
    }

    #[test]
    fn luma_threshold_ignores_transparent_pixels() {
        let img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([0, 0, 0, 255]),
            1 => Rgba([0, 0, 0, 0]),
            _ => Rgba([255, 255, 255, 255]),
        });
        let bm = Bitmap::from_luma(&img, 128, 0);
        assert!(bm.at(0, 0));
        assert!(!bm.at(1, 0));
        assert!(!bm.at(2, 0));
    }
}
