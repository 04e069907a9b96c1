// Magic wand: pick everything that looks like the thing you clicked.
//
// Raster mode grows a 4-connected region from the clicked pixel.
// Vector mode picks every shape whose flat fill is close to the clicked one.
// Both read colors through small traits so the same code runs on an
// `image::RgbaImage`, the editor canvas, or a vector document.
use image::RgbaImage;
use log::debug;

use crate::color::{MAX_RGB_DISTANCE, Rgb};

/// Vector art has no antialiasing noise, so its tolerance maps onto a tighter range.
pub const VECTOR_DISTANCE_SCALE: f64 = 200.0;

/// Read/write access to one color per handle. History replays through this.
pub trait ColorTarget {
    type Handle: Clone + PartialEq;

    /// `None` for handles that no longer exist, transparent pixels and `fill="none"`.
    fn color_of(&self, handle: &Self::Handle) -> Option<Rgb>;
    fn set_color(&mut self, handle: &Self::Handle, color: Rgb);
}

/// A raster canvas, addressed by pixel.
pub trait PixelSurface {
    fn dimensions(&self) -> (usize, usize);
    /// `None` for fully transparent pixels.
    fn pixel_color(&self, x: usize, y: usize) -> Option<Rgb>;
    /// Replace RGB, leaving alpha alone.
    fn set_pixel_color(&mut self, x: usize, y: usize, color: Rgb);
}

/// A vector document, addressed by shape.
pub trait ShapeSurface: ColorTarget {
    fn for_each_shape(&self, f: &mut dyn FnMut(&Self::Handle));
}

// Any raster canvas is a color target keyed by flat pixel index.
impl<T: PixelSurface> ColorTarget for T {
    type Handle = usize;

    fn color_of(&self, index: &usize) -> Option<Rgb> {
        let (w, h) = self.dimensions();
        if w == 0 || *index >= w * h {
            return None;
        }
        self.pixel_color(index % w, index / w)
    }

    fn set_color(&mut self, index: &usize, color: Rgb) {
        let (w, h) = self.dimensions();
        if w == 0 || *index >= w * h {
            return;
        }
        self.set_pixel_color(index % w, index / w, color);
    }
}

impl PixelSurface for RgbaImage {
    fn dimensions(&self) -> (usize, usize) {
        (self.width() as usize, self.height() as usize)
    }

    fn pixel_color(&self, x: usize, y: usize) -> Option<Rgb> {
        let [r, g, b, a] = self.get_pixel(x as u32, y as u32).0;
        (a > 0).then_some(Rgb::new(r, g, b))
    }

    fn set_pixel_color(&mut self, x: usize, y: usize, color: Rgb) {
        let px = self.get_pixel_mut(x as u32, y as u32);
        px.0[0] = color.r;
        px.0[1] = color.g;
        px.0[2] = color.b;
    }
}

/// What the wand picked: the seed color and every member handle, in discovery order.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<H> {
    pub seed: Option<Rgb>,
    pub members: Vec<H>,
}

impl<H> Default for Selection<H> {
    fn default() -> Self {
        Self { seed: None, members: Vec::new() }
    }
}

impl<H: PartialEq> Selection<H> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.members.contains(handle)
    }
}

impl Selection<usize> {
    /// Per-pixel membership for a canvas of `len` pixels (used for the overlay).
    pub fn mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &i in &self.members {
            if i < len {
                mask[i] = true;
            }
        }
        mask
    }
}

/// Map a 0..100 tolerance onto a color distance, linearly over `scale`.
pub fn threshold(tolerance: u8, scale: f64) -> f64 {
    (tolerance.min(100) as f64 / 100.0) * scale
}

/// Raster wand: grow a 4-connected region from (start_x, start_y).
/// Out-of-range or transparent seeds select nothing.
pub fn flood_select<S: PixelSurface + ?Sized>(
    surface: &S,
    start_x: i64,
    start_y: i64,
    tolerance: u8,
) -> Selection<usize> {
    let (w, h) = surface.dimensions();
    if start_x < 0 || start_y < 0 || start_x as usize >= w || start_y as usize >= h {
        return Selection::default();
    }
    let Some(seed) = surface.pixel_color(start_x as usize, start_y as usize) else {
        return Selection::default();
    };

    let limit = threshold(tolerance, MAX_RGB_DISTANCE);
    let mut visited = vec![false; w * h];
    let mut members = Vec::new();
    // Explicit stack: large regions must not blow the call stack.
    let mut stack = vec![(start_x, start_y)];

    while let Some((x, y)) = stack.pop() {
        if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
            continue;
        }
        let (ux, uy) = (x as usize, y as usize);
        let idx = uy * w + ux;
        if visited[idx] {
            continue;
        }
        visited[idx] = true;

        let inside = surface
            .pixel_color(ux, uy)
            .is_some_and(|c| c.distance(seed) <= limit);
        if inside {
            members.push(idx);
            stack.push((x + 1, y));
            stack.push((x - 1, y));
            stack.push((x, y + 1));
            stack.push((x, y - 1));
        }
    }

    debug!("wand at [{start_x},{start_y}] tolerance {tolerance}: {} pixel(s)", members.len());
    Selection { seed: Some(seed), members }
}

/// Vector wand: every shape whose fill is within tolerance of the clicked shape's fill.
pub fn select_shapes<S: ShapeSurface + ?Sized>(
    doc: &S,
    clicked: &S::Handle,
    tolerance: u8,
) -> Selection<S::Handle> {
    let Some(seed) = doc.color_of(clicked) else {
        return Selection::default();
    };

    let limit = threshold(tolerance, VECTOR_DISTANCE_SCALE);
    let mut members = Vec::new();
    doc.for_each_shape(&mut |handle| {
        if doc.color_of(handle).is_some_and(|c| c.distance(seed) <= limit) {
            members.push(handle.clone());
        }
    });

    debug!("wand tolerance {tolerance}: {} shape(s)", members.len());
    Selection { seed: Some(seed), members }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);

    #[test]
    fn threshold_scales_linearly() {
        assert_eq!(threshold(0, MAX_RGB_DISTANCE), 0.0);
        assert_eq!(threshold(100, MAX_RGB_DISTANCE), MAX_RGB_DISTANCE);
        assert_eq!(threshold(50, VECTOR_DISTANCE_SCALE), 100.0);
        assert_eq!(threshold(250, VECTOR_DISTANCE_SCALE), 200.0);
    }

    #[test]
    fn region_stops_at_other_colors() {
        // R R G
        // G R G
        // R G R   <- bottom corners are red but not connected
        let img = RgbaImage::from_fn(3, 3, |x, y| match (x, y) {
            (0, 0) | (1, 0) | (1, 1) | (0, 2) | (2, 2) => RED,
            _ => GREEN,
        });
        let mut sel = flood_select(&img, 0, 0, 0);
        sel.members.sort();
        assert_eq!(sel.members, vec![0, 1, 4]);
        assert_eq!(sel.seed, Some(Rgb::new(255, 0, 0)));
    }

    #[test]
    fn full_tolerance_takes_everything_connected() {
        let img = RgbaImage::from_fn(4, 4, |x, _| if x % 2 == 0 { RED } else { GREEN });
        assert_eq!(flood_select(&img, 1, 1, 100).len(), 16);
    }

    #[test]
    fn bad_seeds_select_nothing() {
        let mut img = RgbaImage::from_pixel(2, 2, RED);
        assert!(flood_select(&img, -1, 0, 50).is_empty());
        assert!(flood_select(&img, 0, 2, 50).is_empty());
        img.put_pixel(1, 1, Rgba([0, 0, 0, 0]));
        assert!(flood_select(&img, 1, 1, 100).is_empty());
        // transparent pixels never join a region either
        assert_eq!(flood_select(&img, 0, 0, 100).len(), 3);
    }

    #[test]
    fn large_region_does_not_recurse() {
        let img = RgbaImage::from_pixel(600, 600, RED);
        assert_eq!(flood_select(&img, 300, 300, 0).len(), 360_000);
    }

    #[test]
    fn set_color_keeps_alpha() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([1, 2, 3, 128]));
        img.set_color(&1, Rgb::new(9, 9, 9));
        assert_eq!(img.get_pixel(1, 0).0, [9, 9, 9, 128]);
        assert_eq!(img.color_of(&7), None);
    }

    #[test]
    fn mask_marks_members() {
        let sel = Selection { seed: None, members: vec![0, 3] };
        assert_eq!(sel.mask(4), vec![true, false, false, true]);
    }
}
