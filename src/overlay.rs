// Turns the asset being edited into what the window shows:
// 1) the RGBA image composited over a checkerboard (so transparency is visible)
// 2) the wand selection tinted green on top
// Both mixes happen in linear light so edges don't go dark or haloed.
use image::RgbaImage;

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::types::FrameBuffer;

/// Selection tint, 77/255 ≈ 30% coverage.
pub const SELECTION_TINT: Rgb = Rgb::new(0x00, 0xFF, 0x00);
pub const SELECTION_ALPHA: u8 = 77;

const CHECKER_LIGHT: u8 = 0xEE;
const CHECKER_DARK: u8 = 0xCC;
const CHECKER_CELL: usize = 8;

/// sRGB <-> linear lookup tables; building them once avoids a powf per channel per pixel.
pub struct GammaLut {
    to_linear: [f32; 256],
    // linear 0..1 quantized to 4096 steps
    to_srgb: [u8; 4096],
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaLut {
    pub fn new() -> Self {
        let mut to_linear = [0.0f32; 256];
        for (v, slot) in to_linear.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *slot = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut to_srgb = [0u8; 4096];
        for (i, slot) in to_srgb.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *slot = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { to_linear, to_srgb }
    }

    #[inline]
    pub fn linear(&self, v: u8) -> f32 {
        self.to_linear[v as usize]
    }

    #[inline]
    pub fn srgb(&self, l: f32) -> u8 {
        self.to_srgb[(l.clamp(0.0, 1.0) * 4095.0).round() as usize]
    }

    /// `top` over `bottom` at coverage `a` (0..1), mixed in linear light.
    pub fn mix(&self, bottom: Rgb, top: Rgb, a: f32) -> Rgb {
        if a <= 0.0 {
            return bottom;
        }
        if a >= 1.0 {
            return top;
        }
        let inv = 1.0 - a;
        let ch = |b: u8, t: u8| self.srgb(a * self.linear(t) + inv * self.linear(b));
        Rgb::new(ch(bottom.r, top.r), ch(bottom.g, top.g), ch(bottom.b, top.b))
    }
}

/// Integer downscale so large assets still fit on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct View {
    pub scale: usize,
    pub width: usize,
    pub height: usize,
}

impl View {
    /// Smallest scale that makes `width x height` fit inside `max_side` on both axes.
    pub fn fit(width: usize, height: usize, max_side: usize) -> Self {
        let max_side = max_side.max(1);
        let scale = width.max(height).div_ceil(max_side).max(1);
        Self { scale, width: width.div_ceil(scale).max(1), height: height.div_ceil(scale).max(1) }
    }

    /// Window pixel to image pixel.
    pub fn to_image(&self, sx: usize, sy: usize) -> (i64, i64) {
        ((sx * self.scale) as i64, (sy * self.scale) as i64)
    }
}

/// Draw `img` (and the selection `mask`, one flag per image pixel) into `fb`.
pub fn render(fb: &mut FrameBuffer, img: &RgbaImage, mask: &[bool], view: View, lut: &GammaLut) -> Result<()> {
    if fb.width != view.width || fb.height != view.height {
        return Err(Error::WindowUpdate("overlay: framebuffer does not match view".into()));
    }
    let (iw, ih) = (img.width() as usize, img.height() as usize);
    if iw == 0 || ih == 0 {
        fb.pixels.fill(0);
        return Ok(());
    }
    if !mask.is_empty() && mask.len() != iw * ih {
        return Err(Error::Selection("overlay: mask does not match image".into()));
    }

    let tint_a = SELECTION_ALPHA as f32 / 255.0;
    for sy in 0..view.height {
        for sx in 0..view.width {
            let (ix, iy) = ((sx * view.scale).min(iw - 1), (sy * view.scale).min(ih - 1));
            let [r, g, b, a] = img.get_pixel(ix as u32, iy as u32).0;

            let shade = if (sx / CHECKER_CELL + sy / CHECKER_CELL) % 2 == 0 { CHECKER_LIGHT } else { CHECKER_DARK };
            let mut px = lut.mix(Rgb::new(shade, shade, shade), Rgb::new(r, g, b), a as f32 / 255.0);
            if mask.get(iy * iw + ix).copied().unwrap_or(false) {
                px = lut.mix(px, SELECTION_TINT, tint_a);
            }
            fb.pixels[sy * view.width + sx] = px.to_u32();
        }
    }
    Ok(())
}
