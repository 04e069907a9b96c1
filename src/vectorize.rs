// Whole-image tracing: RGBA in, SVG out.
// The image is posterized to a small palette, every palette color gets its own
// bitmap, and each bitmap is traced, fitted and merged into one compound path.
use std::collections::HashMap;
use std::fmt::Write as _;

use image::RgbaImage;
use log::debug;
use serde::Deserialize;

use crate::bitmap::Bitmap;
use crate::color::Rgb;
use crate::compose::{self, Layer};
use crate::tracer::{ContourRule, Tracer, TurnPolicy};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TraceOptions {
    /// Palette size after posterizing.
    pub colors: usize,
    pub rule: ContourRule,
    pub turn_policy: TurnPolicy,
    /// Outlines this small or smaller are dropped (boundary rule only).
    pub min_area: f64,
    /// Pixels with alpha at or below this are background and never traced.
    pub alpha_threshold: u8,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            colors: 8,
            rule: ContourRule::Boundary,
            turn_policy: TurnPolicy::Minority,
            min_area: 8.0,
            alpha_threshold: 0,
        }
    }
}

impl TraceOptions {
    pub fn tracer(&self) -> Tracer {
        Tracer::new(self.rule)
            .with_turn_policy(self.turn_policy)
            .with_min_area(self.min_area)
    }
}

/// Most frequent visible colors, most frequent first.
pub fn build_palette(img: &RgbaImage, max_colors: usize, alpha_threshold: u8) -> Vec<Rgb> {
    let mut histogram: HashMap<Rgb, u32> = HashMap::new();
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        if a <= alpha_threshold {
            continue;
        }
        *histogram.entry(Rgb::new(r, g, b)).or_insert(0) += 1;
    }

    let mut entries: Vec<(Rgb, u32)> = histogram.into_iter().collect();
    // Ties broken by the packed color so the palette is deterministic.
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.to_u32().cmp(&b.0.to_u32())));
    entries.into_iter().take(max_colors.max(1)).map(|(c, _)| c).collect()
}

fn nearest(color: Rgb, palette: &[Rgb]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, p) in palette.iter().enumerate() {
        let d = color.distance(*p);
        if d < best_dist {
            best = i;
            best_dist = d;
        }
    }
    best
}

/// Palette index per pixel; `None` for background (transparent) pixels.
pub fn map_to_palette(img: &RgbaImage, palette: &[Rgb], alpha_threshold: u8) -> Vec<Option<usize>> {
    img.pixels()
        .map(|px| {
            let [r, g, b, a] = px.0;
            (a > alpha_threshold && !palette.is_empty()).then(|| nearest(Rgb::new(r, g, b), palette))
        })
        .collect()
}

/// Trace every palette color into its own layer.
pub fn trace_layers(img: &RgbaImage, opts: &TraceOptions) -> Vec<Layer> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let palette = build_palette(img, opts.colors, opts.alpha_threshold);
    let indexed = map_to_palette(img, &palette, opts.alpha_threshold);
    let tracer = opts.tracer();

    palette
        .iter()
        .enumerate()
        .map(|(i, &color)| {
            let mut bm = Bitmap::from_fn(w, h, |x, y| indexed[y * w + x] == Some(i));
            let paths = tracer.trace_fitted(&mut bm);
            debug!("layer {color}: {} path(s)", paths.len());
            Layer { color, paths }
        })
        .collect()
}

/// Posterize, trace and compose as evenodd compound paths.
pub fn vectorize(img: &RgbaImage, opts: &TraceOptions) -> String {
    let layers = trace_layers(img, opts);
    compose::compose_compound(&layers, img.width() as usize, img.height() as usize)
}

/// Single-color trace: dark pixels become `style`, holes are painted `background`.
pub fn trace_mono(img: &RgbaImage, tracer: Tracer, style: Rgb, background: Rgb, luma_threshold: u8) -> String {
    let mut bm = Bitmap::from_luma(img, luma_threshold, 0);
    let paths = tracer.trace_fitted(&mut bm);
    compose::compose(&paths, style, background, img.width() as usize, img.height() as usize)
}

/// Cheap blocky stand-in used when a real trace takes too long: the image is
/// sampled on a grid of at most `64` blocks per side and each row of blocks
/// is run-length merged into `<rect>`s.
pub fn coarse_svg(img: &RgbaImage, alpha_threshold: u8) -> String {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let block = (w.max(h) / 64).max(1);
    let (cols, rows) = (w.div_ceil(block), h.div_ceil(block));

    let sample = |bx: usize, by: usize| {
        let [r, g, b, a] = img.get_pixel((bx * block) as u32, (by * block) as u32).0;
        (a > alpha_threshold).then_some(Rgb::new(r, g, b))
    };

    let mut svg = String::new();
    compose::open_svg(&mut svg, w, h);
    for by in 0..rows {
        let mut bx = 0;
        while bx < cols {
            let color = sample(bx, by);
            let mut run_end = bx + 1;
            while run_end < cols && sample(run_end, by) == color {
                run_end += 1;
            }
            if let Some(c) = color {
                let x = bx * block;
                let y = by * block;
                let rw = (run_end * block).min(w) - x;
                let rh = block.min(h - y);
                writeln!(svg, "  <rect x=\"{x}\" y=\"{y}\" width=\"{rw}\" height=\"{rh}\" fill=\"{c}\"/>").ok();
            }
            bx = run_end;
        }
    }
    svg.push_str("</svg>");
    svg
}
