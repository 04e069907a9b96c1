// SVG output: fitted paths in, a standalone SVG document out.
//
// Two ways to show holes:
// - sign-based: `+` outlines paint the foreground, `-` outlines paint the
//   background back over them (fine for single-color traces);
// - compound: all outlines of one color become a single `<path>` with
//   `fill-rule="evenodd"`, so holes are real holes. This is the default.
use std::borrow::Cow;
use std::fmt::Write as _;

use log::{debug, error};

use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::tracer::{Path, Sign};
use crate::types::PointF;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// All outlines traced for one fill color.
#[derive(Clone, Debug, Default)]
pub struct Layer {
    pub color: Rgb,
    pub paths: Vec<Path>,
}

/// Write a coordinate without trailing zeros (`3`, `3.5`, `3.333`).
fn push_num(out: &mut String, v: f64) {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        write!(out, "{}", rounded as i64).ok();
    } else {
        let s = format!("{rounded:.3}");
        out.push_str(s.trim_end_matches('0'));
    }
}

fn push_point(out: &mut String, p: PointF) {
    push_num(out, p.x);
    out.push(' ');
    push_num(out, p.y);
}

/// `M start C … Z` for one fitted path. Empty for an empty curve.
pub fn path_data(path: &Path) -> String {
    let mut d = String::new();
    let Some(start) = path.curve.start() else {
        return d;
    };

    d.push('M');
    push_point(&mut d, start);
    for [c1, c2, end] in &path.curve.c {
        d.push_str(" C");
        push_point(&mut d, *c1);
        d.push(' ');
        push_point(&mut d, *c2);
        d.push(' ');
        push_point(&mut d, *end);
    }
    d.push_str(" Z");
    d
}

/// Concatenate the subpaths of several outlines into one `d` attribute.
pub fn compound_data<'a>(paths: impl IntoIterator<Item = &'a Path>) -> String {
    paths
        .into_iter()
        .map(path_data)
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn open_svg(out: &mut String, width: usize, height: usize) {
    // No width/height: the asset scales to whatever box it is placed in.
    writeln!(out, "<svg xmlns=\"{SVG_NS}\" viewBox=\"0 0 {width} {height}\">").ok();
}

/// Sign-based rendering of a single-color trace.
pub fn compose(paths: &[Path], style: Rgb, background: Rgb, width: usize, height: usize) -> String {
    let mut svg = String::new();
    open_svg(&mut svg, width, height);

    for path in paths {
        let d = path_data(path);
        if d.is_empty() {
            continue;
        }
        let fill = match path.sign {
            Sign::Plus => style,
            Sign::Minus => background,
        };
        writeln!(svg, "  <path d=\"{d}\" fill=\"{fill}\"/>").ok();
    }

    svg.push_str("</svg>");
    svg
}

/// Merge layers that share a color: `(color, compound d)` in order of first
/// appearance. Colors whose outlines are all empty are left out.
pub fn group_layers(layers: &[Layer]) -> Vec<(Rgb, String)> {
    let mut grouped: Vec<(Rgb, Vec<&Path>)> = Vec::new();
    for layer in layers {
        match grouped.iter_mut().find(|(c, _)| *c == layer.color) {
            Some((_, paths)) => paths.extend(layer.paths.iter()),
            None => grouped.push((layer.color, layer.paths.iter().collect())),
        }
    }

    grouped
        .into_iter()
        .map(|(color, paths)| (color, compound_data(paths)))
        .filter(|(_, d)| !d.is_empty())
        .collect()
}

/// One evenodd compound path per distinct color.
pub fn compose_compound(layers: &[Layer], width: usize, height: usize) -> String {
    let mut svg = String::new();
    open_svg(&mut svg, width, height);
    for (color, d) in group_layers(layers) {
        writeln!(svg, "  <path d=\"{d}\" fill=\"{color}\" fill-rule=\"evenodd\"/>").ok();
    }
    svg.push_str("</svg>");
    svg
}

/// Clean up an SVG from another tracer: standard `viewBox` taken from the
/// root `width`/`height` (400x300 when missing), no fixed size, and one
/// evenodd compound path per paint. Anything that fails to parse is logged
/// and handed back untouched.
pub fn regroup_svg(raw: &str) -> String {
    match try_regroup_svg(raw) {
        Ok(svg) => svg,
        Err(e) => {
            error!("could not regroup SVG, returning it unchanged: {e}");
            raw.to_string()
        }
    }
}

/// Root size used for whichever of `width`/`height` is missing or unreadable.
const DEFAULT_VIEWBOX: (f64, f64) = (400.0, 300.0);

/// Paths under these elements are never painted directly.
const NON_RENDERED: [&str; 6] = ["defs", "clipPath", "mask", "pattern", "symbol", "marker"];

/// Everything that has to match for two paths to share one compound path.
/// Values are the literal (inherited) attribute strings.
#[derive(Debug, PartialEq)]
struct PaintKey<'a> {
    fill: &'a str,
    stroke: Option<&'a str>,
    stroke_width: Option<&'a str>,
    transform: Option<String>,
}

fn try_regroup_svg(raw: &str) -> Result<String> {
    let doc = roxmltree::Document::parse(raw).map_err(|e| Error::Compositing(format!("parse: {e}")))?;
    let root = doc.root_element();
    if !root.has_tag_name("svg") {
        return Err(Error::Compositing(format!("root element is <{}>", root.tag_name().name())));
    }

    // 1) Collect `d` strings per paint, in document order.
    let mut grouped: Vec<(PaintKey, Vec<&str>)> = Vec::new();
    for node in root.descendants().filter(|n| n.has_tag_name("path")) {
        if node.ancestors().any(|a| NON_RENDERED.contains(&a.tag_name().name())) {
            continue;
        }
        let Some(d) = node.attribute("d").map(str::trim).filter(|d| !d.is_empty()) else {
            continue;
        };
        let key = paint_key(node);
        match grouped.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ds)) => ds.push(d),
            None => grouped.push((key, vec![d])),
        }
    }

    // 2) Emit one compound path per paint.
    let width = dimension(root.attribute("width"), DEFAULT_VIEWBOX.0);
    let height = dimension(root.attribute("height"), DEFAULT_VIEWBOX.1);
    let mut svg = String::new();
    write!(svg, "<svg xmlns=\"{SVG_NS}\" viewBox=\"0 0 ").ok();
    push_num(&mut svg, width);
    svg.push(' ');
    push_num(&mut svg, height);
    svg.push_str("\">\n");
    for (key, ds) in &grouped {
        write!(
            svg,
            "  <path d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"",
            escape_attr(&ds.join(" ")),
            escape_attr(key.fill)
        )
        .ok();
        let extra = [("stroke", key.stroke), ("stroke-width", key.stroke_width), ("transform", key.transform.as_deref())];
        for (name, value) in extra {
            if let Some(v) = value {
                write!(svg, " {name}=\"{}\"", escape_attr(v)).ok();
            }
        }
        svg.push_str("/>\n");
    }
    svg.push_str("</svg>");

    debug!("regrouped SVG into {} compound path(s)", grouped.len());
    Ok(svg)
}

/// Paint attributes as the path sees them. `fill` falls back to the nearest
/// ancestor's, then to `#000000`; `fill="none"` and gradient references stay
/// as written. Transforms compose outermost first.
fn paint_key<'a>(node: roxmltree::Node<'a, '_>) -> PaintKey<'a> {
    let inherited = |name: &str| node.ancestors().find_map(|n| n.attribute(name));
    let transforms: Vec<&str> = node.ancestors().filter_map(|n| n.attribute("transform")).collect();
    PaintKey {
        fill: inherited("fill").unwrap_or("#000000"),
        stroke: inherited("stroke"),
        stroke_width: inherited("stroke-width"),
        transform: (!transforms.is_empty())
            .then(|| transforms.iter().rev().copied().collect::<Vec<_>>().join(" ")),
    }
}

/// `"50"`, `"50px"` -> 50. Percentages, other units and garbage use `default`.
fn dimension(value: Option<&str>, default: f64) -> f64 {
    value
        .map(|v| v.trim())
        .map(|v| v.strip_suffix("px").unwrap_or(v))
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}

/// Escape text for use inside a double-quoted XML attribute.
pub(crate) fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::fit;
    use crate::types::Point;

    fn fitted(pt: Vec<Point>) -> Path {
        let mut p = Path::new(pt, true);
        fit(&mut p);
        p
    }

    fn square(x: i32, y: i32, size: i32, clockwise: bool) -> Path {
        let mut pt = vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ];
        if !clockwise {
            pt[1..].reverse();
        }
        fitted(pt)
    }

    #[test]
    fn numbers_are_compact() {
        let mut s = String::new();
        push_num(&mut s, 3.0);
        s.push(' ');
        push_num(&mut s, 1.0 / 3.0);
        s.push(' ');
        push_num(&mut s, 2.5);
        assert_eq!(s, "3 0.333 2.5");
    }

    #[test]
    fn path_data_is_closed_cubic() {
        let d = path_data(&square(0, 0, 3, true));
        assert!(d.starts_with("M0 0 C1 0 2 0 3 0"));
        assert!(d.ends_with("C0 2 0 1 0 0 Z"));
        assert_eq!(d.matches('C').count(), 4);
    }

    #[test]
    fn holes_paint_background_in_sign_mode() {
        let paths = vec![square(0, 0, 4, true), square(1, 1, 2, false)];
        let svg = compose(&paths, Rgb::BLACK, Rgb::WHITE, 4, 4);
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 4 4\">"));
        assert!(!svg.contains("width="));
        let fills: Vec<&str> = svg.match_indices("fill=\"").map(|(i, _)| &svg[i + 6..i + 13]).collect();
        assert_eq!(fills, vec!["#000000", "#ffffff"]);
    }

    #[test]
    fn compound_mode_merges_same_color() {
        let red = Rgb::new(255, 0, 0);
        let layers = vec![
            Layer { color: red, paths: vec![square(0, 0, 4, true)] },
            Layer { color: Rgb::BLACK, paths: vec![square(5, 0, 1, true)] },
            Layer { color: red, paths: vec![square(1, 1, 2, false)] },
        ];
        let svg = compose_compound(&layers, 6, 4);
        assert_eq!(svg.matches("<path").count(), 2);
        assert_eq!(svg.matches("fill-rule=\"evenodd\"").count(), 2);
        let red_line = svg.lines().find(|l| l.contains("#ff0000")).unwrap();
        assert_eq!(red_line.matches('M').count(), 2);
    }

    #[test]
    fn composed_output_is_valid_svg() {
        let layers = vec![Layer { color: Rgb::new(0, 0xd4, 0xaa), paths: vec![square(0, 0, 4, true)] }];
        let svg = compose_compound(&layers, 8, 8);
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn regroup_merges_paths_by_fill() {
        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <g><path d="M0 0 L4 0 L4 4 Z" fill="#ff0000"/></g>
            <path d="M5 5 L9 5 L9 9 Z" fill="#ff0000"/>
            <path d="M0 5 L4 5 L4 9 Z"/>
        </svg>"##;
        let svg = regroup_svg(raw);
        assert!(svg.contains("viewBox=\"0 0 10 10\""));
        assert!(!svg.contains("width="));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("fill=\"#000000\""));
        let red_line = svg.lines().find(|l| l.contains("#ff0000")).unwrap();
        assert_eq!(red_line.matches('M').count(), 2);
    }

    #[test]
    fn regroup_keeps_unfilled_and_gradient_paths() {
        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <defs><linearGradient id="g"/><clipPath id="c"><path d="M0 0 L1 1"/></clipPath></defs>
            <path d="M0 0 L4 0 L4 4 Z" fill="#ff0000"/>
            <path d="M1 1 L8 8" fill="none" stroke="#0000ff"/>
            <path d="M2 2 L6 2 L6 6 Z" fill="url(#g)"/>
        </svg>"##;
        let svg = regroup_svg(raw);
        assert_eq!(svg.matches("<path").count(), 3);
        let line = svg.lines().find(|l| l.contains("M1 1 L8 8")).unwrap();
        assert!(line.contains("fill=\"none\""));
        assert!(line.contains("stroke=\"#0000ff\""));
        assert!(svg.contains("fill=\"url(#g)\""));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn regroup_inherits_group_paint_and_transform() {
        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
            <g fill="#00ff00" transform="translate(2 0)"><g transform="scale(2)"><path d="M0 0 L1 0 L1 1 Z"/></g></g>
            <path d="M5 5 L6 5 L6 6 Z" fill="#00ff00"/>
        </svg>"##;
        let svg = regroup_svg(raw);
        assert_eq!(svg.matches("fill=\"#00ff00\"").count(), 2);
        assert!(svg.contains("transform=\"translate(2 0) scale(2)\""));
    }

    #[test]
    fn regroup_sizes_each_side_independently() {
        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" width="50"><path d="M0 0 L4 0 L4 4 Z"/></svg>"##;
        assert!(regroup_svg(raw).contains("viewBox=\"0 0 50 300\""));

        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" height="20px" stroke-width="2"><path d="M0 0 L4 0 L4 4 Z"/></svg>"##;
        assert!(regroup_svg(raw).contains("viewBox=\"0 0 400 20\""));

        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg" stroke-width="2" viewBox="0 0 4 4"><path d="M0 0 L4 0 L4 4 Z"/></svg>"##;
        assert!(regroup_svg(raw).contains("viewBox=\"0 0 400 300\""));
    }

    #[test]
    fn escaping_only_touches_markup() {
        assert!(matches!(escape_attr("M0 0 L1 1 Z"), Cow::Borrowed(_)));
        assert_eq!(escape_attr("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn regroup_defaults_missing_size() {
        let raw = r##"<svg xmlns="http://www.w3.org/2000/svg"><path d="M0 0 L4 0 L4 4 Z" fill="#123456"/></svg>"##;
        let svg = regroup_svg(raw);
        assert!(svg.contains("viewBox=\"0 0 400 300\""));
        assert!(svg.contains("fill=\"#123456\""));
    }

    #[test]
    fn regroup_passes_garbage_through() {
        let raw = "<svg><path d=";
        assert_eq!(regroup_svg(raw), raw);
        assert_eq!(regroup_svg("not svg at all"), "not svg at all");
    }
}
