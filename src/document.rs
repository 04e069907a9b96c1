// In-memory vector document: the shapes a traced asset is made of, each with
// an id and a flat fill. The vector wand and the history work on this.
use std::fmt::Write as _;

use crate::color::Rgb;
use crate::compose::{self, Layer};
use crate::select::{ColorTarget, ShapeSurface};

#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub id: String,
    pub d: String,
    /// `None` renders as `fill="none"` and is never selectable.
    pub fill: Option<Rgb>,
    pub evenodd: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorDocument {
    pub width: usize,
    pub height: usize,
    pub shapes: Vec<Shape>,
}

impl VectorDocument {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, shapes: Vec::new() }
    }

    /// One evenodd compound shape per color, ids `shape-0`, `shape-1`, ...
    pub fn from_layers(layers: &[Layer], width: usize, height: usize) -> Self {
        let shapes = compose::group_layers(layers)
            .into_iter()
            .enumerate()
            .map(|(i, (color, d))| Shape { id: format!("shape-{i}"), d, fill: Some(color), evenodd: true })
            .collect();
        Self { width, height, shapes }
    }

    /// Append a shape; its id must be unique.
    pub fn push(&mut self, id: impl Into<String>, d: impl Into<String>, fill: Option<Rgb>) {
        self.shapes.push(Shape { id: id.into(), d: d.into(), fill, evenodd: true });
    }

    pub fn get(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        compose::open_svg(&mut svg, self.width, self.height);
        for shape in &self.shapes {
            let fill = shape.fill.map_or_else(|| "none".to_string(), Rgb::to_hex);
            let (id, d) = (compose::escape_attr(&shape.id), compose::escape_attr(&shape.d));
            write!(svg, "  <path id=\"{id}\" d=\"{d}\" fill=\"{fill}\"").ok();
            if shape.evenodd {
                svg.push_str(" fill-rule=\"evenodd\"");
            }
            svg.push_str("/>\n");
        }
        svg.push_str("</svg>");
        svg
    }
}

impl ColorTarget for VectorDocument {
    type Handle = String;

    fn color_of(&self, id: &String) -> Option<Rgb> {
        self.get(id).and_then(|s| s.fill)
    }

    fn set_color(&mut self, id: &String, color: Rgb) {
        if let Some(shape) = self.shapes.iter_mut().find(|s| &s.id == id) {
            shape.fill = Some(color);
        }
    }
}

impl ShapeSurface for VectorDocument {
    fn for_each_shape(&self, f: &mut dyn FnMut(&String)) {
        for shape in &self.shapes {
            f(&shape.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::fit;
    use crate::tracer::Path;
    use crate::types::Point;

    fn layer(color: Rgb, x: i32) -> Layer {
        let mut p = Path::new(
            vec![Point::new(x, 0), Point::new(x + 1, 0), Point::new(x + 1, 1), Point::new(x, 1)],
            true,
        );
        fit(&mut p);
        Layer { color, paths: vec![p] }
    }

    #[test]
    fn layers_become_one_shape_per_color() {
        let red = Rgb::new(255, 0, 0);
        let doc = VectorDocument::from_layers(&[layer(red, 0), layer(Rgb::BLACK, 2), layer(red, 4)], 6, 1);
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.shapes[0].id, "shape-0");
        assert_eq!(doc.shapes[0].fill, Some(red));
        assert_eq!(doc.shapes[0].d.matches('M').count(), 2);
    }

    #[test]
    fn svg_output_carries_ids_and_none_fills() {
        let mut doc = VectorDocument::new(10, 10);
        doc.push("mug", "M0 0 L1 0 L1 1 Z", Some(Rgb::new(0, 0xd4, 0xaa)));
        doc.push("outline", "M0 0 L2 0 L2 2 Z", None);
        let svg = doc.to_svg();
        assert!(svg.contains("<path id=\"mug\" d=\"M0 0 L1 0 L1 1 Z\" fill=\"#00d4aa\" fill-rule=\"evenodd\"/>"));
        assert!(svg.contains("id=\"outline\" d=\"M0 0 L2 0 L2 2 Z\" fill=\"none\""));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn markup_in_ids_is_escaped() {
        let mut doc = VectorDocument::new(4, 4);
        doc.push("mug \"handle\" & <cup>", "M0 0 L1 0 L1 1 Z", Some(Rgb::WHITE));
        let svg = doc.to_svg();
        assert!(svg.contains("id=\"mug &quot;handle&quot; &amp; &lt;cup&gt;\""));
        let xml = roxmltree::Document::parse(&svg).unwrap();
        let path = xml.descendants().find(|n| n.has_tag_name("path")).unwrap();
        assert_eq!(path.attribute("id"), Some("mug \"handle\" & <cup>"));
        assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
    }

    #[test]
    fn none_fill_has_no_color() {
        let mut doc = VectorDocument::new(1, 1);
        doc.push("a", "M0 0 Z", None);
        assert_eq!(doc.color_of(&"a".to_string()), None);
        doc.set_color(&"missing".to_string(), Rgb::WHITE);
        assert_eq!(doc.len(), 1);
    }
}
