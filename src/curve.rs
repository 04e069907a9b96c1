// Curve fitting: each polygon edge becomes one cubic Bézier segment.
//
// Control points sit 1/3 and 2/3 of the way along the straight edge, so every
// segment reproduces its edge exactly and can never produce NaNs or loops, no
// matter how ragged the traced outline is.
use crate::tracer::{Path, Sign};
use crate::types::{Point, PointF};

/// `c[i] = [control 1, control 2, end vertex]` for edge `i`.
/// Invariant: `c[i][2]` is where edge `i + 1 (mod n)` starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Curve {
    pub n: usize,
    pub c: Vec<[PointF; 3]>,
}

impl Curve {
    /// Where the closed curve starts (and ends): the end point of the last segment.
    pub fn start(&self) -> Option<PointF> {
        self.c.last().map(|seg| seg[2])
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// True when segment `i` ends on vertex `i + 1 (mod n)` of `pt`, so the
    /// curve runs through every vertex and closes on the first one.
    pub fn follows(&self, pt: &[Point]) -> bool {
        let n = pt.len();
        self.n == n
            && self.c.len() == n
            && self.c.iter().enumerate().all(|(i, seg)| {
                seg.iter().all(|p| p.x.is_finite() && p.y.is_finite())
                    && seg[2] == PointF::from(pt[(i + 1) % n])
            })
    }
}

/// Shoelace area over consecutive vertices, wrapping around. Positive means
/// clockwise on screen (y grows downwards).
pub fn signed_area(pt: &[Point]) -> f64 {
    let n = pt.len();
    if n < 3 {
        return 0.0;
    }
    let twice: i64 = (0..n)
        .map(|i| {
            let a = pt[i];
            let b = pt[(i + 1) % n];
            a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
        })
        .sum();
    twice as f64 / 2.0
}

/// Fill in `path.area`, `path.sign` and `path.curve`, and return a copy of the curve.
pub fn fit(path: &mut Path) -> Curve {
    path.area = signed_area(&path.pt);
    path.sign = Sign::from_area(path.area);

    let n = path.pt.len();
    let curve = match n {
        0 => Curve::default(),
        // A lone vertex: all three points collapse onto it.
        1 => {
            let v = PointF::from(path.pt[0]);
            Curve { n: 1, c: vec![[v, v, v]] }
        }
        _ => {
            let c = (0..n)
                .map(|i| {
                    let p0 = PointF::from(path.pt[i]);
                    let p3 = PointF::from(path.pt[(i + 1) % n]);
                    [p0.lerp(p3, 1.0 / 3.0), p0.lerp(p3, 2.0 / 3.0), p3]
                })
                .collect();
            Curve { n, c }
        }
    };

    path.curve = curve.clone();
    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(clockwise: bool) -> Path {
        let mut pt = vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 4), Point::new(0, 4)];
        if !clockwise {
            pt[1..].reverse();
        }
        Path::new(pt, true)
    }

    #[test]
    fn winding_decides_sign() {
        let mut cw = square(true);
        let mut ccw = square(false);
        fit(&mut cw);
        fit(&mut ccw);
        assert_eq!(cw.area, 16.0);
        assert_eq!(cw.sign, Sign::Plus);
        assert_eq!(ccw.area, -16.0);
        assert_eq!(ccw.sign, Sign::Minus);
    }

    #[test]
    fn last_segment_returns_to_first_vertex() {
        let mut p = square(true);
        let curve = fit(&mut p);
        assert_eq!(curve.n, 4);
        assert_eq!(curve.c[3][2], PointF::new(0.0, 0.0));
        assert_eq!(curve.start(), Some(PointF::new(0.0, 0.0)));
        assert!(curve.follows(&p.pt));
        assert_eq!(p.curve, curve);
    }

    #[test]
    fn controls_split_the_edge_in_thirds() {
        let mut p = square(true);
        let curve = fit(&mut p);
        let [c1, c2, end] = curve.c[0];
        assert!((c1.x - 4.0 / 3.0).abs() < 1e-12 && c1.y == 0.0);
        assert!((c2.x - 8.0 / 3.0).abs() < 1e-12 && c2.y == 0.0);
        assert_eq!(end, PointF::new(4.0, 0.0));
    }

    #[test]
    fn degenerate_paths_do_not_panic() {
        let mut empty = Path::new(vec![], false);
        assert!(fit(&mut empty).is_empty());
        assert_eq!(empty.sign, Sign::Plus);

        let mut dot = Path::new(vec![Point::new(3, 2)], false);
        let curve = fit(&mut dot);
        let v = PointF::new(3.0, 2.0);
        assert_eq!(curve.c, vec![[v, v, v]]);
        assert_eq!(dot.area, 0.0);
    }

    #[test]
    fn two_points_make_a_there_and_back_curve() {
        let mut line = Path::new(vec![Point::new(0, 0), Point::new(3, 0)], false);
        let curve = fit(&mut line);
        assert_eq!(curve.n, 2);
        assert_eq!(curve.c[0][2], PointF::new(3.0, 0.0));
        assert_eq!(curve.c[1][2], PointF::new(0.0, 0.0));
        assert!(curve.follows(&line.pt));
    }
}
