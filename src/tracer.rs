// Contour extraction: bitmap in, closed outlines out.
// Every step consumes ("flips") bitmap cells, so a trace always terminates and
// no region is ever assigned to two paths.
use log::debug;
use serde::Deserialize;

use crate::bitmap::Bitmap;
use crate::curve::{self, Curve};
use crate::types::Point;

/// Neighbour search order for the pixel walk: clockwise starting east.
const WALK_ORDER: [(i32, i32); 8] = [
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
];

/// Fill (`+`) or hole (`-`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sign {
    #[default]
    Plus,
    Minus,
}

impl Sign {
    pub fn from_area(area: f64) -> Self {
        if area >= 0.0 { Sign::Plus } else { Sign::Minus }
    }

    pub fn as_char(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// One discovered outline. `area`, `sign` and `curve` are filled in by [`curve::fit`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub pt: Vec<Point>,
    pub area: f64,
    pub sign: Sign,
    pub curve: Curve,
    /// The outline returns to its first vertex.
    pub closed: bool,
}

impl Path {
    pub fn new(pt: Vec<Point>, closed: bool) -> Self {
        Self { pt, closed, ..Self::default() }
    }

    pub fn len(&self) -> usize {
        self.pt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pt.is_empty()
    }
}

/// How outlines are pulled out of the bitmap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContourRule {
    /// Walk from pixel to pixel, vertices at pixel coordinates.
    #[default]
    PixelWalk,
    /// Follow the cracks between pixels (vertices at pixel corners) and
    /// invert each enclosed region, so holes come back as `-` paths.
    Boundary,
}

/// Which way the boundary walker turns where two regions touch diagonally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    Right,
    Left,
    Black,
    White,
    Majority,
    #[default]
    Minority,
}

/// Tracer settings. A plain value: build one per call, share nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tracer {
    pub rule: ContourRule,
    pub turn_policy: TurnPolicy,
    /// Boundary outlines with |area| at or below this are dropped as speckle.
    /// The pixel walk keeps every contour.
    pub min_area: f64,
}

impl Tracer {
    pub fn new(rule: ContourRule) -> Self {
        Self { rule, ..Self::default() }
    }

    pub fn with_turn_policy(mut self, policy: TurnPolicy) -> Self {
        self.turn_policy = policy;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    /// Extract every outline. The bitmap is consumed: it is all-off afterwards
    /// for the pixel walk, and XOR-cleared for the boundary rule.
    pub fn trace(&self, bm: &mut Bitmap) -> Vec<Path> {
        let paths = match self.rule {
            ContourRule::PixelWalk => pixel_walk(bm),
            ContourRule::Boundary => boundary(bm, self.turn_policy, self.min_area),
        };
        debug!(
            "traced {} path(s) from {}x{} bitmap ({:?})",
            paths.len(),
            bm.width(),
            bm.height(),
            self.rule
        );
        paths
    }

    /// [`Tracer::trace`] followed by [`curve::fit`] on every path.
    pub fn trace_fitted(&self, bm: &mut Bitmap) -> Vec<Path> {
        let mut paths = self.trace(bm);
        for path in &mut paths {
            curve::fit(path);
        }
        paths
    }
}

/* ---------------------------- pixel walk ---------------------------- */

fn pixel_walk(bm: &mut Bitmap) -> Vec<Path> {
    let mut paths = Vec::new();
    let width = bm.width();
    let mut cursor = 0usize;

    while let Some((sx, sy)) = bm.next_on(cursor) {
        // Everything before the start cell is already off.
        cursor = sx as usize + sy as usize * width;
        let start = Point::new(sx, sy);
        let mut pt = Vec::new();
        let mut cur = start;

        loop {
            pt.push(cur);
            bm.flip(cur.x, cur.y);

            let next = WALK_ORDER
                .iter()
                .map(|(dx, dy)| Point::new(cur.x + dx, cur.y + dy))
                .find(|p| bm.at(p.x, p.y));
            match next {
                Some(p) => cur = p,
                None => break,
            }
        }

        let closed = pt.len() >= 3 && pt[pt.len() - 1].touches(start);
        paths.push(Path::new(pt, closed));
    }

    paths
}

/* ----------------------------- boundary ----------------------------- */

fn boundary(bm: &mut Bitmap, policy: TurnPolicy, min_area: f64) -> Vec<Path> {
    let original = bm.clone();
    let width = bm.width();
    let mut paths = Vec::new();
    let mut cursor = 0usize;

    while let Some((sx, sy)) = bm.next_on(cursor) {
        cursor = sx as usize + sy as usize * width;
        let start = Point::new(sx, sy);
        let sign = if original.at(sx, sy) { Sign::Plus } else { Sign::Minus };

        let mut pt = follow_cracks(bm, start, sign, policy);
        xor_interior(bm, &pt);

        // The walk winds every region the same way; flip fills so that the
        // shoelace sign downstream matches fill (+) vs hole (-).
        if sign == Sign::Plus {
            pt[1..].reverse();
        }
        let pt = drop_collinear(pt);

        let area = curve::signed_area(&pt);
        if area.abs() > min_area {
            paths.push(Path::new(pt, true));
        }
    }

    paths
}

/// Walk the pixel-corner lattice around the region whose top-left corner is `start`.
fn follow_cracks(bm: &Bitmap, start: Point, sign: Sign, policy: TurnPolicy) -> Vec<Point> {
    let (mut x, mut y) = (start.x, start.y);
    let (mut dirx, mut diry) = (0i32, 1i32);
    let mut pt = Vec::new();

    loop {
        pt.push(Point::new(x, y));
        x += dirx;
        y += diry;
        if x == start.x && y == start.y {
            break;
        }

        // Pixels ahead-left and ahead-right of the current edge
        let left = bm.at(x + (dirx + diry - 1).div_euclid(2), y + (diry - dirx - 1).div_euclid(2));
        let right = bm.at(x + (dirx - diry - 1).div_euclid(2), y + (diry + dirx - 1).div_euclid(2));

        if right && !left {
            let turn_right = match policy {
                TurnPolicy::Right => true,
                TurnPolicy::Left => false,
                TurnPolicy::Black => sign == Sign::Plus,
                TurnPolicy::White => sign == Sign::Minus,
                TurnPolicy::Majority => majority(bm, x, y),
                TurnPolicy::Minority => !majority(bm, x, y),
            };
            if turn_right {
                (dirx, diry) = (-diry, dirx);
            } else {
                (dirx, diry) = (diry, -dirx);
            }
        } else if right {
            (dirx, diry) = (-diry, dirx);
        } else if !left {
            (dirx, diry) = (diry, -dirx);
        }
    }

    pt
}

/// Is the neighbourhood of corner (x, y) mostly on? Grows the window until it decides.
fn majority(bm: &Bitmap, x: i32, y: i32) -> bool {
    let vote = |on: bool| if on { 1 } else { -1 };
    for i in 2..5 {
        let mut ct = 0i32;
        for a in (-i + 1)..=(i - 1) {
            ct += vote(bm.at(x + a, y + i - 1));
            ct += vote(bm.at(x + i - 1, y + a - 1));
            ct += vote(bm.at(x + a - 1, y - i));
            ct += vote(bm.at(x - i, y + a));
        }
        if ct > 0 {
            return true;
        } else if ct < 0 {
            return false;
        }
    }
    false
}

/// Invert every cell enclosed by the outline, row by row, using its vertical edges.
fn xor_interior(bm: &mut Bitmap, pt: &[Point]) {
    let Some(max_x) = pt.iter().map(|p| p.x).max() else {
        return;
    };
    for (i, a) in pt.iter().enumerate() {
        let b = pt[(i + 1) % pt.len()];
        if a.y != b.y {
            let row = a.y.min(b.y);
            for col in b.x..max_x {
                bm.flip(col, row);
            }
        }
    }
}

/// Remove vertices where the outline goes straight on. The shape is unchanged.
fn drop_collinear(pt: Vec<Point>) -> Vec<Point> {
    let n = pt.len();
    if n < 3 {
        return pt;
    }
    let keep = |i: usize| {
        let prev = pt[(i + n - 1) % n];
        let cur = pt[i];
        let next = pt[(i + 1) % n];
        let cross = (cur.x - prev.x) * (next.y - cur.y) - (cur.y - prev.y) * (next.x - cur.x);
        cross != 0
    };
    (0..n).filter(|&i| keep(i)).map(|i| pt[i]).collect()
}
