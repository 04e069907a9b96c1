use proptest::prelude::*;

use vectorwand::compose::{compose, path_data};
use vectorwand::curve::{fit, signed_area};
use vectorwand::types::{Point, PointF};
use vectorwand::{Bitmap, ContourRule, Path, Rgb, Sign, Tracer, TurnPolicy};

fn plus() -> Bitmap {
    Bitmap::from_ascii(&[".#.", "###", ".#."])
}

fn square(clockwise: bool) -> Path {
    let mut pt = vec![Point::new(0, 0), Point::new(4, 0), Point::new(4, 4), Point::new(0, 4)];
    if !clockwise {
        pt[1..].reverse();
    }
    let mut path = Path::new(pt, true);
    fit(&mut path);
    path
}

#[test]
fn plus_shape_is_one_closed_positive_path() {
    for rule in [ContourRule::PixelWalk, ContourRule::Boundary] {
        let mut bm = plus();
        let paths = Tracer::new(rule).trace_fitted(&mut bm);
        assert_eq!(paths.len(), 1, "{rule:?}");
        let path = &paths[0];
        assert!(path.closed, "{rule:?}");
        assert!(path.len() >= 4, "{rule:?}");
        assert!(path.area > 0.0, "{rule:?}");
        assert_eq!(path.sign, Sign::Plus);
        assert!(path.curve.follows(&path.pt));
    }
}

#[test]
fn opposite_windings_get_opposite_signs_and_fills() {
    let cw = square(true);
    let ccw = square(false);
    assert_eq!(cw.sign, Sign::Plus);
    assert_eq!(ccw.sign, Sign::Minus);
    assert_eq!(cw.area, -ccw.area);

    let svg = compose(&[cw, ccw], Rgb::BLACK, Rgb::WHITE, 4, 4);
    let fg = svg.lines().filter(|l| l.contains("fill=\"#000000\"")).count();
    let bg = svg.lines().filter(|l| l.contains("fill=\"#ffffff\"")).count();
    assert_eq!((fg, bg), (1, 1));
}

#[test]
fn square_with_square_hole() {
    let mut bm = Bitmap::from_ascii(&["#####", "#...#", "#...#", "#...#", "#####"]);
    let paths = Tracer::new(ContourRule::Boundary).trace_fitted(&mut bm);
    let signs: Vec<Sign> = paths.iter().map(|p| p.sign).collect();
    assert_eq!(signs, vec![Sign::Plus, Sign::Minus]);
    assert_eq!(paths[0].area, 25.0);
    assert_eq!(paths[1].area, -9.0);
    assert!(path_data(&paths[1]).ends_with('Z'));
}

#[test]
fn retracing_a_consumed_bitmap_finds_nothing() {
    for rule in [ContourRule::PixelWalk, ContourRule::Boundary] {
        let mut bm = plus();
        let tracer = Tracer::new(rule);
        assert!(!tracer.trace(&mut bm).is_empty());
        assert!(bm.is_empty());
        assert!(tracer.trace(&mut bm).is_empty());
    }
}

#[test]
fn empty_bitmap_traces_to_nothing() {
    let mut bm = Bitmap::new(16, 16);
    assert!(Tracer::default().trace(&mut bm).is_empty());
    let mut zero = Bitmap::new(0, 0);
    assert!(Tracer::new(ContourRule::Boundary).trace(&mut zero).is_empty());
}

fn bitmap_strategy() -> impl Strategy<Value = Bitmap> {
    (1usize..10, 1usize..10).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<bool>(), w * h)
            .prop_map(move |cells| Bitmap::from_fn(w, h, |x, y| cells[y * w + x]))
    })
}

fn policy_strategy() -> impl Strategy<Value = TurnPolicy> {
    prop_oneof![
        Just(TurnPolicy::Right),
        Just(TurnPolicy::Left),
        Just(TurnPolicy::Black),
        Just(TurnPolicy::White),
        Just(TurnPolicy::Majority),
        Just(TurnPolicy::Minority),
    ]
}

proptest! {
    #[test]
    fn every_fitted_curve_closes_on_its_start(
        bm in bitmap_strategy(),
        boundary in any::<bool>(),
        policy in policy_strategy(),
    ) {
        let rule = if boundary { ContourRule::Boundary } else { ContourRule::PixelWalk };
        let mut bm = bm;
        let paths = Tracer::new(rule).with_turn_policy(policy).trace_fitted(&mut bm);
        prop_assert!(bm.is_empty());

        for path in &paths {
            let n = path.len();
            prop_assert_eq!(path.curve.n, n);
            if n >= 2 {
                prop_assert_eq!(path.curve.c[n - 1][2], PointF::from(path.pt[0]));
                prop_assert!(path.curve.follows(&path.pt));
            }
            prop_assert_eq!(path.area, signed_area(&path.pt));
            prop_assert_eq!(path.sign, Sign::from_area(path.area));
        }
    }

    #[test]
    fn boundary_paths_cover_the_bitmap(bm in bitmap_strategy(), policy in policy_strategy()) {
        // Fills minus holes add up to the number of on pixels.
        let on = bm.count() as f64;
        let mut bm = bm;
        let paths = Tracer::new(ContourRule::Boundary).with_turn_policy(policy).trace_fitted(&mut bm);
        let total: f64 = paths.iter().map(|p| p.area).sum();
        prop_assert_eq!(total, on);
    }
}
