use naview_core::{
    Layout, Naview, NaviewConfig, NaviewError, PairTable, Point, PseudoknotPolicy, Radloop,
};

fn dist(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn layout_of(structure: &str) -> Layout {
    let pt = naview_core::parse(structure).unwrap();
    Naview::default().layout(&pt).unwrap()
}

fn assert_finite(layout: &Layout, n: usize) {
    assert_eq!(layout.coordinates.len(), n);
    for (i, p) in layout.coordinates.iter().enumerate() {
        assert!(p.x.is_finite() && p.y.is_finite(), "base {i}: {p:?}");
    }
}

#[test]
fn test_partner_list_entry_point() {
    let coords = naview_core::layout(&[Some(5), Some(4), None, None, Some(1), Some(0)]).unwrap();
    assert_eq!(coords.len(), 6);
    assert!(coords.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
}

#[test]
fn test_hairpin_rungs_parallel() {
    let l = layout_of("((((....))))");
    let c = &l.coordinates;
    let rung = |i: usize, j: usize| (c[j].x - c[i].x, c[j].y - c[i].y);
    let (ax, ay) = rung(0, 11);
    for (i, j) in [(1, 10), (2, 9), (3, 8)] {
        let (bx, by) = rung(i, j);
        let cross = ax * by - ay * bx;
        assert!(cross.abs() < 1e-6, "rung ({i}, {j}) not parallel: {cross}");
        assert!(((bx - ax).abs() + (by - ay).abs()) < 1e-6);
    }
}

#[test]
fn test_helix_step_follows_helix_factor() {
    let l = layout_of("((((....))))");
    let c = &l.coordinates;
    // 0.6 backbone units between stacked pairs, 27 output units per backbone unit
    for i in 0..3 {
        let d = dist(c[i], c[i + 1]);
        assert!((d - 0.6 * 27.0).abs() < 1e-6, "step {i}: {d}");
    }
}

#[test]
fn test_hairpin_loop_evenly_spaced() {
    let l = layout_of("(((.....)))");
    let c = &l.coordinates;
    // closing pair 2-8 and the five loop bases sit on one circle at equal steps
    let first = dist(c[2], c[3]);
    for i in 3..8 {
        let d = dist(c[i], c[i + 1]);
        assert!((d - first).abs() < 1e-6, "step {i}: {d} vs {first}");
    }
}

#[test]
fn test_hairpin_loop_symmetric_about_stem() {
    let l = layout_of("((..))");
    let c = &l.coordinates;
    // the stem axis runs through the midpoints of both rungs
    let m1 = Point {
        x: (c[0].x + c[5].x) / 2.0,
        y: (c[0].y + c[5].y) / 2.0,
    };
    let m2 = Point {
        x: (c[1].x + c[4].x) / 2.0,
        y: (c[1].y + c[4].y) / 2.0,
    };
    let (ax, ay) = (m2.x - m1.x, m2.y - m1.y);
    let side = |p: Point| ax * (p.y - m1.y) - ay * (p.x - m1.x);
    assert!((side(c[2]) + side(c[3])).abs() < 1e-6);
    assert!((dist(c[2], m2) - dist(c[3], m2)).abs() < 1e-6);
}

#[test]
fn test_all_unpaired_is_one_loop() {
    let l = layout_of("........");
    assert_finite(&l, 8);
    let first = dist(l.coordinates[0], l.coordinates[1]);
    for i in 1..7 {
        let d = dist(l.coordinates[i], l.coordinates[i + 1]);
        assert!((d - first).abs() < 1e-6, "step {i}: {d} vs {first}");
    }
}

#[test]
fn test_tiny_inputs() {
    let l = layout_of("");
    assert!(l.coordinates.is_empty());
    assert!(l.loops.is_empty());

    let l = layout_of(".");
    assert_eq!(l.coordinates, vec![Point { x: 100.0, y: 100.0 }]);

    let l = layout_of("()");
    assert_finite(&l, 2);
    assert!((dist(l.coordinates[0], l.coordinates[1]) - 27.0).abs() < 1e-6);
}

#[test]
fn test_deterministic() {
    let s = "((((..((((...))))..((((....))))...))))";
    let a = layout_of(s);
    let b = layout_of(s);
    assert_eq!(a.coordinates, b.coordinates);

    // an engine keeps no state between calls
    let engine = Naview::default();
    let pt = naview_core::parse(s).unwrap();
    let first = engine.layout(&pt).unwrap();
    engine.layout(&naview_core::parse("((...))").unwrap()).unwrap();
    let again = engine.layout(&pt).unwrap();
    assert_eq!(first.coordinates, again.coordinates);
}

#[test]
fn test_output_transform() {
    let s = "((..((...))..((...))..))";
    let default = layout_of(s);
    let config = NaviewConfig {
        backbone_distance: 1.0,
        origin: Point { x: 0.0, y: 0.0 },
        ..NaviewConfig::default()
    };
    let raw = Naview::new(config)
        .unwrap()
        .layout(&naview_core::parse(s).unwrap())
        .unwrap();
    for (p, q) in default.coordinates.iter().zip(&raw.coordinates) {
        assert!(((p.x - 100.0) / 27.0 - q.x).abs() < 1e-9);
        assert!(((p.y - 100.0) / 27.0 - q.y).abs() < 1e-9);
    }
}

#[test]
fn test_multiloop_is_root() {
    let l = layout_of("((..((...))..((...))..))");
    assert_finite(&l, 24);
    assert_eq!(l.loops.len(), 4);
    let root = l.root.unwrap();
    let summary = l.loops.iter().find(|s| s.number == root).unwrap();
    assert_eq!(summary.connections, 3);
    assert_eq!(summary.depth, 1);
}

#[test]
fn test_extruded_linker_has_unit_steps() {
    let helix = "((((((((((((....))))))))))))";
    let s = format!("{helix}.....{helix}");
    let l = layout_of(&s);
    assert_finite(&l, 61);
    // bases 27..=33 (0-indexed) run from the first helix to the second
    for i in 27..33 {
        let d = dist(l.coordinates[i], l.coordinates[i + 1]);
        assert!((d - 27.0).abs() < 0.05, "step {i}: {d}");
    }
}

#[test]
fn test_short_chord_between_adjacent_helices() {
    // a one-base gap whose flanking bases end up less than a unit apart
    let s = ".()()(.(.)())()..().";
    let l = layout_of(s);
    assert_finite(&l, s.len());
}

#[test]
fn test_crossed_loop_is_recorded() {
    let s = ".().()(.((().).))()()...";
    let l = layout_of(s);
    assert_finite(&l, s.len());
    assert!(!l.crossed_loops.is_empty());
    for number in &l.crossed_loops {
        assert!(l.loops.iter().any(|lp| lp.number == *number));
    }
}

#[test]
fn test_strict_crossings_fail() {
    let s = ".().()(.((().).))()()...";
    let config = NaviewConfig {
        strict_crossings: true,
        ..NaviewConfig::default()
    };
    let crossed = layout_of(s).crossed_loops;
    let err = naview_core::layout_structure(s, config).unwrap_err();
    match err {
        NaviewError::CrossedRegions { loop_number } => {
            assert!(crossed.contains(&loop_number), "{loop_number} not in {crossed:?}")
        }
        other => panic!("expected CrossedRegions, got {other:?}"),
    }
}

#[test]
fn test_far_coordinates_count_as_placed() {
    // helices long enough to run past ten thousand backbone units
    let h = format!("{}....{}", "(".repeat(20000), ")".repeat(20000));
    let s = format!(".{h}.{h}.{h}.{h}.{h}.{h}.");
    let l = layout_of(&s);
    assert_finite(&l, s.len());
    let far = l
        .coordinates
        .iter()
        .map(|p| p.x.max(p.y))
        .fold(f64::MIN, f64::max);
    assert!(far > 100.0 + 27.0 * 9899.0, "furthest point {far}");
}

#[test]
fn test_nesting_check() {
    assert!(naview_core::parse("((..))..(())").unwrap().is_nested());
    assert!(!naview_core::parse("((..[[..))..]]").unwrap().is_nested());
    assert!(naview_core::parse("").unwrap().is_nested());
}

#[test]
fn test_deep_nesting() {
    let k = 1500;
    let s = format!("{}....{}", "(.".repeat(k), ".)".repeat(k));
    let l = layout_of(&s);
    assert_finite(&l, 4 * k + 4);
    assert_eq!(l.loops.len(), k + 1);
}

#[test]
fn test_radloop_pins_radius() {
    let config = NaviewConfig {
        radloops: vec![Radloop {
            loop_number: 2,
            radius: 3.0,
        }],
        ..NaviewConfig::default()
    };
    let l = naview_core::layout_structure("(((...)))", config).unwrap();
    let hairpin = l.loops.iter().find(|s| s.number == 2).unwrap();
    assert_eq!(hairpin.radius, 3.0);
    let c = &l.coordinates;
    // the loop center sits 3 backbone units past the closing pair; the apex
    // is on the far side at the closing bases' distance from that center
    let mid = Point {
        x: (c[2].x + c[6].x) / 2.0,
        y: (c[2].y + c[6].y) / 2.0,
    };
    let half = dist(c[2], c[6]) / 2.0;
    let rc = (81.0f64 * 81.0 + half * half).sqrt();
    let d = dist(c[4], mid);
    assert!((d - (81.0 + rc)).abs() < 1e-6, "apex at {d}");
}

#[test]
fn test_pseudoknot_rejected() {
    let pt = naview_core::parse("((..[[..))..]]").unwrap();
    let err = Naview::default().layout(&pt).unwrap_err();
    assert_eq!(
        err,
        NaviewError::Pseudoknot {
            first: (0, 9),
            second: (4, 13),
        }
    );
}

#[test]
fn test_pseudoknot_stripped() {
    let config = NaviewConfig {
        pseudoknots: PseudoknotPolicy::Strip,
        ..NaviewConfig::default()
    };
    let l = naview_core::layout_structure("((..[[..))..]]", config).unwrap();
    assert_eq!(l.stripped_pairs, vec![(4, 13), (5, 12)]);
    assert_finite(&l, 14);
}

#[test]
fn test_invalid_pair_table() {
    let err = naview_core::layout(&[Some(1), None, None]).unwrap_err();
    assert!(matches!(err, NaviewError::InvalidPairTable(_)));
    assert!(PairTable::from_pairs(3, &[(0, 3)]).is_err());
    assert!(PairTable::from_pairs(4, &[(0, 3), (3, 1)]).is_err());
}

#[test]
fn test_invalid_config() {
    let config = NaviewConfig {
        lencut: -1.0,
        ..NaviewConfig::default()
    };
    assert!(matches!(
        Naview::new(config),
        Err(NaviewError::InvalidConfig(_))
    ));
}

#[test]
fn test_draw_structure_json() {
    let json = naview_core::draw_structure("((...))");
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["coordinates"].as_array().unwrap().len(), 7);
    assert_eq!(v["loops"].as_array().unwrap().len(), 2);
    assert!(naview_core::draw_structure("((.)").is_empty());
}
