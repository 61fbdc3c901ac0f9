//! End-to-end scene tests: JSON scene -> player -> recorded paint commands.
//!
//! Run with: cargo test -p lottie-core --test scene_audit

use glam::{Vec2, Vec4};
use kurbo::{BezPath, PathEl, Point, Shape as _};
use lottie_core::path::PathMeasure;
use lottie_core::{
    DrawCommand, LottiePlayer, Paint, PaintSource, PaintStyle, PlayerConfig, RecordingSurface,
};
use lottie_data::model::LottieJson;
use serde_json::json;

/// A 500x500 scene with one shape layer at the origin.
fn create_test_lottie(shapes: serde_json::Value) -> LottieJson {
    let json = json!({
        "v": "5.7.0",
        "fr": 60,
        "ip": 0,
        "op": 60,
        "w": 500,
        "h": 500,
        "nm": "Test",
        "layers": [
            {
                "ty": 4,
                "ind": 1,
                "ip": 0,
                "op": 60,
                "st": 0,
                "nm": "Shape Layer",
                "ks": {
                    "o": { "a": 0, "k": 100 },
                    "p": { "a": 0, "k": [0, 0, 0] }
                },
                "shapes": shapes
            }
        ]
    });
    serde_json::from_value(json).expect("Failed to parse test lottie")
}

/// Routes engine logs through the test harness; safe to call repeatedly.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("lottie_core=debug")
        .with_test_writer()
        .try_init();
}

fn player_with(shapes: serde_json::Value, config: PlayerConfig) -> LottiePlayer {
    let mut player = LottiePlayer::with_config(config);
    player
        .load_json(create_test_lottie(shapes))
        .expect("scene should build");
    player
}

fn player(shapes: serde_json::Value) -> LottiePlayer {
    player_with(shapes, PlayerConfig::default())
}

fn record(player: &mut LottiePlayer) -> RecordingSurface {
    let mut surface = RecordingSurface::new();
    player.draw(&mut surface);
    surface
}

fn draws(surface: &RecordingSurface) -> Vec<(BezPath, Paint)> {
    surface
        .draws()
        .map(|(p, paint)| (p.clone(), paint.clone()))
        .collect()
}

fn rect(name: &str, x: f32, size: f32) -> serde_json::Value {
    json!({"ty": "rc", "nm": name, "s": {"k": [size, size]}, "p": {"k": [x, 0]}, "r": {"k": 0}})
}

fn fill(name: &str) -> serde_json::Value {
    json!({"ty": "fl", "nm": name, "c": {"k": [1, 0, 0, 1]}, "o": {"k": 100}})
}

fn stroke(name: &str) -> serde_json::Value {
    json!({"ty": "st", "nm": name, "c": {"k": [0, 0, 0, 1]}, "o": {"k": 100}, "w": {"k": 2}})
}

fn line(name: &str, from: [f32; 2], to: [f32; 2]) -> serde_json::Value {
    json!({
        "ty": "sh", "nm": name,
        "ks": {"k": {"c": false, "v": [from, to], "i": [[0, 0], [0, 0]], "o": [[0, 0], [0, 0]]}}
    })
}

fn center(path: &BezPath) -> Point {
    path.bounding_box().center()
}

mod shapes {
    use super::*;

    #[test]
    fn test_five_point_star() {
        let mut player = player(json!([
            {
                "ty": "sr", "nm": "Star", "sy": 1,
                "p": {"k": [0, 0]}, "pt": {"k": 5}, "r": {"k": 0},
                "or": {"k": 50}, "os": {"k": 0}, "ir": {"k": 25}, "is": {"k": 0}
            },
            fill("Fill")
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        assert_eq!(draws.len(), 1);

        let els = draws[0].0.elements();
        match els[0] {
            PathEl::MoveTo(p) => assert!((p - Point::new(0.0, -50.0)).hypot() < 1e-3),
            other => panic!("star must start with a move, got {other:?}"),
        }
        let vertices: Vec<Point> = els
            .iter()
            .filter_map(|el| match el {
                PathEl::LineTo(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(vertices.len(), 10);
        assert_eq!(els.last(), Some(&PathEl::ClosePath));
        for (i, v) in vertices.iter().enumerate() {
            let expected = if i % 2 == 0 { 25.0 } else { 50.0 };
            assert!((v.to_vec2().hypot() - expected).abs() < 1e-3, "vertex {i} at {v:?}");
        }
    }

    #[test]
    fn test_fill_ignores_paths_listed_after_it() {
        let mut player = player(json!([
            rect("Box", 0.0, 10.0),
            fill("Fill"),
            {"ty": "el", "nm": "Below", "s": {"k": [40, 40]}, "p": {"k": [0, 0]}}
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        assert_eq!(draws.len(), 1);
        let bounds = draws[0].0.bounding_box();
        assert!((bounds.width() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_group_transform_and_stroke() {
        let mut player = player(json!([
            {
                "ty": "gr", "nm": "Group",
                "it": [
                    rect("Box", 0.0, 10.0),
                    stroke("Stroke"),
                    {"ty": "tr", "p": {"k": [100, 0]}, "s": {"k": [200, 200]}}
                ]
            }
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        assert_eq!(draws.len(), 1);
        let (path, paint) = &draws[0];
        assert!((center(path).x - 100.0).abs() < 1e-4);
        assert!((path.bounding_box().width() - 20.0).abs() < 1e-4);
        match &paint.style {
            PaintStyle::Stroke(style) => assert!((style.width - 4.0).abs() < 1e-3),
            PaintStyle::Fill(_) => panic!("expected a stroke"),
        }
    }

    #[test]
    fn test_anchor_offsets_after_scaling() {
        let mut player = player(json!([
            {
                "ty": "gr", "nm": "Group",
                "it": [
                    rect("Box", 10.0, 10.0),
                    fill("Fill"),
                    {"ty": "tr", "a": {"k": [10, 0]}, "p": {"k": [100, 50]}, "s": {"k": [200, 200]}}
                ]
            }
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        assert_eq!(draws.len(), 1);
        // Scaled about the origin to 10..30, then moved by position - anchor.
        let bounds = draws[0].0.bounding_box();
        assert!((bounds.x0 - 100.0).abs() < 1e-4, "bounds {bounds:?}");
        assert!((bounds.x1 - 120.0).abs() < 1e-4, "bounds {bounds:?}");
        assert!((center(&draws[0].0).y - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_draw_order_is_bottom_up() {
        let mut player = player(json!([
            {"ty": "gr", "nm": "Top", "it": [rect("A", 0.0, 10.0), fill("Fill")]},
            {"ty": "gr", "nm": "Bottom", "it": [rect("B", 100.0, 10.0), fill("Fill")]}
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        assert_eq!(draws.len(), 2);
        assert!((center(&draws[0].0).x - 100.0).abs() < 1e-6);
        assert!(center(&draws[1].0).x.abs() < 1e-6);
    }
}

mod repeaters {
    use super::*;

    #[test]
    fn test_copies_draw_in_descending_order() {
        let mut player = player(json!([
            rect("Box", 0.0, 10.0),
            fill("Fill"),
            {
                "ty": "rp", "nm": "Repeater", "c": {"k": 3}, "o": {"k": 0},
                "tr": {"p": {"k": [10, 0]}, "so": {"k": 100}, "eo": {"k": 100}}
            }
        ]));
        let surface = record(&mut player);
        let centers: Vec<f64> = surface.draws().map(|(p, _)| center(p).x).collect();
        assert_eq!(centers.len(), 3);
        for (got, want) in centers.iter().zip([20.0, 10.0, 0.0]) {
            assert!((got - want).abs() < 1e-4, "{centers:?}");
        }
    }

    #[test]
    fn test_copy_opacity_interpolates() {
        let mut player = player(json!([
            rect("Box", 0.0, 10.0),
            fill("Fill"),
            {
                "ty": "rp", "nm": "Repeater", "c": {"k": 2},
                "tr": {"p": {"k": [10, 0]}, "so": {"k": 100}, "eo": {"k": 0}}
            }
        ]));
        let surface = record(&mut player);
        let alphas: Vec<f32> = surface.draws().map(|(_, paint)| paint.alpha).collect();
        // Copy 1 first at half opacity, then copy 0 at full.
        assert_eq!(alphas.len(), 2);
        assert!((alphas[0] - 127.0 / 255.0).abs() < 1e-3);
        assert_eq!(alphas[1], 1.0);
    }

    #[test]
    fn test_zero_copies_draw_nothing() {
        let mut player = player(json!([
            rect("Box", 0.0, 10.0),
            fill("Fill"),
            {"ty": "rp", "nm": "Repeater", "c": {"k": 0}}
        ]));
        assert_eq!(record(&mut player).draw_count(), 0);
    }
}

mod merge_paths {
    use super::*;
    use lottie_core::{PathOp, PathOps};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every operation as (op, centre x of first, centre x of second).
    #[derive(Default)]
    struct RecordingOps {
        calls: RefCell<Vec<(PathOp, f64, f64)>>,
    }

    impl PathOps for RecordingOps {
        fn combine(&self, op: PathOp, first: &BezPath, second: &BezPath) -> BezPath {
            self.calls
                .borrow_mut()
                .push((op, center(first).x, center(second).x));
            let mut out = first.clone();
            for el in second.elements() {
                out.push(*el);
            }
            out
        }
    }

    fn merged(mode: u8, ops: Rc<RecordingOps>) -> RecordingSurface {
        let mut player = LottiePlayer::new().with_path_ops(ops);
        player
            .load_json(create_test_lottie(json!([
                rect("B", 100.0, 10.0),
                rect("C", 200.0, 10.0),
                rect("A", 0.0, 10.0),
                {"ty": "mm", "nm": "Merge", "mm": mode},
                fill("Fill")
            ])))
            .unwrap();
        record(&mut player)
    }

    #[test]
    fn test_subtract_removes_remainder_from_last_item() {
        let ops = Rc::new(RecordingOps::default());
        let surface = merged(3, Rc::clone(&ops));
        assert_eq!(surface.draw_count(), 1);
        let calls = ops.calls.borrow();
        assert_eq!(calls.len(), 2);
        // Remainder first: B ∪ C in list order.
        assert_eq!(calls[0].0, PathOp::Union);
        assert!((calls[0].1 - 100.0).abs() < 1e-6 && (calls[0].2 - 200.0).abs() < 1e-6);
        // Then A minus the remainder.
        assert_eq!(calls[1].0, PathOp::Difference);
        assert!(calls[1].1.abs() < 1e-6);
        assert!((calls[1].2 - 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_mode_operator_mapping() {
        for (mode, op) in [(2, PathOp::Union), (4, PathOp::Intersect), (5, PathOp::Xor)] {
            let ops = Rc::new(RecordingOps::default());
            merged(mode, Rc::clone(&ops));
            assert_eq!(ops.calls.borrow().last().map(|c| c.0), Some(op));
        }
    }

    #[test]
    fn test_plain_merge_concatenates() {
        let ops = Rc::new(RecordingOps::default());
        let surface = merged(1, Rc::clone(&ops));
        assert!(ops.calls.borrow().is_empty());
        let (path, _) = surface.draws().next().unwrap();
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 3);
    }
}

mod trims {
    use super::*;

    fn trimmed_stroke(trim: serde_json::Value) -> Vec<BezPath> {
        let mut player = player(json!([
            line("Line", [0.0, 0.0], [100.0, 0.0]),
            trim,
            stroke("Stroke")
        ]));
        let surface = record(&mut player);
        surface.draws().map(|(p, _)| p.clone()).collect()
    }

    #[test]
    fn test_full_trim_keeps_path() {
        let paths = trimmed_stroke(json!({"ty": "tm", "s": {"k": 0}, "e": {"k": 100}, "o": {"k": 0}}));
        assert_eq!(paths.len(), 1);
        let length = PathMeasure::new(&paths[0], 0.01).length();
        assert!((length - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_wraparound_draws_both_ends() {
        // 60..100 rotated by a fifth of the path covers 80..100 and 0..20.
        let paths = trimmed_stroke(json!({"ty": "tm", "s": {"k": 60}, "e": {"k": 100}, "o": {"k": 72}}));
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        let moves = path
            .elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count();
        assert_eq!(moves, 2);
        let length = PathMeasure::new(path, 0.01).length();
        assert!((length - 40.0).abs() < 1e-2, "length {length}");
        let bounds = path.bounding_box();
        assert!(bounds.x0.abs() < 1e-3 && (bounds.x1 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_end_past_length_wraps_to_start() {
        let paths = trimmed_stroke(json!({"ty": "tm", "s": {"k": 80}, "e": {"k": 120}, "o": {"k": 0}}));
        let length = PathMeasure::new(&paths[0], 0.01).length();
        assert!((length - 40.0).abs() < 1e-2, "length {length}");
        let contours = PathMeasure::new(&paths[0], 0.01).contour_lengths().len();
        assert_eq!(contours, 2);
    }

    #[test]
    fn test_individual_trim_spans_paths() {
        let mut player = player(json!([
            line("First", [0.0, 0.0], [50.0, 0.0]),
            line("Second", [0.0, 10.0], [50.0, 10.0]),
            {"ty": "tm", "nm": "Trim", "m": 2, "s": {"k": 50}, "e": {"k": 100}, "o": {"k": 0}},
            stroke("Stroke")
        ]));
        let surface = record(&mut player);
        let draws = draws(&surface);
        // The first half of the run is the first path; only the second draws.
        assert_eq!(draws.len(), 1);
        assert!((center(&draws[0].0).y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_trim_animates_path_cache() {
        let mut player = player(json!([
            line("Line", [0.0, 0.0], [100.0, 0.0]),
            {"ty": "tm", "s": {"k": 0}, "o": {"k": 0}, "e": {"a": 1, "k": [
                {"t": 0, "s": [0]},
                {"t": 60, "s": [100]}
            ]}},
            stroke("Stroke")
        ]));
        player.set_frame(30.0);
        let surface = record(&mut player);
        let (path, _) = surface.draws().next().unwrap();
        let length = PathMeasure::new(path, 0.01).length();
        assert!((length - 50.0).abs() < 1e-2, "length {length}");
    }
}

mod gradients {
    use super::*;
    use std::rc::Rc;

    fn gradient_player(animated: bool) -> LottiePlayer {
        let end = if animated {
            json!({"a": 1, "k": [{"t": 0, "s": [10, 0]}, {"t": 60, "s": [100, 0]}]})
        } else {
            json!({"k": [10, 0]})
        };
        player(json!([
            rect("Box", 0.0, 10.0),
            {
                "ty": "gf", "nm": "Gradient", "t": 1, "o": {"k": 100},
                "s": {"k": [0, 0]}, "e": end,
                "g": {"p": 2, "k": {"k": [0, 1, 0, 0, 1, 0, 0, 1]}}
            }
        ]))
    }

    fn brush(player: &mut LottiePlayer) -> Rc<lottie_core::gradient::GradientBrush> {
        let surface = record(player);
        let (_, paint) = surface.draws().next().unwrap();
        match &paint.source {
            PaintSource::Gradient { brush, .. } => Rc::clone(brush),
            PaintSource::Solid(_) => panic!("expected a gradient"),
        }
    }

    #[test]
    fn test_same_bucket_reuses_brush() {
        let mut player = gradient_player(true);
        player.set_frame(30.0);
        let a = brush(&mut player);
        player.set_frame(30.1);
        let b = brush(&mut player);
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_new_bucket_builds_new_brush() {
        let mut player = gradient_player(true);
        player.set_frame(0.0);
        let a = brush(&mut player);
        player.set_frame(30.0);
        let b = brush(&mut player);
        assert!(!Rc::ptr_eq(&a, &b));
        assert!((b.end.x - 55.0).abs() < 1e-3);
    }

    #[test]
    fn test_static_gradient_is_built_once() {
        let mut player = gradient_player(false);
        let a = brush(&mut player);
        player.set_frame(45.0);
        let b = brush(&mut player);
        assert!(Rc::ptr_eq(&a, &b));
    }
}

mod key_paths {
    use super::*;
    use lottie_core::surface::ColorFilter;
    use lottie_core::{KeyPath, KeyPathTarget, LottieError, LottieProperty, ValueCallback};

    fn scene() -> LottiePlayer {
        player(json!([
            {"ty": "gr", "nm": "Box Group", "it": [rect("Box", 0.0, 10.0), fill("Fill 1")]},
            {"ty": "gr", "nm": "Star Group", "it": [
                {"ty": "el", "nm": "Dot", "s": {"k": [4, 4]}, "p": {"k": [100, 0]}},
                fill("Fill 1")
            ]}
        ]))
    }

    fn kp(path: &str) -> KeyPath {
        KeyPath::parse(path).unwrap()
    }

    #[test]
    fn test_globstar_finds_every_fill() {
        let player = scene();
        let resolved = player.resolve_key_path(&kp("**.Fill 1")).unwrap();
        let paths: Vec<String> = resolved.iter().map(|r| r.path.to_string()).collect();
        assert_eq!(
            paths,
            vec!["Shape Layer.Box Group.Fill 1", "Shape Layer.Star Group.Fill 1"]
        );
    }

    #[test]
    fn test_exact_and_wildcard_paths() {
        let player = scene();
        let exact = player
            .resolve_key_path(&kp("Shape Layer.Star Group.Dot"))
            .unwrap();
        assert_eq!(exact.len(), 1);
        let wildcard = player.resolve_key_path(&kp("Shape Layer.*")).unwrap();
        assert_eq!(wildcard.len(), 2);
        let layer = player.resolve_key_path(&kp("Shape Layer")).unwrap();
        assert_eq!(layer[0].target, KeyPathTarget::Layer(0));
    }

    #[test]
    fn test_color_override_and_clear() {
        let mut player = scene();
        let path = kp("Shape Layer.Box Group.Fill 1");
        let applied = player
            .add_value_callback(
                &path,
                LottieProperty::Color,
                Some(ValueCallback::constant_color(Vec4::new(0.0, 0.0, 1.0, 1.0))),
            )
            .unwrap();
        assert_eq!(applied.len(), 1);

        let colors = |player: &mut LottiePlayer| -> Vec<Vec4> {
            record(player)
                .draws()
                .filter_map(|(_, paint)| match paint.source {
                    PaintSource::Solid(c) => Some(c),
                    PaintSource::Gradient { .. } => None,
                })
                .collect()
        };
        // The star group is below the box group, so it draws first.
        assert_eq!(
            colors(&mut player),
            vec![Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 0.0, 1.0, 1.0)]
        );

        player
            .add_value_callback(&path, LottieProperty::Color, None)
            .unwrap();
        assert_eq!(colors(&mut player)[1], Vec4::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_callback_sees_keyframe_value() {
        let mut player = scene();
        player
            .add_value_callback(
                &kp("**.Dot"),
                LottieProperty::EllipseSize,
                Some(ValueCallback::point(|info| info.keyframe_value * 10.0)),
            )
            .unwrap();
        let surface = record(&mut player);
        let (path, _) = surface.draws().next().unwrap();
        assert!((path.bounding_box().width() - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_mismatched_callback_is_rejected() {
        let mut player = scene();
        let err = player
            .add_value_callback(
                &kp("**.Fill 1"),
                LottieProperty::Color,
                Some(ValueCallback::constant_float(1.0)),
            )
            .unwrap_err();
        assert!(matches!(err, LottieError::PropertyTypeMismatch { .. }));
    }

    #[test]
    fn test_color_filter_install_and_clear() {
        let mut player = scene();
        let path = kp("**.Fill 1");
        let tint = ColorFilter {
            color: Vec4::new(0.0, 1.0, 0.0, 1.0),
        };
        player
            .add_value_callback(
                &path,
                LottieProperty::ColorFilter,
                Some(ValueCallback::ColorFilter(Some(tint))),
            )
            .unwrap();
        assert!(record(&mut player)
            .draws()
            .all(|(_, paint)| paint.color_filter == Some(tint)));

        player
            .add_value_callback(&path, LottieProperty::ColorFilter, Some(ValueCallback::ColorFilter(None)))
            .unwrap();
        assert!(record(&mut player)
            .draws()
            .all(|(_, paint)| paint.color_filter.is_none()));
    }

    #[test]
    fn test_layer_transform_override() {
        let mut player = scene();
        player
            .add_value_callback(
                &kp("Shape Layer"),
                LottieProperty::TransformPosition,
                Some(ValueCallback::constant_point(Vec2::new(0.0, 30.0))),
            )
            .unwrap();
        let surface = record(&mut player);
        assert!(surface.draws().all(|(p, _)| (center(p).y - 30.0).abs() < 1e-4));
    }
}

mod layers {
    use super::*;

    fn translucent_group() -> serde_json::Value {
        json!([
            {"ty": "gr", "nm": "Group", "it": [
                rect("A", 0.0, 10.0),
                fill("Fill A"),
                rect("B", 50.0, 10.0),
                fill("Fill B"),
                {"ty": "tr", "o": {"k": 50}}
            ]}
        ])
    }

    #[test]
    fn test_group_opacity_multiplies_into_children() {
        let mut player = player(translucent_group());
        let surface = record(&mut player);
        assert!(!surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::BeginLayer { .. })));
        assert!(surface
            .draws()
            .all(|(_, paint)| (paint.alpha - 127.0 / 255.0).abs() < 1e-3));
    }

    #[test]
    fn test_offscreen_layer_for_group_opacity() {
        let config = PlayerConfig {
            apply_opacity_to_layers: true,
            ..PlayerConfig::default()
        };
        let mut player = player_with(translucent_group(), config);
        let surface = record(&mut player);
        let begin = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::BeginLayer { .. }))
            .expect("group should render through a layer");
        let end = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::EndLayer))
            .unwrap();
        assert!(begin < end);
        if let DrawCommand::BeginLayer { alpha, bounds } = &surface.commands[begin] {
            assert!((alpha - 127.0 / 255.0).abs() < 1e-3);
            assert!(bounds.width() > 50.0);
        }
        assert!(surface.draws().all(|(_, paint)| paint.alpha == 1.0));
    }

    #[test]
    fn test_unsupported_content_is_skipped() {
        init_tracing();
        let mut model = create_test_lottie(json!([
            {"ty": "zz", "nm": "Future Shape"},
            rect("Box", 0.0, 10.0),
            fill("Fill")
        ]));
        let mut image_layer = model.layers[0].clone();
        image_layer.ty = 2;
        image_layer.nm = Some("Image".into());
        model.layers.push(image_layer);

        let mut player = LottiePlayer::new();
        player.load_json(model.clone()).unwrap();
        assert_eq!(record(&mut player).draw_count(), 1);

        let mut strict = LottiePlayer::with_config(PlayerConfig {
            strict: true,
            ..PlayerConfig::default()
        });
        assert!(strict.load_json(model).is_err());
    }

    #[test]
    fn test_hidden_layer_is_not_drawn() {
        let mut model = create_test_lottie(json!([rect("Box", 0.0, 10.0), fill("Fill")]));
        model.layers[0].hd = Some(true);
        let mut player = LottiePlayer::new();
        player.load_json(model).unwrap();
        assert_eq!(record(&mut player).draw_count(), 0);
    }
}

mod keyframes {
    use lottie_core::{AnimatedValue, FrameContext};
    use lottie_data::model::Property;
    use serde_json::json;

    fn value(prop: serde_json::Value) -> AnimatedValue<f32> {
        let prop: Property<f32> = serde_json::from_value(prop).unwrap();
        AnimatedValue::from_property("x", &prop, |v| *v, 0.0, 64).unwrap()
    }

    fn at(v: &mut AnimatedValue<f32>, frame: f32) -> f32 {
        v.set_frame(FrameContext {
            frame,
            progress: frame / 100.0,
        });
        v.get()
    }

    #[test]
    fn test_boundaries_clamp() {
        let mut v = value(json!({"a": 1, "k": [
            {"t": 10, "s": [5], "o": {"x": [0.4], "y": [0]}, "i": {"x": [0.6], "y": [1]}},
            {"t": 20, "s": [50]}
        ]}));
        assert_eq!(at(&mut v, 0.0), 5.0);
        assert_eq!(at(&mut v, 10.0), 5.0);
        assert_eq!(at(&mut v, 20.0), 50.0);
        assert_eq!(at(&mut v, 90.0), 50.0);
        let mid = at(&mut v, 15.0);
        assert!(mid > 5.0 && mid < 50.0);
    }

    #[test]
    fn test_hold_keeps_start_value() {
        let mut v = value(json!({"a": 1, "k": [
            {"t": 0, "s": [5], "h": 1},
            {"t": 10, "s": [50]}
        ]}));
        assert_eq!(at(&mut v, 0.0), 5.0);
        assert_eq!(at(&mut v, 9.99), 5.0);
        assert_eq!(at(&mut v, 10.0), 50.0);
    }

    #[test]
    fn test_version_moves_only_on_change() {
        let mut v = value(json!({"a": 1, "k": [
            {"t": 0, "s": [5], "h": 1},
            {"t": 10, "s": [50]}
        ]}));
        at(&mut v, 1.0);
        let version = v.version();
        at(&mut v, 2.0);
        assert_eq!(v.version(), version);
        at(&mut v, 11.0);
        assert_eq!(v.version(), version + 1);
    }
}
