//! Behavioural fixtures for parsing, interpolation and playback.
//!
//! Run with: cargo test -p lottie-core --test fixtures

use lottie_core::gradient::merge_stop_positions;
use lottie_core::{
    AnimatableValue, Brush, Color, Composition, CompositionRenderer, LottiePlayer, ParseConfig,
    ParseError, ParseWarning, PathMismatchPolicy, PlaybackEvent, PlayerConfig, RecordingSurface,
    RepeatMode, ShapeData,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn shape_doc(shapes: Value) -> Value {
    json!({
        "v": "5.5.0", "fr": 60, "ip": 0, "op": 60, "w": 500, "h": 500, "nm": "Test",
        "layers": [{
            "ty": 4, "ind": 1, "ip": 0, "op": 60, "st": 0, "nm": "Shape Layer",
            "ks": {
                "o": {"a": 0, "k": 100},
                "p": {"a": 0, "k": [250, 250, 0]},
                "s": {"a": 0, "k": [100, 100, 100]}
            },
            "shapes": shapes
        }]
    })
}

mod interpolation {
    use super::*;

    #[test]
    fn piecewise_linear_fixture() {
        let value = AnimatableValue::linear([(0.0, 0.0), (0.5, 1.0), (1.0, 10.0)]).unwrap();
        let samples: Vec<f32> = [0.0, 0.25, 0.5, 0.75, 1.0]
            .iter()
            .map(|p| value.evaluate(*p))
            .collect();
        assert_eq!(samples, vec![0.0, 0.5, 1.0, 5.5, 10.0]);
    }

    #[test]
    fn evaluation_is_repeatable_and_clamped() {
        let value = AnimatableValue::linear([(0.2, 3.0), (0.8, 9.0)]).unwrap();
        // Out of order queries must not disturb the segment cursor.
        for p in [0.7, 0.3, 0.7, 0.1, 0.9] {
            assert_eq!(value.evaluate(p), value.evaluate(p));
        }
        assert_eq!(value.evaluate(-1.0), 3.0);
        assert_eq!(value.evaluate(0.0), 3.0);
        assert_eq!(value.evaluate(1.0), 9.0);
        assert_eq!(value.evaluate(2.0), 9.0);
    }

    #[test]
    fn gradient_stop_merge_fixture() {
        assert_eq!(merge_stop_positions(&[1.0, 2.0], &[1.0, 2.0]), vec![1.0, 2.0]);
        assert_eq!(merge_stop_positions(&[1.0, 2.0], &[3.0, 4.0]), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(merge_stop_positions(&[1.0, 2.0], &[2.0, 3.0]), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn color_midpoint_follows_hue() {
        let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
        let blue = Color::rgba(0.0, 0.0, 1.0, 1.0);
        let value = AnimatableValue::linear([(0.0, red), (1.0, blue)]).unwrap();
        let mid = value.evaluate(0.5);
        // Magenta at full value, not the dim RGB average (0.5, 0, 0.5).
        assert!((mid.r - 1.0).abs() < 1e-4);
        assert!(mid.g.abs() < 1e-4);
        assert!((mid.b - 1.0).abs() < 1e-4);
    }

    #[test]
    fn spatial_motion_moves_by_arc_length() {
        let comp = Composition::from_value(json!({
            "fr": 10, "ip": 0, "op": 10, "w": 100, "h": 100,
            "layers": [{
                "ty": 3, "ind": 1, "ip": 0, "op": 10,
                "ks": {"p": {"a": 1, "k": [
                    {"t": 0, "s": [0, 0], "to": [0, -50], "ti": [0, -50]},
                    {"t": 10, "s": [100, 0]}
                ]}}
            }]
        }))
        .unwrap();
        let transform = &comp.root.layers[0].transform;
        let mid = transform.matrix(0.5).translation();
        // Symmetric arch: halfway along the arc is the apex, not the chord midpoint.
        assert!((mid.x - 50.0).abs() < 0.5);
        assert!(mid.y < -30.0);
    }

    #[test]
    fn same_time_keyframes_jump_instantly() {
        let comp = Composition::from_value(json!({
            "fr": 10, "ip": 0, "op": 20, "w": 100, "h": 100,
            "layers": [{
                "ty": 3, "ind": 1, "ip": 0, "op": 20,
                "ks": {"o": {"a": 1, "k": [
                    {"t": 0, "s": [0]},
                    {"t": 10, "s": [50]},
                    {"t": 10, "s": [100]},
                    {"t": 20, "s": [100]}
                ]}}
            }]
        }))
        .unwrap();
        let opacity = &comp.root.layers[0].transform.opacity;
        assert_eq!(opacity.keyframes().len(), 4);
        assert_eq!(opacity.evaluate(0.25), 25.0);
        assert_eq!(opacity.evaluate(0.5), 100.0);
        assert_eq!(opacity.evaluate(0.75), 100.0);
    }

    #[test]
    fn mismatched_paths_hold_the_start_shape() {
        let tri = json!({"c": true, "v": [[0, 0], [10, 0], [5, 10]]});
        let quad = json!({"c": true, "v": [[0, 0], [10, 0], [10, 10], [0, 10]]});
        let doc = shape_doc(json!([
            {"ty": "sh", "ks": {"a": 1, "k": [{"t": 0, "s": [tri]}, {"t": 60, "s": [quad]}]}},
            {"ty": "fl", "c": {"k": [1, 0, 0, 1]}, "o": {"k": 100}}
        ]));
        let comp = Arc::new(Composition::from_value(doc.clone()).unwrap());
        assert!(comp
            .warnings()
            .contains(&ParseWarning::PathVertexMismatch { start: 3, end: 4 }));

        let mut surface = RecordingSurface::new();
        CompositionRenderer::new(comp).draw(&mut surface, 0.5);
        let (path, _, _) = surface.fills().next().unwrap();
        assert_eq!(kurbo::Shape::bounding_box(path).height(), 10.0);
        assert_eq!(lottie_core::geometry::subpaths(path)[0].vertex_count(), 3);

        let model = serde_json::from_value(doc).unwrap();
        let config = ParseConfig {
            path_mismatch: PathMismatchPolicy::Resample,
            ..ParseConfig::default()
        };
        let resampled = Composition::from_model(model, &config).unwrap();
        let mut surface = RecordingSurface::new();
        CompositionRenderer::new(Arc::new(resampled)).draw(&mut surface, 0.5);
        let (path, _, _) = surface.fills().next().unwrap();
        let shape: &ShapeData = &lottie_core::geometry::subpaths(path)[0];
        assert_eq!(shape.vertex_count(), 4);
    }
}

mod parsing {
    use super::*;

    #[test]
    fn structural_errors_are_fatal() {
        assert!(matches!(Composition::from_json("{"), Err(ParseError::Json(_))));
        let no_rate = json!({"fr": 0, "ip": 0, "op": 10, "w": 1, "h": 1, "layers": []});
        assert!(matches!(
            Composition::from_value(no_rate),
            Err(ParseError::InvalidField { field: "fr", .. })
        ));
        let empty_range = json!({"fr": 30, "ip": 10, "op": 10, "w": 1, "h": 1, "layers": []});
        assert!(Composition::from_value(empty_range).is_err());
    }

    #[test]
    fn bad_layer_reports_its_index() {
        let doc = json!({
            "fr": 30, "ip": 0, "op": 10, "w": 1, "h": 1,
            "layers": [
                {"ty": 3, "ip": 0, "op": 10},
                {"ty": 0, "ip": 0, "op": 10}
            ]
        });
        match Composition::from_value(doc) {
            Err(ParseError::Layer { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected a layer error, got {other:?}"),
        }
    }

    #[test]
    fn expressions_warn_and_keep_static_values() {
        let doc = shape_doc(json!([
            {"ty": "rc", "p": {"k": [0, 0]}, "s": {"k": [10, 10], "x": "wiggle(2, 5)"}},
            {"ty": "fl", "c": {"k": [1, 0, 0, 1]}, "o": {"k": 100}}
        ]));
        let comp = Composition::from_value(doc).unwrap();
        assert!(comp
            .warnings()
            .iter()
            .any(|w| matches!(w, ParseWarning::Expression { .. })));
    }

    #[test]
    fn unsupported_items_are_skipped_with_a_warning() {
        let doc = shape_doc(json!([
            {"ty": "rc", "p": {"k": [0, 0]}, "s": {"k": [10, 10]}},
            {"ty": "zz", "r": {"k": 3}},
            {"ty": "fl", "c": {"k": [1, 0, 0, 1]}, "o": {"k": 100}}
        ]));
        let comp = Arc::new(Composition::from_value(doc).unwrap());
        assert!(comp
            .warnings()
            .contains(&ParseWarning::UnsupportedShape { ty: "zz".into() }));
        let mut surface = RecordingSurface::new();
        CompositionRenderer::new(comp).draw(&mut surface, 0.0);
        assert_eq!(surface.fills().count(), 1);
    }

    #[test]
    fn missing_parent_is_a_warning_unless_strict() {
        let doc = json!({
            "fr": 30, "ip": 0, "op": 10, "w": 1, "h": 1,
            "layers": [{"ty": 3, "ind": 1, "parent": 9, "ip": 0, "op": 10}]
        });
        let comp = Composition::from_value(doc.clone()).unwrap();
        assert!(comp
            .warnings()
            .contains(&ParseWarning::MissingParent { layer: 1, parent: 9 }));

        let strict = ParseConfig {
            strict_parents: true,
            ..ParseConfig::default()
        };
        assert!(Composition::from_model(serde_json::from_value(doc).unwrap(), &strict).is_err());
    }
}

mod shapes {
    use super::*;

    fn draw(doc: Value, progress: f32) -> RecordingSurface {
        let comp = Arc::new(Composition::from_value(doc).unwrap());
        let mut surface = RecordingSurface::new();
        CompositionRenderer::new(comp).draw(&mut surface, progress);
        surface
    }

    #[test]
    fn repeater_fixture() {
        let doc = shape_doc(json!([
            {"ty": "gr", "it": [
                {"ty": "el", "p": {"k": [0, 0]}, "s": {"k": [20, 20]}},
                {"ty": "fl", "c": {"k": [0, 0, 1, 1]}, "o": {"k": 100}},
                {"ty": "tr"}
            ]},
            {"ty": "rp", "c": {"a": 1, "k": [
                {"t": 0, "s": [3], "h": 1},
                {"t": 30, "s": [5]}
            ]}, "o": {"k": 0}, "tr": {"p": {"k": [30, 0]}, "r": {"k": 0}}}
        ]));
        let early = draw(doc.clone(), 0.0);
        assert_eq!(early.fills().count(), 3);
        let xs: Vec<f64> = early.fills().map(|(_, _, t)| t.translation().x).collect();
        assert_eq!(xs, vec![250.0, 280.0, 310.0]);

        let late = draw(doc, 0.75);
        assert_eq!(late.fills().count(), 5);
    }

    #[test]
    fn trim_fractions_shorten_strokes() {
        let doc = shape_doc(json!([
            {"ty": "sh", "ks": {"k": {"c": false, "v": [[0, 0], [200, 0]]}}},
            {"ty": "st", "c": {"k": [0, 0, 0, 1]}, "o": {"k": 100}, "w": {"k": 4}},
            {"ty": "tm", "s": {"k": 25}, "e": {"k": 75}, "o": {"k": 0}}
        ]));
        let surface = draw(doc, 0.0);
        let (path, style, _) = surface.strokes().next().unwrap();
        let bounds = kurbo::Shape::bounding_box(path);
        assert!((bounds.x0 - 50.0).abs() < 1e-3 && (bounds.x1 - 150.0).abs() < 1e-3);
        assert_eq!(style.width, 4.0);
        assert!(matches!(style.brush, Brush::Solid(_)));
    }

    #[test]
    fn trim_offset_wraps_around_closed_paths() {
        let doc = shape_doc(json!([
            {"ty": "sh", "ks": {"k": {"c": true, "v": [[0, 0], [100, 0], [100, 100], [0, 100]]}}},
            {"ty": "st", "c": {"k": [0, 0, 0, 1]}, "o": {"k": 100}, "w": {"k": 1}},
            {"ty": "tm", "s": {"k": 0}, "e": {"k": 50}, "o": {"k": 270}}
        ]));
        let surface = draw(doc, 0.0);
        let (path, _, _) = surface.strokes().next().unwrap();
        // 75%..125% of the perimeter: the left edge then the top edge.
        let bounds = kurbo::Shape::bounding_box(path);
        assert!((bounds.width() - 100.0).abs() < 1e-3);
        assert!((bounds.height() - 100.0).abs() < 1e-3);
        assert!((kurbo::Shape::perimeter(path, 1e-3) - 200.0).abs() < 1e-2);
    }
}

mod playback {
    use super::*;

    fn player(start: f32, end: f32) -> LottiePlayer {
        let doc = json!({"fr": 10, "ip": start, "op": end, "w": 1, "h": 1, "layers": []});
        LottiePlayer::from_json(&doc.to_string(), &PlayerConfig::default()).unwrap()
    }

    #[test]
    fn min_max_progress_fixture() {
        let mut p = player(31.0, 391.0);
        p.controller_mut().set_min_progress(0.42);
        assert_eq!(p.controller().min_frame(), 182.0);

        let mut p = player(100.0, 200.0);
        p.controller_mut().set_min_progress(0.5);
        assert_eq!(p.controller().min_frame(), 150.0);
    }

    #[test]
    fn long_suspension_yields_one_repeat_event() {
        let mut p = player(0.0, 10.0);
        // An hour at 10 fps over a 10 frame loop, plus half a frame.
        let step = p.advance(3600.05);
        assert_eq!(step.events, vec![PlaybackEvent::Repeat { crossings: 3600 }]);
        assert!((step.frame - 0.5).abs() < 0.05);
    }

    #[test]
    fn bounds_change_mid_reverse_keeps_displayed_frame() {
        let mut p = player(0.0, 100.0);
        p.controller_mut().set_repeat_mode(RepeatMode::Reverse);
        p.advance(12.0); // 120 frames: bounced, now at 80 heading down
        let shown = p.controller().frame();
        assert!((shown - 80.0).abs() < 1e-3);

        p.controller_mut().set_min_and_max_frame(20.0, 90.0);
        assert_eq!(p.controller().frame(), shown);
        p.controller_mut().pause();
        p.controller_mut().resume();
        let next = p.advance(1.0).frame;
        assert!((next - 70.0).abs() < 1e-3);
    }
}
