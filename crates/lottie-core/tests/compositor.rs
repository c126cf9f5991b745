//! Layer compositing checked through the recording surface.
//!
//! Run with: cargo test -p lottie-core --test compositor

use lottie_core::layer::BlendMode;
use lottie_core::{
    Bitmap, Brush, Color, Composition, CompositionRenderer, DrawCommand, ImageAsset, ImageProvider,
    MaskComposite, ParseWarning, RecordingSurface,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn solid(ind: u32, color: &str, extra: Value) -> Value {
    let mut layer = json!({
        "ty": 1, "ind": ind, "ip": 0, "op": 60, "sc": color, "sw": 100, "sh": 100, "ks": {}
    });
    if let (Some(layer), Some(extra)) = (layer.as_object_mut(), extra.as_object()) {
        layer.extend(extra.clone());
    }
    layer
}

fn composition(layers: Value, assets: Value) -> Arc<Composition> {
    Arc::new(
        Composition::from_value(json!({
            "fr": 30, "ip": 0, "op": 60, "w": 100, "h": 100,
            "layers": layers,
            "assets": assets
        }))
        .expect("fixture parses"),
    )
}

fn render(comp: &Arc<Composition>, frame: f32) -> RecordingSurface {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    let mut surface = RecordingSurface::new();
    CompositionRenderer::new(comp.clone()).draw_frame(&mut surface, frame);
    assert_eq!(surface.depth(), 0, "save/restore must balance");
    surface
}

fn fill_colors(surface: &RecordingSurface) -> Vec<Color> {
    surface
        .fills()
        .filter_map(|(_, style, _)| match style.brush {
            Brush::Solid(c) => Some(c),
            _ => None,
        })
        .filter(|c| *c != Color::WHITE && c.a > 0.0)
        .collect()
}

const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
const GREEN: Color = Color::rgba(0.0, 1.0, 0.0, 1.0);
const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

mod mattes {
    use super::*;

    #[test]
    fn matted_layer_consumes_the_layer_listed_before_it() {
        let comp = composition(
            json!([
                solid(1, "#ff0000", json!({"td": 1})),
                solid(2, "#0000ff", json!({"tt": 1})),
                solid(3, "#00ff00", json!({}))
            ]),
            json!([]),
        );
        let surface = render(&comp, 0.0);

        // Bottom layer first; the source only appears inside the matte layer.
        assert_eq!(fill_colors(&surface), vec![GREEN, BLUE, RED]);
        let matte_at = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::SaveLayer(p) if p.composite == Some(MaskComposite::DestinationIn)))
            .expect("matte layer");
        let red_at = surface
            .commands
            .iter()
            .position(|c| matches!(c, DrawCommand::Fill { style, .. } if style.brush == Brush::Solid(RED)))
            .expect("source drawn");
        assert!(matte_at < red_at);
    }

    #[test]
    fn inverted_matte_uses_destination_out() {
        let comp = composition(
            json!([solid(1, "#ff0000", json!({"td": 1})), solid(2, "#0000ff", json!({"tt": 2}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        assert!(surface
            .layers()
            .any(|l| l.composite == Some(MaskComposite::DestinationOut)));
    }

    #[test]
    fn luma_matte_uses_luma_composite() {
        let comp = composition(
            json!([solid(1, "#ff0000", json!({"td": 1})), solid(2, "#0000ff", json!({"tt": 3}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        assert!(surface.layers().any(|l| l.composite == Some(MaskComposite::LumaIn)));
    }

    #[test]
    fn source_without_consumer_draws_normally() {
        let comp = composition(
            json!([solid(1, "#0000ff", json!({})), solid(2, "#ff0000", json!({"td": 1}))]),
            json!([]),
        );
        assert_eq!(fill_colors(&render(&comp, 0.0)), vec![RED, BLUE]);
    }

    #[test]
    fn hidden_source_still_masks() {
        let comp = composition(
            json!([
                solid(1, "#ff0000", json!({"td": 1, "hd": true})),
                solid(2, "#0000ff", json!({"tt": 1}))
            ]),
            json!([]),
        );
        assert_eq!(fill_colors(&render(&comp, 0.0)), vec![BLUE, RED]);
    }
}

mod masks {
    use super::*;

    fn square(mode: &str, inverted: bool) -> Value {
        json!({
            "mode": mode, "inv": inverted, "o": {"k": 100},
            "pt": {"k": {"c": true, "v": [[0, 0], [50, 0], [50, 50], [0, 50]]}}
        })
    }

    #[test]
    fn masks_combine_inside_a_destination_in_layer() {
        let comp = composition(
            json!([solid(1, "#0000ff", json!({"masksProperties": [square("a", false), square("s", false)]}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        let composites: Vec<_> = surface.layers().map(|l| l.composite).collect();
        assert_eq!(
            composites,
            vec![
                None,
                Some(MaskComposite::DestinationIn),
                Some(MaskComposite::DestinationOut)
            ]
        );
    }

    #[test]
    fn leading_subtract_starts_from_full_coverage() {
        let comp = composition(
            json!([solid(1, "#0000ff", json!({"masksProperties": [square("s", false)]}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        let whites: Vec<_> = surface
            .fills()
            .filter(|(_, s, _)| s.brush == Brush::Solid(Color::WHITE))
            .collect();
        assert_eq!(whites.len(), 2);
        // The first white fill covers the whole canvas.
        assert_eq!(kurbo::Shape::bounding_box(whites[0].0).width(), 100.0);
    }

    #[test]
    fn inverted_mask_fills_the_complement_even_odd() {
        let comp = composition(
            json!([solid(1, "#0000ff", json!({"masksProperties": [square("a", true)]}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        let (_, style, _) = surface
            .fills()
            .find(|(_, s, _)| s.brush == Brush::Solid(Color::WHITE))
            .expect("mask fill");
        assert_eq!(style.rule, lottie_core::FillRule::EvenOdd);
    }

    #[test]
    fn blending_modes_draw_as_add_with_one_warning() {
        let comp = composition(
            json!([
                solid(1, "#0000ff", json!({"masksProperties": [square("l", false), square("f", false)]})),
                solid(2, "#00ff00", json!({"masksProperties": [square("l", false)]}))
            ]),
            json!([]),
        );
        let warnings = comp.warnings();
        let lighten = ParseWarning::UnsupportedMaskMode {
            mode: lottie_core::layer::MaskMode::Lighten,
        };
        assert_eq!(warnings.iter().filter(|w| **w == lighten).count(), 1);
        assert!(warnings.contains(&ParseWarning::UnsupportedMaskMode {
            mode: lottie_core::layer::MaskMode::Difference,
        }));

        let surface = render(&comp, 0.0);
        assert!(surface.layers().all(|l| l.composite != Some(MaskComposite::DestinationOut)));
    }

    #[test]
    fn mode_none_is_ignored() {
        let comp = composition(
            json!([solid(1, "#0000ff", json!({"masksProperties": [square("n", false)]}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        assert_eq!(
            surface
                .fills()
                .filter(|(_, s, _)| s.brush == Brush::Solid(Color::WHITE))
                .count(),
            0
        );
    }
}

mod layers {
    use super::*;

    #[test]
    fn parent_transforms_compose() {
        let comp = composition(
            json!([
                {"ty": 3, "ind": 1, "ip": 0, "op": 60, "ks": {"p": {"k": [100, 0]}}},
                solid(2, "#ff0000", json!({"parent": 1, "ks": {"p": {"k": [10, 0]}}}))
            ]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        let (_, _, transform) = surface.fills().next().expect("solid drawn");
        assert_eq!(transform.translation().x, 110.0);
    }

    #[test]
    fn layers_outside_their_window_are_skipped() {
        let comp = composition(json!([solid(1, "#ff0000", json!({"ip": 10, "op": 20}))]), json!([]));
        assert!(fill_colors(&render(&comp, 5.0)).is_empty());
        assert_eq!(fill_colors(&render(&comp, 10.0)), vec![RED]);
        assert!(fill_colors(&render(&comp, 20.0)).is_empty());
    }

    #[test]
    fn layer_opacity_isolates_the_layer() {
        let comp = composition(json!([solid(1, "#ff0000", json!({"ks": {"o": {"k": 40}}}))]), json!([]));
        let surface = render(&comp, 0.0);
        let opacity = surface.layers().next().map(|l| l.opacity);
        assert!(opacity.is_some_and(|o| (o - 0.4).abs() < 1e-6));
    }

    #[test]
    fn unsupported_blend_mode_falls_back_and_warns_once() {
        let comp = composition(
            json!([solid(1, "#ff0000", json!({"bm": 1})), solid(2, "#00ff00", json!({"bm": 1}))]),
            json!([]),
        );
        let surface = render(&comp, 0.0);
        assert!(surface.layers().all(|l| l.blend == BlendMode::Normal));
        let warnings = comp.warnings();
        let count = warnings
            .iter()
            .filter(|w| matches!(w, ParseWarning::UnsupportedBlendMode { .. }))
            .count();
        assert_eq!(count, 1);

        let mut capable = RecordingSurface::new().with_blend_modes();
        CompositionRenderer::new(comp.clone()).draw(&mut capable, 0.0);
        assert!(capable.layers().any(|l| l.blend == BlendMode::Multiply));
    }

    #[test]
    fn composition_bounds_clip_the_frame() {
        let comp = composition(json!([]), json!([]));
        let surface = render(&comp, 0.0);
        assert!(matches!(surface.commands.get(1), Some(DrawCommand::Clip { .. })));
    }
}

mod precomps {
    use super::*;

    fn assets() -> Value {
        json!([{
            "id": "comp_0",
            "layers": [solid(1, "#ff0000", json!({"ip": 0, "op": 10}))]
        }])
    }

    #[test]
    fn children_see_the_shifted_local_frame() {
        let comp = composition(
            json!([{"ty": 0, "ind": 1, "ip": 0, "op": 60, "st": 5, "refId": "comp_0", "w": 50, "h": 50, "ks": {}}]),
            assets(),
        );
        assert_eq!(fill_colors(&render(&comp, 8.0)), vec![RED]);
        assert!(fill_colors(&render(&comp, 20.0)).is_empty());
    }

    #[test]
    fn time_remap_drives_the_child_clock() {
        let comp = composition(
            json!([{
                "ty": 0, "ind": 1, "ip": 0, "op": 60, "refId": "comp_0", "w": 50, "h": 50, "ks": {},
                "tm": {"a": 0, "k": 0.1}
            }]),
            assets(),
        );
        // 0.1 s at 30 fps is frame 3 regardless of the root frame.
        assert_eq!(fill_colors(&render(&comp, 40.0)), vec![RED]);
    }

    #[test]
    fn precomps_clip_to_their_size() {
        let comp = composition(
            json!([{"ty": 0, "ind": 1, "ip": 0, "op": 60, "refId": "comp_0", "w": 50, "h": 50, "ks": {}}]),
            assets(),
        );
        let surface = render(&comp, 0.0);
        let clips: Vec<_> = surface
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Clip { path, .. } => Some(kurbo::Shape::bounding_box(path)),
                _ => None,
            })
            .collect();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[1].width(), 50.0);
    }

    #[test]
    fn missing_precomp_draws_nothing_and_warns() {
        let comp = composition(
            json!([{"ty": 0, "ind": 1, "ip": 0, "op": 60, "refId": "nope", "ks": {}}]),
            json!([]),
        );
        assert!(fill_colors(&render(&comp, 0.0)).is_empty());
        assert!(comp
            .warnings()
            .contains(&ParseWarning::MissingAsset { id: "nope".into() }));
    }
}

mod images {
    use super::*;

    struct OnePixel;

    impl ImageProvider for OnePixel {
        fn load(&self, _asset: &ImageAsset) -> Option<Arc<Bitmap>> {
            Bitmap::from_rgba8(1, 1, vec![255, 0, 0, 255]).map(Arc::new)
        }
    }

    fn comp() -> Arc<Composition> {
        composition(
            json!([{"ty": 2, "ind": 1, "ip": 0, "op": 60, "refId": "img_0", "ks": {}}]),
            json!([{"id": "img_0", "w": 20, "h": 10, "u": "images/", "p": "img_0.png"}]),
        )
    }

    #[test]
    fn empty_slot_renders_nothing() {
        let comp = comp();
        let surface = render(&comp, 0.0);
        assert!(!surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::Bitmap { .. })));
        assert!(comp
            .warnings()
            .contains(&ParseWarning::MissingAsset { id: "img_0".into() }));
    }

    #[test]
    fn provider_results_are_published_into_the_slot() {
        let comp = comp();
        let renderer = CompositionRenderer::new(comp.clone()).with_image_provider(Arc::new(OnePixel));
        let mut surface = RecordingSurface::new();
        renderer.draw(&mut surface, 0.0);
        let dst = surface.commands.iter().find_map(|c| match c {
            DrawCommand::Bitmap { dst, .. } => Some(*dst),
            _ => None,
        });
        assert_eq!(dst, Some(kurbo::Rect::new(0.0, 0.0, 20.0, 10.0)));
        assert!(comp.image("img_0").and_then(|i| i.bitmap()).is_some());
    }
}

mod text {
    use super::*;

    fn comp(fonts: Value) -> Arc<Composition> {
        Arc::new(
            Composition::from_value(json!({
                "fr": 30, "ip": 0, "op": 60, "w": 100, "h": 100,
                "fonts": fonts,
                "layers": [{
                    "ty": 5, "ind": 1, "ip": 0, "op": 60, "ks": {},
                    "t": {"d": {"k": [{"t": 0, "s": {"t": "Hi\rthere", "f": "Sans-Bold", "s": 12, "fc": [1, 0, 0]}}]}}
                }]
            }))
            .expect("fixture parses"),
        )
    }

    #[test]
    fn without_glyphs_text_becomes_runs() {
        let comp = comp(json!({"list": [{"fName": "Sans-Bold", "fFamily": "Sans", "fStyle": "Bold"}]}));
        let surface = render(&comp, 0.0);
        let runs: Vec<_> = surface
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(run) => Some(run),
                _ => None,
            })
            .collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].family, "Sans");
        assert_eq!(runs[1].text, "there");
        assert_eq!(runs[0].color, RED);
    }

    #[test]
    fn undeclared_font_warns_and_falls_back_to_its_name() {
        let comp = comp(json!({"list": []}));
        let surface = render(&comp, 0.0);
        let family = surface.commands.iter().find_map(|c| match c {
            DrawCommand::Text(run) => Some(run.family.clone()),
            _ => None,
        });
        assert_eq!(family.as_deref(), Some("Sans-Bold"));
        assert!(comp.warnings().contains(&ParseWarning::MissingFont {
            name: "Sans-Bold".into()
        }));
    }
}
