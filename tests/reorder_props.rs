//! Property-based invariant tests for layout and drag reordering.
//!
//! 1. Display indices stay permutations under any drag sequence.
//! 2. A committed restyle reproduces the dragged order on the owner's model.
//! 3. Band and path counts add up to category and dimension counts.
//! 4. Ribbons are always closed outlines.
//! 5. Layout is idempotent on an unchanged model.
//! 6. Bundled colors never split into two bands within one category.

use parcats_rs::chart::{ChartEvent, ParcatsChart};
use parcats_rs::config::Config;
use parcats_rs::ir::Margin;
use parcats_rs::layout::compute_trace_view;
use parcats_rs::layout::geometry::build_ribbon;
use parcats_rs::{FigureLayout, Model, TraceSpec, TraceView};
use proptest::prelude::*;
use serde_json::json;

// ── Helpers ─────────────────────────────────────────────────────────────

const COLORS: [&str; 3] = ["red", "green", "blue"];

#[derive(Debug, Clone)]
struct Records {
    num_dims: usize,
    routes: Vec<Vec<usize>>,
    counts: Vec<u8>,
    colors: Vec<usize>,
    bundlecolors: bool,
    backward: bool,
}

fn records_strategy() -> impl Strategy<Value = Records> {
    (1usize..=4, 1usize..=24, any::<bool>(), any::<bool>()).prop_flat_map(
        |(num_dims, num_records, bundlecolors, backward)| {
            (
                prop::collection::vec(prop::collection::vec(0usize..4, num_dims), num_records),
                prop::collection::vec(0u8..5, num_records),
                prop::collection::vec(0usize..COLORS.len(), num_records),
            )
                .prop_map(move |(routes, counts, colors)| Records {
                    num_dims,
                    routes,
                    counts,
                    colors,
                    bundlecolors,
                    backward,
                })
        },
    )
}

fn model_from(records: &Records) -> Model {
    let dimensions: Vec<_> = (0..records.num_dims)
        .map(|d| {
            json!({
                "label": format!("D{d}"),
                "values": records.routes.iter().map(|r| format!("c{}", r[d])).collect::<Vec<_>>(),
            })
        })
        .collect();
    let sortpaths = if records.backward { "backward" } else { "forward" };
    let spec: TraceSpec = serde_json::from_value(json!({
        "dimensions": dimensions,
        "counts": records.counts.iter().map(|&c| f64::from(c)).collect::<Vec<_>>(),
        "line": {"color": records.colors.iter().map(|&c| COLORS[c]).collect::<Vec<_>>()},
        "bundlecolors": records.bundlecolors,
        "sortpaths": sortpaths,
    }))
    .expect("generated spec");
    Model::from_spec(&spec).expect("generated model")
}

fn figure() -> FigureLayout {
    FigureLayout {
        width: 480.0,
        height: 320.0,
        margin: Margin {
            l: 0.0,
            r: 0.0,
            t: 0.0,
            b: 0.0,
        },
    }
}

fn layout(model: &Model) -> TraceView {
    compute_trace_view(model, &figure(), &Config::default().layout, None)
}

fn is_permutation(inds: &[usize]) -> bool {
    let mut sorted = inds.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &v)| i == v)
}

fn assert_permutations(model: &Model) -> Result<(), TestCaseError> {
    prop_assert!(is_permutation(&model.dimension_display_inds()));
    for dim in &model.dimensions {
        prop_assert!(
            is_permutation(&dim.category_display_inds()),
            "dimension {} has {:?}",
            dim.label,
            dim.category_display_inds()
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct Gesture {
    dimension: usize,
    category: Option<usize>,
    moves: Vec<(i16, i16)>,
}

fn gesture_strategy() -> impl Strategy<Value = Gesture> {
    (
        0usize..4,
        prop::option::of(0usize..4),
        prop::collection::vec((-120i16..=120, -120i16..=120), 0..8),
    )
        .prop_map(|(dimension, category, moves)| Gesture {
            dimension,
            category,
            moves,
        })
}

/// Start point of a gesture: the middle of the chosen category, or the gap
/// above the first category for a pure dimension drag.
fn press_point(view: &TraceView, gesture: &Gesture) -> (f32, f32) {
    let dim = &view.dimensions[gesture.dimension % view.dimensions.len()];
    let x = dim.x + dim.width / 2.0;
    let y = match gesture.category {
        Some(c) => {
            let cat = &dim.categories[c % dim.categories.len()];
            cat.y + cat.height / 2.0
        }
        None => -50.0,
    };
    (x, y)
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Permutation invariant
// 2. Committed restyle reproduces the drag
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn drags_keep_display_indices_permutations(
        records in records_strategy(),
        gestures in prop::collection::vec(gesture_strategy(), 1..4),
    ) {
        let model = model_from(&records);
        let mut owner = model.clone();
        let mut chart = ParcatsChart::new(model, Config::default(), figure(), 0, Vec::new());

        for gesture in &gestures {
            let (mut x, mut y) = press_point(chart.view(), gesture);
            chart.pointer_down(x, y);
            for &(dx, dy) in &gesture.moves {
                x += f32::from(dx);
                y += f32::from(dy);
                chart.pointer_move(x, y);
                assert_permutations(chart.model())?;
            }
            chart.pointer_up(x, y);
            prop_assert!(!chart.is_dragging());
            assert_permutations(chart.model())?;

            for event in chart.sink_mut().drain(..) {
                if let ChartEvent::Restyle(update) = event {
                    owner.apply_restyle(&update);
                }
            }
            prop_assert_eq!(owner.dimension_display_inds(), chart.model().dimension_display_inds());
            for (mine, theirs) in owner.dimensions.iter().zip(&chart.model().dimensions) {
                prop_assert_eq!(mine.category_display_inds(), theirs.category_display_inds());
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Count conservation
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn counts_are_conserved(records in records_strategy()) {
        let model = model_from(&records);
        let view = layout(&model);
        let path_total: f64 = view.paths.iter().map(|p| p.count).sum();
        for dim in &view.dimensions {
            prop_assert!((path_total - dim.count).abs() < 1e-9);
            for cat in &dim.categories {
                let banded: f64 = cat.bands.iter().map(|b| b.count).sum();
                prop_assert!(
                    (banded - cat.count).abs() < 1e-9,
                    "category {} bands sum to {}, expected {}",
                    cat.label,
                    banded,
                    cat.count
                );
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Geometry closure
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn ribbons_are_closed(
        columns in prop::collection::vec((0.0f32..100.0, 0.0f32..400.0), 1..6),
        width in 0.0f32..40.0,
        thickness in prop_oneof![Just(0.0f32), 0.0f32..60.0],
        curvature in 0.0f32..=1.0,
    ) {
        let mut left_xs = Vec::with_capacity(columns.len());
        let mut x = 0.0;
        for (gap, _) in &columns {
            left_xs.push(x);
            x += width + gap;
        }
        let top_ys: Vec<f32> = columns.iter().map(|(_, y)| *y).collect();
        let widths = vec![width; columns.len()];
        let outline = build_ribbon(&left_xs, &top_ys, &widths, thickness, curvature);
        prop_assert!(outline.is_closed(), "open outline: {}", outline.to_svg_path());
        prop_assert_eq!(outline.start(), Some((left_xs[0], top_ys[0])));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn layout_is_idempotent(records in records_strategy()) {
        let model = model_from(&records);
        let first = layout(&model);
        let second = layout(&model);
        prop_assert_eq!(first.paths.len(), second.paths.len());
        for (a, b) in first.paths.iter().zip(&second.paths) {
            prop_assert_eq!(&a.key, &b.key);
            prop_assert_eq!(&a.svg_d, &b.svg_d);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Bundling
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn bundled_colors_form_one_band_per_category(mut records in records_strategy()) {
        records.bundlecolors = true;
        let model = model_from(&records);
        let view = layout(&model);
        for cat in view.dimensions.iter().flat_map(|d| &d.categories) {
            let mut seen: Vec<&str> = Vec::new();
            for band in &cat.bands {
                prop_assert!(
                    !seen.contains(&band.color.as_str()),
                    "color {} split inside {}",
                    band.color,
                    cat.label
                );
                seen.push(&band.color);
            }
        }
    }
}
