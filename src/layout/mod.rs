mod dimension;
pub mod geometry;
mod paths;
mod types;

pub use geometry::{PathCommand, RibbonOutline, build_ribbon, ribbon_top_at};
pub use types::*;

use dimension::compute_dimension_views;
use paths::compute_path_views;

use crate::config::LayoutConfig;
use crate::ir::{Domain, FigureLayout, Model};

/// Pixel rectangle of a trace inside the figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Places a trace's domain inside the plot area of the figure (figure size
/// minus margins).
pub fn trace_rect(domain: &Domain, figure: &FigureLayout) -> TraceRect {
    let margin = figure.margin;
    let plot_w = (figure.width - margin.l - margin.r).max(0.0);
    let plot_h = (figure.height - margin.t - margin.b).max(0.0);
    let [x0, x1] = domain.x;
    let [y0, y1] = domain.y;
    TraceRect {
        x: x0 * plot_w + margin.l,
        y: plot_h - y1 * plot_h + margin.t,
        width: (plot_w * (x1 - x0)).floor().max(0.0),
        height: (plot_h * (y1 - y0)).floor().max(0.0),
    }
}

/// Full layout pass: dimensions, categories, bands and path ribbons.
pub fn compute_trace_view(
    model: &Model,
    figure: &FigureLayout,
    config: &LayoutConfig,
    drag_dimension: Option<usize>,
) -> TraceView {
    let rect = trace_rect(&model.settings.domain, figure);
    let mut dimensions = compute_dimension_views(model, rect.width, rect.height, config);
    let (paths, color_totals) = compute_path_views(model, &mut dimensions, config);
    let settings = &model.settings;

    tracing::debug!(
        trace = %settings.uid,
        dimensions = dimensions.len(),
        width = rect.width,
        height = rect.height,
        "computed trace view"
    );

    TraceView {
        key: settings.uid.clone(),
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        hovermode: settings.hovermode,
        tooltip: settings.tooltip,
        bundlecolors: settings.bundlecolors,
        sortpaths: settings.sortpaths,
        path_shape: settings.path_shape,
        drag_dimension,
        total_count: model.count,
        dimensions,
        paths,
        color_totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        Category, Dimension, Margin, PathModel, RawColor, SortPaths, TraceSettings,
    };

    fn dim(idx: usize, label: &str, counts: &[f64]) -> Dimension {
        Dimension {
            dimension_ind: idx,
            display_ind: idx,
            label: label.to_string(),
            categories: counts
                .iter()
                .enumerate()
                .map(|(cat_idx, &count)| Category {
                    category_ind: cat_idx,
                    display_ind: cat_idx,
                    label: format!("{}{}", label.to_lowercase(), cat_idx + 1),
                    count,
                    drag_y: None,
                })
                .collect(),
            count: counts.iter().sum(),
            drag_x: None,
        }
    }

    fn path(route: &[usize], values: &[usize], count: f64, color: &str) -> PathModel {
        PathModel {
            category_inds: route.to_vec(),
            value_inds: values.to_vec(),
            count,
            color: color.to_string(),
            raw_color: RawColor::Name(color.to_string()),
        }
    }

    /// A: {a1: 3, a2: 1}, B: {b1: 2, b2: 2}.
    fn scenario(settings: TraceSettings) -> Model {
        Model::new(
            settings,
            vec![dim(0, "A", &[3.0, 1.0]), dim(1, "B", &[2.0, 2.0])],
            vec![
                path(&[0, 0], &[0, 1], 2.0, "red"),
                path(&[0, 1], &[2], 1.0, "blue"),
                path(&[1, 1], &[3], 1.0, "blue"),
            ],
        )
    }

    fn figure() -> FigureLayout {
        FigureLayout {
            width: 400.0,
            height: 108.0,
            margin: Margin {
                l: 0.0,
                r: 0.0,
                t: 0.0,
                b: 0.0,
            },
        }
    }

    #[test]
    fn trace_rect_applies_domain_and_margin() {
        let figure = FigureLayout {
            width: 1000.0,
            height: 600.0,
            margin: Margin::default(),
        };
        let domain = Domain {
            x: [0.5, 1.0],
            y: [0.0, 0.5],
        };
        let rect = trace_rect(&domain, &figure);
        assert_eq!(rect.width, 420.0);
        assert_eq!(rect.height, 210.0);
        assert_eq!(rect.x, 500.0);
        assert_eq!(rect.y, 310.0);
    }

    #[test]
    fn category_and_band_heights_follow_counts() {
        let model = scenario(TraceSettings::default());
        let view = compute_trace_view(&model, &figure(), &LayoutConfig::default(), None);
        let available: f32 = 108.0 - 8.0;
        let a1 = &view.dimensions[0].categories[0];
        assert_eq!(a1.height, available * 0.75);
        assert_eq!(a1.bands.len(), 2);
        assert_eq!(a1.bands[1].height / a1.bands[0].height, 2.0);
        let band_total: f64 = a1.bands.iter().map(|b| b.count).sum();
        assert_eq!(band_total, a1.count);
        assert_eq!(view.color_total("blue"), 2.0);
    }

    #[test]
    fn bundling_keeps_same_colored_bands_contiguous() {
        let model = scenario(TraceSettings::default());
        let view = compute_trace_view(&model, &figure(), &LayoutConfig::default(), None);
        let b2 = &view.dimensions[1].categories[1];
        assert_eq!(b2.bands.len(), 1);
        assert_eq!(b2.bands[0].count, 2.0);
    }

    #[test]
    fn without_bundling_order_follows_display_indices() {
        let routes = |settings: TraceSettings| -> Vec<Vec<usize>> {
            let mut model = scenario(settings);
            model.paths.push(path(&[1, 0], &[4], 0.0, "red"));
            let view = compute_trace_view(&model, &figure(), &LayoutConfig::default(), None);
            view.paths.iter().map(|p| p.key.route.clone()).collect()
        };
        let forward = routes(TraceSettings {
            bundlecolors: false,
            ..TraceSettings::default()
        });
        assert_eq!(forward, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);

        let backward = routes(TraceSettings {
            bundlecolors: false,
            sortpaths: SortPaths::Backward,
            ..TraceSettings::default()
        });
        assert_eq!(backward, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
    }

    #[test]
    fn relayout_is_idempotent() {
        let model = scenario(TraceSettings::default());
        let config = LayoutConfig::default();
        let first = compute_trace_view(&model, &figure(), &config, None);
        let second = compute_trace_view(&model, &figure(), &config, None);
        let first_d: Vec<&str> = first.paths.iter().map(|p| p.svg_d.as_str()).collect();
        let second_d: Vec<&str> = second.paths.iter().map(|p| p.svg_d.as_str()).collect();
        assert_eq!(first_d, second_d);
    }

    #[test]
    fn invalid_routes_are_skipped() {
        let mut model = scenario(TraceSettings::default());
        model.paths.push(path(&[0, 7], &[9], 1.0, "red"));
        model.paths.push(path(&[0], &[10], 1.0, "red"));
        let view = compute_trace_view(&model, &figure(), &LayoutConfig::default(), None);
        assert_eq!(view.paths.len(), 3);
    }

    #[test]
    fn zero_total_count_produces_flat_ribbons() {
        let model = Model::new(
            TraceSettings::default(),
            vec![dim(0, "A", &[0.0]), dim(1, "B", &[0.0])],
            vec![path(&[0, 0], &[0], 0.0, "red")],
        );
        let view = compute_trace_view(&model, &figure(), &LayoutConfig::default(), None);
        assert_eq!(view.paths[0].height, 0.0);
        assert!(view.paths[0].outline.is_closed());
        assert!(!view.paths[0].svg_d.contains("NaN"));
    }
}
