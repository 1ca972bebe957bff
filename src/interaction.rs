//! Hit-testing, hover/click selections and tooltip statistics.

use serde::Serialize;

use crate::config::{LayoutConfig, StyleConfig};
use crate::ir::HoverMode;
use crate::layout::{BandRef, CategoryRef, TraceView, ribbon_top_at};
use crate::theme::{Theme, most_readable};

const READABLE_CANDIDATES: [&str; 2] = ["black", "white"];

/// One selected record, as reported in hover/click events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRef {
    pub trace_index: usize,
    pub record_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Band(BandRef),
    /// Index into [`TraceView::paths`].
    Path(usize),
}

/// Finds what sits under a trace-local point. Categories are drawn above the
/// ribbons, so bands win; paths are tested topmost first. `paint_order` lists
/// path indices bottom to top.
pub fn hit_test(view: &TraceView, paint_order: &[usize], x: f32, y: f32) -> Option<Hit> {
    for (d, dim) in view.dimensions.iter().enumerate() {
        if x < dim.x || x > dim.x + dim.width {
            continue;
        }
        for (c, cat) in dim.categories.iter().enumerate() {
            let local_y = y - cat.y;
            if local_y < 0.0 || local_y > cat.height {
                continue;
            }
            if let Some(band) = cat
                .bands
                .iter()
                .position(|b| b.y < local_y && local_y <= b.y + b.height)
            {
                let hit = BandRef {
                    category: CategoryRef {
                        dimension: d,
                        category: c,
                    },
                    band,
                };
                tracing::trace!(?hit, "band hit");
                return Some(Hit::Band(hit));
            }
        }
    }

    paint_order.iter().rev().copied().find_map(|idx| {
        let path = view.paths.get(idx)?;
        if path.height <= 0.0 {
            return None;
        }
        let top = ribbon_top_at(&path.left_xs, &path.top_ys, &path.dim_widths, path.curvature, x)?;
        (y >= top && y <= top + path.height).then(|| {
            tracing::trace!(path = %path.key, "path hit");
            Hit::Path(idx)
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Category(CategoryRef),
    Color(BandRef),
    Path(usize),
}

/// Paths and bands affected by a hover or click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Indices into [`TraceView::paths`], in layout order.
    pub paths: Vec<usize>,
    /// Bands to emphasize.
    pub bands: Vec<BandRef>,
    /// Category whose outline is emphasized.
    pub category: Option<CategoryRef>,
}

impl Selection {
    pub fn points(&self, view: &TraceView, trace_index: usize) -> Vec<PointRef> {
        self.paths
            .iter()
            .filter_map(|&idx| view.paths.get(idx))
            .flat_map(|path| {
                path.value_inds.iter().map(move |&record_index| PointRef {
                    trace_index,
                    record_index,
                })
            })
            .collect()
    }
}

fn paths_through(view: &TraceView, at: CategoryRef, color: Option<&str>) -> Vec<usize> {
    let (Some(dim), Some(cat)) = (view.dimensions.get(at.dimension), view.category(at)) else {
        return Vec::new();
    };
    view.paths
        .iter()
        .enumerate()
        .filter(|(_, path)| path.key.route.get(dim.key) == Some(&cat.key))
        .filter(|(_, path)| color.is_none_or(|c| path.color == c))
        .map(|(idx, _)| idx)
        .collect()
}

/// Selection for a band under the pointer. `None` when hovering is disabled.
pub fn select_band(view: &TraceView, at: BandRef, mode: HoverMode) -> Option<Selection> {
    let category = view.category(at.category)?;
    let band = category.bands.get(at.band)?;
    match mode {
        HoverMode::None => None,
        HoverMode::Category => Some(Selection {
            kind: SelectionKind::Category(at.category),
            paths: paths_through(view, at.category, None),
            bands: Vec::new(),
            category: Some(at.category),
        }),
        HoverMode::Color => Some(Selection {
            kind: SelectionKind::Color(at),
            paths: paths_through(view, at.category, Some(&band.color)),
            bands: category
                .bands
                .iter()
                .enumerate()
                .filter(|(_, b)| b.color == band.color)
                .map(|(idx, _)| BandRef {
                    category: at.category,
                    band: idx,
                })
                .collect(),
            category: None,
        }),
    }
}

pub fn select_path(view: &TraceView, path: usize, mode: HoverMode) -> Option<Selection> {
    if mode == HoverMode::None || path >= view.paths.len() {
        return None;
    }
    Some(Selection {
        kind: SelectionKind::Path(path),
        paths: vec![path],
        bands: Vec::new(),
        category: None,
    })
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Counts behind the color-mode tooltip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStats {
    /// Records of this color within the category.
    pub band_count: f64,
    pub category_count: f64,
    /// Records of this color anywhere in the trace.
    pub color_count: f64,
    pub total_count: f64,
}

impl ColorStats {
    pub fn p_color_and_category(&self) -> f64 {
        ratio(self.band_count, self.total_count)
    }

    pub fn p_category_given_color(&self) -> f64 {
        ratio(self.band_count, self.color_count)
    }

    pub fn p_color_given_category(&self) -> f64 {
        ratio(self.band_count, self.category_count)
    }
}

pub fn color_stats(view: &TraceView, at: BandRef) -> Option<ColorStats> {
    let category = view.category(at.category)?;
    let band = category.bands.get(at.band)?;
    let band_count = category
        .bands
        .iter()
        .filter(|b| b.color == band.color)
        .map(|b| b.count)
        .sum();
    Some(ColorStats {
        band_count,
        category_count: category.count,
        color_count: view.color_total(&band.color),
        total_count: view.total_count,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TooltipAlign {
    Left,
    Right,
}

/// Hover label description in figure coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub x: f32,
    pub y: f32,
    pub lines: Vec<String>,
    pub color: String,
    pub border_color: String,
    pub font_family: String,
    pub font_size: f32,
    pub font_color: String,
    pub align: TooltipAlign,
}

/// Tooltip for a hovered band, following the trace's hover mode.
pub fn band_tooltip(
    view: &TraceView,
    at: BandRef,
    theme: &Theme,
    style: &StyleConfig,
) -> Option<Tooltip> {
    if !view.tooltip {
        return None;
    }
    let dim = view.dimensions.get(at.category.dimension)?;
    let category = view.category(at.category)?;
    let band = category.bands.get(at.band)?;

    let (x, align) = if view.is_rightmost(at.category.dimension) {
        (view.x + dim.x, TooltipAlign::Left)
    } else {
        (view.x + dim.x + category.width, TooltipAlign::Right)
    };
    let label = &category.label;

    match view.hovermode {
        HoverMode::None => None,
        HoverMode::Category => Some(Tooltip {
            x,
            y: view.y + category.y + category.height / 2.0,
            lines: vec![
                format!("Count: {}", category.count),
                format!(
                    "P({label}): {:.3}",
                    ratio(category.count, view.total_count)
                ),
            ],
            color: theme.tooltip_background.clone(),
            border_color: theme.tooltip_border.clone(),
            font_family: theme.tooltip_font_family.clone(),
            font_size: style.tooltip_category_font_size,
            font_color: theme.label_color.clone(),
            align,
        }),
        HoverMode::Color => {
            let stats = color_stats(view, at)?;
            Some(Tooltip {
                x,
                y: view.y + category.y + band.y + band.height / 2.0,
                lines: vec![
                    format!("Count: {}", stats.band_count),
                    format!("P(color ∩ {label}): {:.3}", stats.p_color_and_category()),
                    format!("P({label} | color): {:.3}", stats.p_category_given_color()),
                    format!("P(color | {label}): {:.3}", stats.p_color_given_category()),
                ],
                color: band.color.clone(),
                border_color: theme.tooltip_border.clone(),
                font_family: theme.tooltip_font_family.clone(),
                font_size: style.tooltip_color_font_size,
                font_color: most_readable(&band.color, &READABLE_CANDIDATES).to_string(),
                align,
            })
        }
    }
}

/// Tooltip for a hovered ribbon, anchored at the center of the gap under the
/// pointer. `pointer_x` is trace-local.
pub fn path_tooltip(
    view: &TraceView,
    path: usize,
    pointer_x: f32,
    theme: &Theme,
    style: &StyleConfig,
    layout: &LayoutConfig,
) -> Option<Tooltip> {
    if !view.tooltip || view.hovermode == HoverMode::None {
        return None;
    }
    let path = view.paths.get(path)?;
    let slop = layout.gap_hover_slop;
    let gap = (0..path.left_xs.len().saturating_sub(1)).find(|&d| {
        path.left_xs[d] + path.dim_widths[d] - slop <= pointer_x && pointer_x <= path.left_xs[d + 1] + slop
    })?;

    let center_x = (path.left_xs[gap] + path.dim_widths[gap] + path.left_xs[gap + 1]) / 2.0;
    let center_y = (path.top_ys[gap] + path.top_ys[gap + 1] + path.height) / 2.0;
    let align = if pointer_x < center_x {
        TooltipAlign::Right
    } else {
        TooltipAlign::Left
    };

    Some(Tooltip {
        x: view.x + center_x,
        y: view.y + center_y,
        lines: vec![
            format!("Count: {}", path.count),
            format!("P: {:.3}", ratio(path.count, view.total_count)),
        ],
        color: path.color.clone(),
        border_color: theme.tooltip_border.clone(),
        font_family: theme.tooltip_font_family.clone(),
        font_size: style.tooltip_path_font_size,
        font_color: most_readable(&path.color, &READABLE_CANDIDATES).to_string(),
        align,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Category, Dimension, FigureLayout, Margin, Model, PathModel, RawColor, TraceSettings};
    use crate::layout::compute_trace_view;

    fn model(hovermode: HoverMode, bundlecolors: bool) -> Model {
        let dim = |idx: usize, counts: &[f64]| Dimension {
            dimension_ind: idx,
            display_ind: idx,
            label: format!("D{idx}"),
            categories: counts
                .iter()
                .enumerate()
                .map(|(cat_idx, &count)| Category {
                    category_ind: cat_idx,
                    display_ind: cat_idx,
                    label: format!("c{cat_idx}"),
                    count,
                    drag_y: None,
                })
                .collect(),
            count: counts.iter().sum(),
            drag_x: None,
        };
        let path = |route: &[usize], values: &[usize], color: &str| PathModel {
            category_inds: route.to_vec(),
            value_inds: values.to_vec(),
            count: values.len() as f64,
            color: color.to_string(),
            raw_color: RawColor::Name(color.to_string()),
        };
        Model::new(
            TraceSettings {
                hovermode,
                bundlecolors,
                ..TraceSettings::default()
            },
            vec![dim(0, &[3.0, 1.0]), dim(1, &[2.0, 2.0])],
            vec![
                path(&[0, 0], &[0, 1], "red"),
                path(&[0, 1], &[2], "blue"),
                path(&[1, 1], &[3], "blue"),
            ],
        )
    }

    fn view(model: &Model) -> TraceView {
        let figure = FigureLayout {
            width: 296.0,
            height: 108.0,
            margin: Margin {
                l: 0.0,
                r: 0.0,
                t: 0.0,
                b: 0.0,
            },
        };
        compute_trace_view(model, &figure, &LayoutConfig::default(), None)
    }

    fn a1_band(view: &TraceView, color: &str) -> BandRef {
        let category = CategoryRef {
            dimension: 0,
            category: 0,
        };
        let band = view
            .category(category)
            .unwrap()
            .bands
            .iter()
            .position(|b| b.color == color)
            .unwrap();
        BandRef { category, band }
    }

    #[test]
    fn bands_are_hit_before_paths() {
        let model = model(HoverMode::Category, true);
        let view = view(&model);
        let order: Vec<usize> = (0..view.paths.len()).collect();
        assert!(matches!(hit_test(&view, &order, 45.0, 10.0), Some(Hit::Band(_))));
        let Some(Hit::Path(idx)) = hit_test(&view, &order, 150.0, 40.0) else {
            panic!("expected a path hit");
        };
        assert!(view.paths[idx].top_ys[0] <= 40.0);
        assert_eq!(hit_test(&view, &order, 150.0, 70.0), None);
    }

    #[test]
    fn category_mode_selects_every_path_through_the_category() {
        let model = model(HoverMode::Category, true);
        let view = view(&model);
        let selection = select_band(&view, a1_band(&view, "red"), HoverMode::Category).unwrap();
        let mut points: Vec<usize> = selection
            .points(&view, 0)
            .into_iter()
            .map(|p| p.record_index)
            .collect();
        points.sort_unstable();
        assert_eq!(points, vec![0, 1, 2]);
        assert!(selection.bands.is_empty());
        assert_eq!(selection.category, Some(a1_band(&view, "red").category));
    }

    #[test]
    fn color_mode_filters_by_color_and_category() {
        let model = model(HoverMode::Color, true);
        let view = view(&model);
        let at = a1_band(&view, "blue");
        let selection = select_band(&view, at, HoverMode::Color).unwrap();
        let points: Vec<usize> = selection
            .points(&view, 0)
            .into_iter()
            .map(|p| p.record_index)
            .collect();
        assert_eq!(points, vec![2]);
        assert_eq!(selection.bands, vec![at]);

        let stats = color_stats(&view, at).unwrap();
        assert_eq!(stats.band_count, 1.0);
        assert_eq!(stats.color_count, 2.0);
        assert_eq!(stats.p_color_and_category(), 0.25);
        assert_eq!(stats.p_category_given_color(), 0.5);
        assert!((stats.p_color_given_category() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn hovermode_none_selects_nothing() {
        let model = model(HoverMode::None, true);
        let view = view(&model);
        assert_eq!(select_band(&view, a1_band(&view, "red"), HoverMode::None), None);
        assert_eq!(select_path(&view, 0, HoverMode::None), None);
    }

    #[test]
    fn tooltips_format_counts_and_probabilities() {
        let theme = Theme::default();
        let style = StyleConfig::default();
        let model = model(HoverMode::Color, true);
        let view = view(&model);
        let tooltip = band_tooltip(&view, a1_band(&view, "blue"), &theme, &style).unwrap();
        assert_eq!(
            tooltip.lines,
            vec![
                "Count: 1",
                "P(color ∩ c0): 0.250",
                "P(c0 | color): 0.500",
                "P(color | c0): 0.333"
            ]
        );
        assert_eq!(tooltip.font_color, "white");
        assert_eq!(tooltip.align, TooltipAlign::Right);
        assert_eq!(tooltip.x, 56.0);

        let model = self::model(HoverMode::Category, true);
        let view = self::view(&model);
        let tooltip = band_tooltip(&view, a1_band(&view, "red"), &theme, &style).unwrap();
        assert_eq!(tooltip.lines, vec!["Count: 3", "P(c0): 0.750"]);
        assert_eq!(tooltip.y, 37.5);
        assert_eq!(tooltip.font_size, 12.0);
    }

    #[test]
    fn right_most_dimension_tooltips_open_to_the_left() {
        let model = model(HoverMode::Category, true);
        let view = view(&model);
        let at = BandRef {
            category: CategoryRef {
                dimension: 1,
                category: 0,
            },
            band: 0,
        };
        let tooltip = band_tooltip(&view, at, &Theme::default(), &StyleConfig::default()).unwrap();
        assert_eq!(tooltip.align, TooltipAlign::Left);
        assert_eq!(tooltip.x, 240.0);
    }

    #[test]
    fn path_tooltip_sits_in_the_gap_center() {
        let model = model(HoverMode::Category, true);
        let view = view(&model);
        let idx = view.paths.iter().position(|p| p.color == "red").unwrap();
        let tooltip = path_tooltip(
            &view,
            idx,
            100.0,
            &Theme::default(),
            &StyleConfig::default(),
            &LayoutConfig::default(),
        )
        .unwrap();
        assert_eq!(tooltip.x, 148.0);
        assert_eq!(tooltip.lines, vec!["Count: 2", "P: 0.500"]);
        assert_eq!(tooltip.align, TooltipAlign::Right);
        assert!(
            path_tooltip(
                &view,
                idx,
                45.0,
                &Theme::default(),
                &StyleConfig::default(),
                &LayoutConfig::default()
            )
            .is_none()
        );
    }
}
