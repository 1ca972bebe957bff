use crate::config::LayoutConfig;
use crate::ir::{Dimension, Model};

use super::{CategoryView, DimensionView, LabelSide};

/// Horizontal distance between neighboring dimension columns.
pub(super) fn dimension_step(width: f32, num_dimensions: usize, config: &LayoutConfig) -> f32 {
    if num_dimensions <= 1 {
        return 0.0;
    }
    let usable = width - 2.0 * config.category_label_pad - config.dimension_width;
    (usable / (num_dimensions - 1) as f32).max(0.0)
}

/// Lays out every dimension in display order. Bands are left empty for the
/// path layout pass to fill.
pub(super) fn compute_dimension_views(
    model: &Model,
    width: f32,
    height: f32,
    config: &LayoutConfig,
) -> Vec<DimensionView> {
    let order = model.dimensions_in_display_order();
    let step = dimension_step(width, order.len(), config);
    let last = order.len().saturating_sub(1);

    order
        .iter()
        .enumerate()
        .map(|(position, &dim_idx)| {
            let dim = &model.dimensions[dim_idx];
            let x = dim
                .drag_x
                .unwrap_or(config.category_label_pad + step * dim.display_ind as f32);
            let label_side = if order.len() > 1 && position == last {
                LabelSide::Right
            } else {
                LabelSide::Left
            };
            DimensionView {
                key: dim.dimension_ind,
                display_ind: dim.display_ind,
                x,
                width: config.dimension_width,
                count: dim.count,
                label: dim.label.clone(),
                categories: compute_category_views(
                    dim,
                    position,
                    model.max_cats,
                    height,
                    label_side,
                    config,
                ),
            }
        })
        .collect()
}

fn compute_category_views(
    dim: &Dimension,
    dimension_position: usize,
    max_cats: usize,
    height: f32,
    label_side: LabelSide,
    config: &LayoutConfig,
) -> Vec<CategoryView> {
    let spacing = config.category_spacing;
    let gaps = max_cats.saturating_sub(1) as f32;
    let available = (height - spacing * gaps).max(0.0);
    let num_cats = dim.categories.len();
    let mut next_y = max_cats.saturating_sub(num_cats) as f32 * spacing / 2.0;

    let mut views = Vec::with_capacity(num_cats);
    for cat_idx in dim.categories_in_display_order() {
        let cat = &dim.categories[cat_idx];
        let cat_height = if dim.count > 0.0 {
            ((cat.count / dim.count) as f32 * available).max(0.0)
        } else {
            0.0
        };
        views.push(CategoryView {
            key: cat.category_ind,
            display_ind: cat.display_ind,
            dimension: dimension_position,
            y: cat.drag_y.unwrap_or(next_y),
            width: config.dimension_width,
            height: cat_height,
            count: cat.count,
            label: cat.label.clone(),
            label_side,
            bands: Vec::new(),
        });
        next_y += cat_height + spacing;
    }
    views
}
