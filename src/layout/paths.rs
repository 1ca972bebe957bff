use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::ir::{Model, PathModel, PathShape, RawColor, SortPaths};

use super::geometry::build_ribbon;
use super::{BandView, CategoryRef, DimensionView, PathView};

/// Composite ordering key. Field order is the comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PathSortKey {
    color: Option<RawColor>,
    display: Vec<usize>,
    first_value: usize,
}

pub(super) fn curvature_for(shape: PathShape, config: &LayoutConfig) -> f32 {
    match shape {
        PathShape::Linear => config.linear_curvature,
        PathShape::Hspline => config.hspline_curvature,
    }
}

/// Maps each dimension's stable category index to its position in the view.
fn category_positions(dimensions: &[DimensionView], model: &Model) -> Vec<Vec<Option<usize>>> {
    dimensions
        .iter()
        .map(|dim| {
            let num_cats = model
                .dimensions
                .get(dim.key)
                .map(|d| d.categories.len())
                .unwrap_or(0);
            let mut positions = vec![None; num_cats];
            for (position, cat) in dim.categories.iter().enumerate() {
                if let Some(slot) = positions.get_mut(cat.key) {
                    *slot = Some(position);
                }
            }
            positions
        })
        .collect()
}

/// Resolves a path's route into view positions, one per display dimension.
fn resolve_route(
    path: &PathModel,
    dimensions: &[DimensionView],
    positions: &[Vec<Option<usize>>],
) -> Option<Vec<usize>> {
    dimensions
        .iter()
        .zip(positions)
        .map(|(dim, dim_positions)| {
            let cat_ind = *path.category_inds.get(dim.key)?;
            dim_positions.get(cat_ind).copied().flatten()
        })
        .collect()
}

/// Sorts and stacks every path through its categories, filling in category
/// bands along the way. Returns the paths in layout order and the total count
/// per path color.
pub(super) fn compute_path_views(
    model: &Model,
    dimensions: &mut [DimensionView],
    config: &LayoutConfig,
) -> (Vec<PathView>, BTreeMap<String, f64>) {
    let mut color_totals: BTreeMap<String, f64> = BTreeMap::new();
    if dimensions.is_empty() {
        return (Vec::new(), color_totals);
    }

    let positions = category_positions(dimensions, model);
    let settings = &model.settings;
    let mut routed: Vec<(PathSortKey, usize, Vec<usize>)> = Vec::with_capacity(model.paths.len());
    for (path_idx, path) in model.paths.iter().enumerate() {
        if path.category_inds.len() != model.dimensions.len() {
            tracing::warn!(
                path = path_idx,
                route_len = path.category_inds.len(),
                dimensions = model.dimensions.len(),
                "path route length does not match dimension count; skipping"
            );
            continue;
        }
        let Some(route) = resolve_route(path, dimensions, &positions) else {
            tracing::warn!(path = path_idx, "path references a missing category; skipping");
            continue;
        };
        let mut display: Vec<usize> = dimensions
            .iter()
            .zip(&route)
            .map(|(dim, &position)| dim.categories[position].display_ind)
            .collect();
        if settings.sortpaths == SortPaths::Backward {
            display.reverse();
        }
        let key = PathSortKey {
            color: settings.bundlecolors.then(|| path.raw_color.clone()),
            display,
            first_value: path.first_value(),
        };
        *color_totals.entry(path.color.clone()).or_insert(0.0) += path.count;
        routed.push((key, path_idx, route));
    }
    routed.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    let total_count = dimensions[0].count;
    let total_height: f32 = dimensions[0].categories.iter().map(|c| c.height).sum();
    let curvature = curvature_for(settings.path_shape, config);

    let mut cursors: Vec<Vec<f32>> = dimensions
        .iter()
        .map(|dim| dim.categories.iter().map(|c| c.y).collect())
        .collect();

    let mut paths = Vec::with_capacity(routed.len());
    for (_, path_idx, route) in routed {
        let path = &model.paths[path_idx];
        let thickness = if total_count > 0.0 {
            ((path.count / total_count) as f32 * total_height).max(0.0)
        } else {
            0.0
        };

        let mut left_xs = Vec::with_capacity(dimensions.len());
        let mut top_ys = Vec::with_capacity(dimensions.len());
        let mut dim_widths = Vec::with_capacity(dimensions.len());
        for (d, dim) in dimensions.iter_mut().enumerate() {
            let position = route[d];
            let cursor = &mut cursors[d][position];
            left_xs.push(dim.x);
            top_ys.push(*cursor);
            dim_widths.push(dim.width);
            *cursor += thickness;

            let category = &mut dim.categories[position];
            extend_bands(
                &mut category.bands,
                path,
                thickness,
                category.width,
                CategoryRef {
                    dimension: d,
                    category: position,
                },
            );
        }

        let outline = build_ribbon(&left_xs, &top_ys, &dim_widths, thickness, curvature);
        let svg_d = outline.to_svg_path();
        paths.push(PathView {
            key: path.key(),
            model: path_idx,
            color: path.color.clone(),
            raw_color: path.raw_color.clone(),
            count: path.count,
            value_inds: path.value_inds.clone(),
            left_xs,
            top_ys,
            dim_widths,
            height: thickness,
            curvature,
            outline,
            svg_d,
        });
    }

    tracing::debug!(paths = paths.len(), "laid out paths");
    (paths, color_totals)
}

fn extend_bands(
    bands: &mut Vec<BandView>,
    path: &PathModel,
    thickness: f32,
    width: f32,
    category: CategoryRef,
) {
    if let Some(last) = bands.last_mut() {
        if last.raw_color == path.raw_color {
            last.height += thickness;
            last.count += path.count;
            return;
        }
    }
    let y = bands.last().map(|b| b.y + b.height).unwrap_or(0.0);
    bands.push(BandView {
        key: bands.len(),
        color: path.color.clone(),
        raw_color: path.raw_color.clone(),
        y,
        width,
        height: thickness,
        count: path.count,
        category,
    });
}
