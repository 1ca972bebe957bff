//! Drag-to-reorder for dimensions and categories.
//!
//! A drag is an explicit [`DragContext`] value: `None` while idle, populated
//! from pointer-down until release. Every move mutates display indices in
//! the model through adjacent swaps; the caller re-runs layout afterwards.

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::config::LayoutConfig;
use crate::ir::Model;
use crate::layout::TraceView;

/// One declarative change handed back to the owner of the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum RestyleOp {
    DimensionDisplayInd { dimension: usize, display_ind: usize },
    CategoryDisplayInds { dimension: usize, display_inds: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestyleUpdate {
    pub trace_index: usize,
    pub ops: Vec<RestyleOp>,
}

impl RestyleUpdate {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Sparse attribute patch: `dimensions[i].displayInd` and
    /// `dimensions[j].catDisplayInds` keys.
    pub fn to_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        for op in &self.ops {
            match op {
                RestyleOp::DimensionDisplayInd {
                    dimension,
                    display_ind,
                } => {
                    patch.insert(format!("dimensions[{dimension}].displayInd"), json!(display_ind));
                }
                RestyleOp::CategoryDisplayInds {
                    dimension,
                    display_inds,
                } => {
                    patch.insert(
                        format!("dimensions[{dimension}].catDisplayInds"),
                        json!(display_inds),
                    );
                }
            }
        }
        patch
    }
}

/// Band pressed at drag start, in stable indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickTarget {
    pub dimension_ind: usize,
    pub category_ind: usize,
    pub band: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryDrag {
    pub category_ind: usize,
    pub initial_display_inds: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragContext {
    pub dimension_ind: usize,
    pub initial_dimension_display_inds: Vec<usize>,
    pub category: Option<CategoryDrag>,
    pub potential_click: Option<ClickTarget>,
    pub has_moved: bool,
    pointer: (f32, f32),
}

impl DragContext {
    /// Last pointer position seen by the drag, trace-local.
    pub fn pointer(&self) -> (f32, f32) {
        self.pointer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragOutcome {
    pub restyle: Option<RestyleUpdate>,
    pub click: Option<ClickTarget>,
    /// Duration of the settle transition the host may animate before the
    /// restyle is applied.
    pub settle_ms: u32,
}

/// Starts a drag if the pointer is over a dimension column. Coordinates are
/// trace-local.
pub fn begin_drag(
    model: &mut Model,
    view: &TraceView,
    config: &LayoutConfig,
    x: f32,
    y: f32,
) -> Option<DragContext> {
    let slop = config.dimension_grab_slop;
    let dim_view = view
        .dimensions
        .iter()
        .find(|dim| x >= dim.x - slop && x <= dim.x + dim.width + slop)?;

    let hit = config.category_hit_slop;
    let mut category = None;
    let mut potential_click = None;
    if let Some(cat_view) = dim_view.categories.iter().find(|cat| {
        let local_x = x - dim_view.x;
        let local_y = y - cat.y;
        -hit <= local_x && local_x <= cat.width + hit && -hit <= local_y && local_y <= cat.height + hit
    }) {
        let local_y = y - cat_view.y;
        potential_click = cat_view
            .bands
            .iter()
            .position(|band| band.y < local_y && local_y <= band.y + band.height)
            .map(|band| ClickTarget {
                dimension_ind: dim_view.key,
                category_ind: cat_view.key,
                band,
            });
        if let Some(dim) = model.dimensions.get_mut(dim_view.key) {
            category = Some(CategoryDrag {
                category_ind: cat_view.key,
                initial_display_inds: dim.category_display_inds(),
            });
            if let Some(cat) = dim.categories.get_mut(cat_view.key) {
                cat.drag_y = Some(cat_view.y);
            }
        }
    }

    tracing::debug!(
        dimension = dim_view.key,
        category = ?category.as_ref().map(|c| c.category_ind),
        "drag started"
    );

    Some(DragContext {
        dimension_ind: dim_view.key,
        initial_dimension_display_inds: model.dimension_display_inds(),
        category,
        potential_click,
        has_moved: false,
        pointer: (x, y),
    })
}

/// Applies one pointer move. `view` must be the layout computed before this
/// move. Returns true when any display index changed.
pub fn drag_move(model: &mut Model, view: &TraceView, drag: &mut DragContext, x: f32, y: f32) -> bool {
    let (dx, dy) = (x - drag.pointer.0, y - drag.pointer.1);
    drag.pointer = (x, y);
    if dx != 0.0 || dy != 0.0 {
        drag.has_moved = true;
    }

    let Some((position, dim_view)) = view.dimension_by_key(drag.dimension_ind) else {
        return false;
    };
    let mut swapped = false;

    if let Some(cat_drag) = &drag.category {
        if let Some(cat_pos) = dim_view
            .categories
            .iter()
            .position(|c| c.key == cat_drag.category_ind)
        {
            let cat_view = &dim_view.categories[cat_pos];
            let dim = &mut model.dimensions[drag.dimension_ind];
            let cat_y = dim.categories[cat_drag.category_ind].drag_y.unwrap_or(cat_view.y) + dy;
            dim.categories[cat_drag.category_ind].drag_y = Some(cat_y);

            let above = cat_pos.checked_sub(1).and_then(|p| dim_view.categories.get(p));
            let below = dim_view.categories.get(cat_pos + 1);
            let neighbor = match (above, below) {
                (Some(above), _) if cat_y < above.y + above.height / 2.0 => Some(above.key),
                (_, Some(below)) if cat_y + cat_view.height > below.y + below.height / 2.0 => {
                    Some(below.key)
                }
                _ => None,
            };
            if let Some(other) = neighbor {
                let dragged = cat_drag.category_ind;
                let display = dim.categories[dragged].display_ind;
                dim.categories[dragged].display_ind = dim.categories[other].display_ind;
                dim.categories[other].display_ind = display;
                tracing::debug!(dimension = drag.dimension_ind, dragged, other, "swapped categories");
                swapped = true;
            }
        }
    }

    let drag_x = model.dimensions[drag.dimension_ind].drag_x.unwrap_or(dim_view.x) + dx;
    model.dimensions[drag.dimension_ind].drag_x = Some(drag_x);

    let prev = position.checked_sub(1).and_then(|p| view.dimensions.get(p));
    let next = view.dimensions.get(position + 1);
    let neighbor = match (prev, next) {
        (Some(prev), _) if drag_x < prev.x + prev.width / 2.0 => Some(prev.key),
        (_, Some(next)) if drag_x + dim_view.width > next.x + next.width / 2.0 => Some(next.key),
        _ => None,
    };
    if let Some(other) = neighbor {
        let dragged = drag.dimension_ind;
        let display = model.dimensions[dragged].display_ind;
        model.dimensions[dragged].display_ind = model.dimensions[other].display_ind;
        model.dimensions[other].display_ind = display;
        tracing::debug!(dragged, other, "swapped dimensions");
        swapped = true;
    }

    swapped
}

/// Finishes a drag: clears drag offsets and reports what changed.
pub fn end_drag(
    model: &mut Model,
    drag: DragContext,
    trace_index: usize,
    config: &LayoutConfig,
) -> DragOutcome {
    let mut ops = Vec::new();

    let final_dims = model.dimension_display_inds();
    if final_dims != drag.initial_dimension_display_inds {
        ops.extend(
            final_dims
                .iter()
                .enumerate()
                .map(|(dimension, &display_ind)| RestyleOp::DimensionDisplayInd {
                    dimension,
                    display_ind,
                }),
        );
    }

    if let Some(cat_drag) = &drag.category {
        if let Some(dim) = model.dimensions.get(drag.dimension_ind) {
            let final_cats = dim.category_display_inds();
            if final_cats != cat_drag.initial_display_inds {
                ops.push(RestyleOp::CategoryDisplayInds {
                    dimension: drag.dimension_ind,
                    display_inds: final_cats,
                });
            }
        }
    }

    let click = if drag.has_moved {
        None
    } else {
        drag.potential_click
    };

    model.clear_drag_offsets();
    tracing::debug!(ops = ops.len(), click = click.is_some(), "drag ended");

    DragOutcome {
        restyle: (!ops.is_empty()).then_some(RestyleUpdate { trace_index, ops }),
        click,
        settle_ms: config.settle_duration_ms,
    }
}

/// Abandons a drag and puts every display index back where it started.
pub fn cancel_drag(model: &mut Model, drag: DragContext) {
    for (dim, display_ind) in model
        .dimensions
        .iter_mut()
        .zip(&drag.initial_dimension_display_inds)
    {
        dim.display_ind = *display_ind;
    }
    if let Some(cat_drag) = drag.category {
        if let Some(dim) = model.dimensions.get_mut(drag.dimension_ind) {
            for (cat, display_ind) in dim.categories.iter_mut().zip(cat_drag.initial_display_inds) {
                cat.display_ind = display_ind;
            }
        }
    }
    model.clear_drag_offsets();
    tracing::debug!(dimension = drag.dimension_ind, "drag cancelled");
}
