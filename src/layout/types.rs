use std::collections::BTreeMap;

use crate::ir::{HoverMode, PathKey, PathShape, RawColor, SortPaths};

use super::geometry::RibbonOutline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSide {
    Left,
    Right,
}

/// Non-owning handle to a category: positions in the owning [`TraceView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryRef {
    pub dimension: usize,
    pub category: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandRef {
    pub category: CategoryRef,
    pub band: usize,
}

/// Color-homogeneous slice of a category. `y` is relative to the category.
#[derive(Debug, Clone)]
pub struct BandView {
    pub key: usize,
    pub color: String,
    pub raw_color: RawColor,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub count: f64,
    pub category: CategoryRef,
}

#[derive(Debug, Clone)]
pub struct CategoryView {
    /// Stable category index.
    pub key: usize,
    pub display_ind: usize,
    /// Display position of the owning dimension.
    pub dimension: usize,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub count: f64,
    pub label: String,
    pub label_side: LabelSide,
    pub bands: Vec<BandView>,
}

#[derive(Debug, Clone)]
pub struct DimensionView {
    /// Stable dimension index.
    pub key: usize,
    pub display_ind: usize,
    pub x: f32,
    pub width: f32,
    pub count: f64,
    pub label: String,
    /// Categories in display order.
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone)]
pub struct PathView {
    pub key: PathKey,
    /// Index into the model's path list.
    pub model: usize,
    pub color: String,
    pub raw_color: RawColor,
    pub count: f64,
    pub value_inds: Vec<usize>,
    /// Per display dimension.
    pub left_xs: Vec<f32>,
    pub top_ys: Vec<f32>,
    pub dim_widths: Vec<f32>,
    pub height: f32,
    pub curvature: f32,
    pub outline: RibbonOutline,
    pub svg_d: String,
}

#[derive(Debug, Clone)]
pub struct TraceView {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub hovermode: HoverMode,
    pub tooltip: bool,
    pub bundlecolors: bool,
    pub sortpaths: SortPaths,
    pub path_shape: PathShape,
    /// Stable index of the dimension being dragged.
    pub drag_dimension: Option<usize>,
    pub total_count: f64,
    /// Dimensions in display order.
    pub dimensions: Vec<DimensionView>,
    /// Paths in layout (sorted) order.
    pub paths: Vec<PathView>,
    /// Total count per path color, rebuilt on every layout pass.
    pub color_totals: BTreeMap<String, f64>,
}

impl TraceView {
    pub fn category(&self, at: CategoryRef) -> Option<&CategoryView> {
        self.dimensions.get(at.dimension)?.categories.get(at.category)
    }

    pub fn band(&self, at: BandRef) -> Option<&BandView> {
        self.category(at.category)?.bands.get(at.band)
    }

    pub fn dimension_by_key(&self, dimension_ind: usize) -> Option<(usize, &DimensionView)> {
        self.dimensions
            .iter()
            .enumerate()
            .find(|(_, dim)| dim.key == dimension_ind)
    }

    /// Resolves stable dimension/category indices to a view handle.
    pub fn find_category(&self, dimension_ind: usize, category_ind: usize) -> Option<CategoryRef> {
        let (dimension, dim) = self.dimension_by_key(dimension_ind)?;
        let category = dim.categories.iter().position(|c| c.key == category_ind)?;
        Some(CategoryRef {
            dimension,
            category,
        })
    }

    pub fn is_rightmost(&self, dimension: usize) -> bool {
        self.dimensions.len() > 1 && dimension + 1 == self.dimensions.len()
    }

    pub fn color_total(&self, color: &str) -> f64 {
        self.color_totals.get(color).copied().unwrap_or(0.0)
    }

    pub fn path_by_key(&self, key: &PathKey) -> Option<&PathView> {
        self.paths.iter().find(|p| &p.key == key)
    }
}
