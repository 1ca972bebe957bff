//! Retained, keyed tree of drawable primitives.
//!
//! The scene mirrors the latest [`TraceView`] but owns per-node state that
//! must outlive a relayout: hover emphasis and path paint order.

use crate::interaction::Selection;
use crate::ir::{PathKey, RawColor};
use crate::layout::{BandView, CategoryView, DimensionView, LabelSide, PathView, TraceView};
use crate::reconcile::{Reconciled, reconcile_ordered, reconcile_retained};

#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub key: PathKey,
    pub d: String,
    pub fill: String,
    pub raw_color: RawColor,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandNode {
    pub key: usize,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub fill: String,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryNode {
    pub key: usize,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: String,
    pub label_side: LabelSide,
    /// Set on the top-most category of each dimension.
    pub dimension_label: Option<String>,
    pub emphasized: bool,
    pub bands: Vec<BandNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionNode {
    pub key: usize,
    pub x: f32,
    pub dragging: bool,
    pub categories: Vec<CategoryNode>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Bottom to top.
    pub paths: Vec<PathNode>,
    pub dimensions: Vec<DimensionNode>,
}

fn band_node(band: &BandView) -> BandNode {
    BandNode {
        key: band.key,
        y: band.y,
        width: band.width,
        height: band.height,
        fill: band.color.clone(),
        emphasized: false,
    }
}

fn update_band(node: &mut BandNode, band: &BandView) {
    node.y = band.y;
    node.width = band.width;
    node.height = band.height;
    node.fill = band.color.clone();
}

fn dimension_label(category: &CategoryView, label: &str) -> Option<String> {
    (category.display_ind == 0).then(|| label.to_string())
}

fn sync_category(node: &mut CategoryNode, category: &CategoryView, dimension_label: Option<String>) {
    node.y = category.y;
    node.width = category.width;
    node.height = category.height;
    node.label = category.label.clone();
    node.label_side = category.label_side;
    node.dimension_label = dimension_label;
    reconcile_ordered(
        &mut node.bands,
        &category.bands,
        |b| b.key,
        |b| b.key,
        band_node,
        update_band,
    );
}

fn category_node(category: &CategoryView, dimension_label: Option<String>) -> CategoryNode {
    let mut node = CategoryNode {
        key: category.key,
        y: 0.0,
        width: 0.0,
        height: 0.0,
        label: String::new(),
        label_side: category.label_side,
        dimension_label: None,
        emphasized: false,
        bands: Vec::new(),
    };
    sync_category(&mut node, category, dimension_label);
    node
}

fn sync_dimension(node: &mut DimensionNode, dimension: &DimensionView, drag_dimension: Option<usize>) {
    node.x = dimension.x;
    node.dragging = drag_dimension == Some(dimension.key);
    reconcile_ordered(
        &mut node.categories,
        &dimension.categories,
        |c| c.key,
        |c| c.key,
        |c| category_node(c, dimension_label(c, &dimension.label)),
        |n, c| sync_category(n, c, dimension_label(c, &dimension.label)),
    );
}

fn path_node(path: &PathView) -> PathNode {
    PathNode {
        key: path.key.clone(),
        d: path.svg_d.clone(),
        fill: path.color.clone(),
        raw_color: path.raw_color.clone(),
        emphasized: false,
    }
}

fn update_path(node: &mut PathNode, path: &PathView) {
    node.d = path.svg_d.clone();
    node.fill = path.color.clone();
    node.raw_color = path.raw_color.clone();
}

impl Scene {
    pub fn new(view: &TraceView) -> Self {
        let mut scene = Self::default();
        scene.sync(view);
        scene
    }

    /// Brings the scene up to date with a new layout. Existing nodes keep
    /// their emphasis; paths keep their paint order unless new paths arrived,
    /// in which case every path is re-sorted by color.
    pub fn sync(&mut self, view: &TraceView) -> Reconciled<PathKey> {
        self.key = view.key.clone();
        self.x = view.x;
        self.y = view.y;
        self.width = view.width;
        self.height = view.height;

        let paths = reconcile_retained(
            &mut self.paths,
            &view.paths,
            |p| p.key.clone(),
            |p| p.key.clone(),
            path_node,
            update_path,
        );
        if !paths.inserted.is_empty() {
            self.sort_paths_by_color();
        }

        let drag_dimension = view.drag_dimension;
        reconcile_ordered(
            &mut self.dimensions,
            &view.dimensions,
            |d| d.key,
            |d| d.key,
            |d| {
                let mut node = DimensionNode {
                    key: d.key,
                    x: d.x,
                    dragging: false,
                    categories: Vec::new(),
                };
                sync_dimension(&mut node, d, drag_dimension);
                node
            },
            |n, d| sync_dimension(n, d, drag_dimension),
        );

        tracing::debug!(
            inserted = paths.inserted.len(),
            removed = paths.removed.len(),
            "scene synced"
        );
        paths
    }

    /// Stable sort of the paint order by raw color.
    pub fn sort_paths_by_color(&mut self) {
        self.paths.sort_by(|a, b| a.raw_color.cmp(&b.raw_color));
    }

    /// Moves the given paths to the top, keeping their relative order.
    pub fn raise_paths(&mut self, keys: &[PathKey]) {
        let (mut raised, rest): (Vec<PathNode>, Vec<PathNode>) =
            self.paths.drain(..).partition(|p| keys.contains(&p.key));
        self.paths = rest;
        self.paths.append(&mut raised);
    }

    pub fn category_mut(&mut self, dimension_ind: usize, category_ind: usize) -> Option<&mut CategoryNode> {
        self.dimensions
            .iter_mut()
            .find(|d| d.key == dimension_ind)?
            .categories
            .iter_mut()
            .find(|c| c.key == category_ind)
    }

    /// Emphasizes and raises everything a selection touches.
    pub fn apply_selection(&mut self, view: &TraceView, selection: &Selection) {
        let keys: Vec<PathKey> = selection
            .paths
            .iter()
            .filter_map(|&idx| view.paths.get(idx))
            .map(|p| p.key.clone())
            .collect();
        for path in &mut self.paths {
            if keys.contains(&path.key) {
                path.emphasized = true;
            }
        }
        self.raise_paths(&keys);

        for band in &selection.bands {
            let Some(dim) = view.dimensions.get(band.category.dimension) else {
                continue;
            };
            let Some(category) = view.category(band.category) else {
                continue;
            };
            let Some(band_key) = category.bands.get(band.band).map(|b| b.key) else {
                continue;
            };
            if let Some(node) = self.category_mut(dim.key, category.key) {
                if let Some(pos) = node.bands.iter().position(|b| b.key == band_key) {
                    let mut raised = node.bands.remove(pos);
                    raised.emphasized = true;
                    node.bands.push(raised);
                }
            }
        }

        if let Some(at) = selection.category {
            let keys = view
                .dimensions
                .get(at.dimension)
                .zip(view.category(at))
                .map(|(dim, cat)| (dim.key, cat.key));
            if let Some((dim_key, cat_key)) = keys {
                if let Some(node) = self.category_mut(dim_key, cat_key) {
                    node.emphasized = true;
                }
            }
        }
    }

    pub fn clear_emphasis(&mut self) {
        for path in &mut self.paths {
            path.emphasized = false;
        }
        for dim in &mut self.dimensions {
            for cat in &mut dim.categories {
                cat.emphasized = false;
                for band in &mut cat.bands {
                    band.emphasized = false;
                }
                cat.bands.sort_by_key(|b| b.key);
            }
        }
    }

    /// Indices into `view.paths`, bottom to top.
    pub fn paint_order(&self, view: &TraceView) -> Vec<usize> {
        self.paths
            .iter()
            .filter_map(|node| view.paths.iter().position(|p| p.key == node.key))
            .collect()
    }
}
