use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reorder::{RestyleOp, RestyleUpdate};
use crate::theme::{Colorscale, DEFAULT_LINE_COLOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoverMode {
    None,
    #[default]
    Category,
    Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortPaths {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathShape {
    #[default]
    Linear,
    Hspline,
}

/// Fractions of the figure occupied by a trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub x: [f32; 2],
    pub y: [f32; 2],
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            x: [0.0, 1.0],
            y: [0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margin {
    pub l: f32,
    pub r: f32,
    pub t: f32,
    pub b: f32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            l: 80.0,
            r: 80.0,
            t: 100.0,
            b: 80.0,
        }
    }
}

/// Usable figure area handed down by the owner of the figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureLayout {
    pub width: f32,
    pub height: f32,
    pub margin: Margin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSettings {
    pub uid: String,
    pub hovermode: HoverMode,
    pub tooltip: bool,
    pub bundlecolors: bool,
    pub sortpaths: SortPaths,
    pub path_shape: PathShape,
    pub domain: Domain,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            uid: "trace-0".to_string(),
            hovermode: HoverMode::Category,
            tooltip: true,
            bundlecolors: true,
            sortpaths: SortPaths::Forward,
            path_shape: PathShape::Linear,
            domain: Domain::default(),
        }
    }
}

/// Sort color of a path. Numbers order before names.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RawColor {
    Value(f64),
    Name(String),
}

impl PartialEq for RawColor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RawColor {}

impl PartialOrd for RawColor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawColor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RawColor::Value(a), RawColor::Value(b)) => a.total_cmp(b),
            (RawColor::Value(_), RawColor::Name(_)) => Ordering::Less,
            (RawColor::Name(_), RawColor::Value(_)) => Ordering::Greater,
            (RawColor::Name(a), RawColor::Name(b)) => a.cmp(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub category_ind: usize,
    pub display_ind: usize,
    pub label: String,
    pub count: f64,
    pub drag_y: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub dimension_ind: usize,
    pub display_ind: usize,
    pub label: String,
    pub categories: Vec<Category>,
    pub count: f64,
    pub drag_x: Option<f32>,
}

impl Dimension {
    pub fn category_display_inds(&self) -> Vec<usize> {
        self.categories.iter().map(|c| c.display_ind).collect()
    }

    /// Stable category indices sorted by display position.
    pub fn categories_in_display_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.categories.len()).collect();
        order.sort_by_key(|&idx| (self.categories[idx].display_ind, idx));
        order
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathModel {
    /// Stable category index per dimension, indexed by stable dimension index.
    pub category_inds: Vec<usize>,
    pub value_inds: Vec<usize>,
    pub count: f64,
    pub color: String,
    pub raw_color: RawColor,
}

impl PathModel {
    pub fn first_value(&self) -> usize {
        self.value_inds.first().copied().unwrap_or(usize::MAX)
    }

    pub fn key(&self) -> PathKey {
        PathKey {
            route: self.category_inds.clone(),
            first_value: self.first_value(),
        }
    }
}

/// Identity of a path across relayouts: route plus first record index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PathKey {
    pub route: Vec<usize>,
    pub first_value: usize,
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let route: Vec<String> = self.route.iter().map(|c| c.to_string()).collect();
        write!(f, "{}-{}", route.join(","), self.first_value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub settings: TraceSettings,
    /// Indexed by stable dimension index.
    pub dimensions: Vec<Dimension>,
    pub paths: Vec<PathModel>,
    pub count: f64,
    pub max_cats: usize,
}

impl Model {
    pub fn new(settings: TraceSettings, dimensions: Vec<Dimension>, paths: Vec<PathModel>) -> Self {
        let mut dimensions = dimensions;
        for (dim_idx, dim) in dimensions.iter_mut().enumerate() {
            if dim.dimension_ind != dim_idx {
                tracing::warn!(
                    expected = dim_idx,
                    found = dim.dimension_ind,
                    "dimension index does not match its position; reassigning"
                );
                dim.dimension_ind = dim_idx;
            }
            for (cat_idx, cat) in dim.categories.iter_mut().enumerate() {
                cat.category_ind = cat_idx;
            }
        }
        let count = paths.iter().fold(0.0, |total, p| total + p.count.max(0.0));
        let max_cats = dimensions
            .iter()
            .map(|d| d.categories.len())
            .max()
            .unwrap_or(0);
        let mut model = Self {
            settings,
            dimensions,
            paths,
            count,
            max_cats,
        };
        model.normalize_display_inds();
        model
    }

    pub fn dimension_display_inds(&self) -> Vec<usize> {
        self.dimensions.iter().map(|d| d.display_ind).collect()
    }

    /// Stable dimension indices sorted by display position.
    pub fn dimensions_in_display_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.dimensions.len()).collect();
        order.sort_by_key(|&idx| (self.dimensions[idx].display_ind, idx));
        order
    }

    /// Repairs display indices that are not a permutation of `0..n`.
    /// Returns true when anything was rewritten.
    pub fn normalize_display_inds(&mut self) -> bool {
        let mut changed = false;
        if let Some(repaired) = repair_permutation(&self.dimension_display_inds()) {
            tracing::warn!("dimension display indices were not a permutation; repaired");
            for (dim, display_ind) in self.dimensions.iter_mut().zip(repaired) {
                dim.display_ind = display_ind;
            }
            changed = true;
        }
        for dim in &mut self.dimensions {
            if let Some(repaired) = repair_permutation(&dim.category_display_inds()) {
                tracing::warn!(
                    dimension = dim.dimension_ind,
                    "category display indices were not a permutation; repaired"
                );
                for (cat, display_ind) in dim.categories.iter_mut().zip(repaired) {
                    cat.display_ind = display_ind;
                }
                changed = true;
            }
        }
        changed
    }

    /// Owner-side application of a committed reorder.
    pub fn apply_restyle(&mut self, update: &RestyleUpdate) {
        for op in &update.ops {
            match op {
                RestyleOp::DimensionDisplayInd {
                    dimension,
                    display_ind,
                } => {
                    if let Some(dim) = self.dimensions.get_mut(*dimension) {
                        dim.display_ind = *display_ind;
                    }
                }
                RestyleOp::CategoryDisplayInds {
                    dimension,
                    display_inds,
                } => {
                    if let Some(dim) = self.dimensions.get_mut(*dimension) {
                        for (cat, display_ind) in dim.categories.iter_mut().zip(display_inds) {
                            cat.display_ind = *display_ind;
                        }
                    }
                }
            }
        }
        self.normalize_display_inds();
    }

    pub fn clear_drag_offsets(&mut self) {
        for dim in &mut self.dimensions {
            dim.drag_x = None;
            for cat in &mut dim.categories {
                cat.drag_y = None;
            }
        }
    }

    pub fn from_spec(spec: &TraceSpec) -> Result<Self, ModelError> {
        build_model(spec)
    }
}

fn repair_permutation(display: &[usize]) -> Option<Vec<usize>> {
    let n = display.len();
    let mut seen = vec![false; n];
    let valid = display
        .iter()
        .all(|&d| d < n && !std::mem::replace(&mut seen[d], true));
    if valid {
        return None;
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&idx| (display[idx], idx));
    let mut repaired = vec![0; n];
    for (rank, idx) in order.into_iter().enumerate() {
        repaired[idx] = rank;
    }
    Some(repaired)
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("trace has no dimensions")]
    NoDimensions,
    #[error("trace has no records")]
    NoRecords,
    #[error("dimension `{dimension}` has {found} values, expected {expected}")]
    LengthMismatch {
        dimension: String,
        expected: usize,
        found: usize,
    },
    #[error("{field} has {found} entries, expected one per record ({expected})")]
    RecordFieldMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("dimension display indices {0:?} are not a permutation")]
    DisplayIndexNotPermutation(Vec<usize>),
    #[error("invalid colorscale: {0}")]
    InvalidColorscale(String),
}

/// A category value as it appears in the input records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryValue {
    Number(f64),
    Text(String),
}

impl CategoryValue {
    fn as_key(&self) -> String {
        match self {
            CategoryValue::Number(value) => value.to_string(),
            CategoryValue::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSpec {
    #[serde(default)]
    pub label: String,
    pub values: Vec<CategoryValue>,
    #[serde(default)]
    pub category_order: Option<Vec<CategoryValue>>,
    #[serde(default)]
    pub category_labels: Option<Vec<String>>,
    #[serde(default)]
    pub display_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountsSpec {
    Uniform(f64),
    PerRecord(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorSpec {
    Constant(String),
    Values(Vec<f64>),
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSpec {
    #[serde(default)]
    pub color: Option<ColorSpec>,
    #[serde(default)]
    pub colorscale: Option<Vec<(f64, String)>>,
    #[serde(default)]
    pub cmin: Option<f64>,
    #[serde(default)]
    pub cmax: Option<f64>,
    #[serde(default)]
    pub shape: PathShape,
}

fn default_true() -> bool {
    true
}

/// Per-record trace description, the input of [`Model::from_spec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSpec {
    #[serde(default)]
    pub uid: Option<String>,
    pub dimensions: Vec<DimensionSpec>,
    #[serde(default)]
    pub counts: Option<CountsSpec>,
    #[serde(default)]
    pub line: LineSpec,
    #[serde(default)]
    pub hovermode: HoverMode,
    #[serde(default = "default_true")]
    pub tooltip: bool,
    #[serde(default = "default_true")]
    pub bundlecolors: bool,
    #[serde(default)]
    pub sortpaths: SortPaths,
    #[serde(default)]
    pub domain: Domain,
}

fn build_model(spec: &TraceSpec) -> Result<Model, ModelError> {
    let Some(first) = spec.dimensions.first() else {
        return Err(ModelError::NoDimensions);
    };
    let num_records = first.values.len();
    if num_records == 0 {
        return Err(ModelError::NoRecords);
    }
    for dim in &spec.dimensions {
        if dim.values.len() != num_records {
            return Err(ModelError::LengthMismatch {
                dimension: dim.label.clone(),
                expected: num_records,
                found: dim.values.len(),
            });
        }
    }

    let counts = record_counts(spec.counts.as_ref(), num_records)?;
    let (colors, raw_colors) = record_colors(&spec.line, num_records)?;

    let mut dimensions = Vec::with_capacity(spec.dimensions.len());
    let mut record_routes: Vec<Vec<usize>> = vec![Vec::with_capacity(spec.dimensions.len()); num_records];
    for (dim_idx, dim_spec) in spec.dimensions.iter().enumerate() {
        let mut keys: Vec<String> = Vec::new();
        let mut key_to_idx: HashMap<String, usize> = HashMap::new();
        let ordered = dim_spec.category_order.iter().flatten();
        for value in ordered.chain(dim_spec.values.iter()) {
            let key = value.as_key();
            if !key_to_idx.contains_key(&key) {
                key_to_idx.insert(key.clone(), keys.len());
                keys.push(key);
            }
        }

        let mut cat_counts = vec![0.0f64; keys.len()];
        for (record, value) in dim_spec.values.iter().enumerate() {
            let cat_idx = key_to_idx[&value.as_key()];
            cat_counts[cat_idx] += counts[record];
            record_routes[record].push(cat_idx);
        }

        let categories = keys
            .iter()
            .enumerate()
            .map(|(cat_idx, key)| Category {
                category_ind: cat_idx,
                display_ind: cat_idx,
                label: dim_spec
                    .category_labels
                    .as_ref()
                    .and_then(|labels| labels.get(cat_idx))
                    .cloned()
                    .unwrap_or_else(|| key.clone()),
                count: cat_counts[cat_idx],
                drag_y: None,
            })
            .collect();

        dimensions.push(Dimension {
            dimension_ind: dim_idx,
            display_ind: dim_idx,
            label: dim_spec.label.clone(),
            categories,
            count: counts.iter().sum(),
            drag_x: None,
        });
    }

    let explicit: Vec<Option<usize>> = spec.dimensions.iter().map(|d| d.display_index).collect();
    if explicit.iter().all(Option::is_some) {
        let display: Vec<usize> = explicit.into_iter().flatten().collect();
        if repair_permutation(&display).is_some() {
            return Err(ModelError::DisplayIndexNotPermutation(display));
        }
        for (dim, display_ind) in dimensions.iter_mut().zip(display) {
            dim.display_ind = display_ind;
        }
    }

    let mut grouped: BTreeMap<(Vec<usize>, RawColor), PathModel> = BTreeMap::new();
    for (record, route) in record_routes.into_iter().enumerate() {
        let raw_color = raw_colors[record].clone();
        let entry = grouped
            .entry((route.clone(), raw_color.clone()))
            .or_insert_with(|| PathModel {
                category_inds: route,
                value_inds: Vec::new(),
                count: 0.0,
                color: colors[record].clone(),
                raw_color,
            });
        entry.value_inds.push(record);
        entry.count += counts[record];
    }

    let settings = TraceSettings {
        uid: spec.uid.clone().unwrap_or_else(|| "trace-0".to_string()),
        hovermode: spec.hovermode,
        tooltip: spec.tooltip,
        bundlecolors: spec.bundlecolors,
        sortpaths: spec.sortpaths,
        path_shape: spec.line.shape,
        domain: spec.domain,
    };

    Ok(Model::new(settings, dimensions, grouped.into_values().collect()))
}

fn record_counts(spec: Option<&CountsSpec>, num_records: usize) -> Result<Vec<f64>, ModelError> {
    let counts = match spec {
        None => vec![1.0; num_records],
        Some(CountsSpec::Uniform(value)) => vec![*value; num_records],
        Some(CountsSpec::PerRecord(values)) => {
            if values.len() != num_records {
                return Err(ModelError::RecordFieldMismatch {
                    field: "counts",
                    expected: num_records,
                    found: values.len(),
                });
            }
            values.clone()
        }
    };
    Ok(counts
        .into_iter()
        .map(|count| {
            if count.is_finite() && count >= 0.0 {
                count
            } else {
                tracing::warn!(count, "invalid record count clamped to 0");
                0.0
            }
        })
        .collect())
}

fn record_colors(
    line: &LineSpec,
    num_records: usize,
) -> Result<(Vec<String>, Vec<RawColor>), ModelError> {
    match &line.color {
        None => Ok((
            vec![DEFAULT_LINE_COLOR.to_string(); num_records],
            vec![RawColor::Name(DEFAULT_LINE_COLOR.to_string()); num_records],
        )),
        Some(ColorSpec::Constant(color)) => Ok((
            vec![color.clone(); num_records],
            vec![RawColor::Name(color.clone()); num_records],
        )),
        Some(ColorSpec::Names(names)) => {
            if names.len() != num_records {
                return Err(ModelError::RecordFieldMismatch {
                    field: "line.color",
                    expected: num_records,
                    found: names.len(),
                });
            }
            Ok((
                names.clone(),
                names.iter().map(|n| RawColor::Name(n.clone())).collect(),
            ))
        }
        Some(ColorSpec::Values(values)) => {
            if values.len() != num_records {
                return Err(ModelError::RecordFieldMismatch {
                    field: "line.color",
                    expected: num_records,
                    found: values.len(),
                });
            }
            let scale = match &line.colorscale {
                Some(stops) => Colorscale::from_stops(stops).map_err(ModelError::InvalidColorscale)?,
                None => Colorscale::default(),
            };
            let finite = values.iter().copied().filter(|v| v.is_finite());
            let data_min = finite.clone().fold(f64::INFINITY, f64::min);
            let data_max = finite.fold(f64::NEG_INFINITY, f64::max);
            let cmin = line.cmin.unwrap_or(data_min);
            let cmax = line.cmax.unwrap_or(data_max);
            let colors = values
                .iter()
                .map(|&value| {
                    let t = if cmax > cmin && value.is_finite() {
                        (value - cmin) / (cmax - cmin)
                    } else {
                        0.0
                    };
                    scale.sample(t)
                })
                .collect();
            Ok((colors, values.iter().map(|&v| RawColor::Value(v)).collect()))
        }
    }
}
