use crate::layout::{LabelSide, TraceView};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub uid: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub total_count: f64,
    pub dimensions: Vec<DimensionDump>,
    pub paths: Vec<PathDump>,
}

#[derive(Debug, Serialize)]
pub struct DimensionDump {
    pub dimension_ind: usize,
    pub display_ind: usize,
    pub label: String,
    pub x: f32,
    pub width: f32,
    pub count: f64,
    pub categories: Vec<CategoryDump>,
}

#[derive(Debug, Serialize)]
pub struct CategoryDump {
    pub category_ind: usize,
    pub display_ind: usize,
    pub label: String,
    pub label_side: String,
    pub y: f32,
    pub height: f32,
    pub count: f64,
    pub bands: Vec<BandDump>,
}

#[derive(Debug, Serialize)]
pub struct BandDump {
    pub color: String,
    pub y: f32,
    pub height: f32,
    pub count: f64,
}

#[derive(Debug, Serialize)]
pub struct PathDump {
    pub route: Vec<usize>,
    pub color: String,
    pub count: f64,
    pub records: Vec<usize>,
    pub left_xs: Vec<f32>,
    pub top_ys: Vec<f32>,
    pub height: f32,
    pub d: String,
}

impl LayoutDump {
    pub fn from_view(view: &TraceView) -> Self {
        let dimensions = view
            .dimensions
            .iter()
            .map(|dim| DimensionDump {
                dimension_ind: dim.key,
                display_ind: dim.display_ind,
                label: dim.label.clone(),
                x: dim.x,
                width: dim.width,
                count: dim.count,
                categories: dim
                    .categories
                    .iter()
                    .map(|cat| CategoryDump {
                        category_ind: cat.key,
                        display_ind: cat.display_ind,
                        label: cat.label.clone(),
                        label_side: match cat.label_side {
                            LabelSide::Left => "left".to_string(),
                            LabelSide::Right => "right".to_string(),
                        },
                        y: cat.y,
                        height: cat.height,
                        count: cat.count,
                        bands: cat
                            .bands
                            .iter()
                            .map(|band| BandDump {
                                color: band.color.clone(),
                                y: band.y,
                                height: band.height,
                                count: band.count,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        let paths = view
            .paths
            .iter()
            .map(|path| PathDump {
                route: path.key.route.clone(),
                color: path.color.clone(),
                count: path.count,
                records: path.value_inds.clone(),
                left_xs: path.left_xs.clone(),
                top_ys: path.top_ys.clone(),
                height: path.height,
                d: path.svg_d.clone(),
            })
            .collect();

        LayoutDump {
            uid: view.key.clone(),
            x: view.x,
            y: view.y,
            width: view.width,
            height: view.height,
            total_count: view.total_count,
            dimensions,
            paths,
        }
    }
}

pub fn write_layout_dump(path: &Path, view: &TraceView) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_view(view);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
