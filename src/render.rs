use crate::config::{Config, RenderConfig, StrokeStyle};
use crate::layout::LabelSide;
use crate::scene::{CategoryNode, DimensionNode, PathNode, Scene};
use crate::theme::most_readable;
use anyhow::Result;
use std::path::Path;

/// Serializes a scene to a standalone SVG document of the configured size.
pub fn render_svg(scene: &Scene, config: &Config) -> String {
    render_figure_svg(std::slice::from_ref(scene), config)
}

/// Serializes every trace of a figure into one document, first trace at the bottom.
pub fn render_figure_svg(scenes: &[Scene], config: &Config) -> String {
    let mut svg = String::new();
    let width = config.render.width.max(1.0);
    let height = config.render.height.max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        escape_xml(&config.render.background)
    ));
    for scene in scenes {
        render_trace(&mut svg, scene, config);
    }
    svg.push_str("</svg>");
    svg
}

fn render_trace(svg: &mut String, scene: &Scene, config: &Config) {
    svg.push_str(&format!(
        "<g class=\"trace parcats\" data-uid=\"{}\" transform=\"translate({:.2},{:.2})\">",
        escape_xml(&scene.key),
        scene.x,
        scene.y
    ));

    svg.push_str("<g class=\"paths\">");
    for path in &scene.paths {
        render_path(svg, path, config);
    }
    svg.push_str("</g>");

    for dimension in &scene.dimensions {
        render_dimension(svg, dimension, config);
    }
    svg.push_str("</g>");
}

fn render_path(svg: &mut String, path: &PathNode, config: &Config) {
    let (style, stroke) = if path.emphasized {
        (
            &config.style.path_hover,
            most_readable(&path.fill, &["black", "white"]).to_string(),
        )
    } else {
        (&config.style.path, config.theme.path_stroke.clone())
    };
    svg.push_str(&format!(
        "<path class=\"path\" d=\"{}\" fill=\"{}\" {} stroke=\"{}\"/>",
        path.d,
        escape_xml(&path.fill),
        style_attrs(style),
        escape_xml(&stroke)
    ));
}

fn render_dimension(svg: &mut String, dimension: &DimensionNode, config: &Config) {
    svg.push_str(&format!(
        "<g class=\"dimension\" transform=\"translate({:.2},0)\">",
        dimension.x
    ));
    for category in &dimension.categories {
        render_category(svg, category, dimension.dragging, config);
    }
    svg.push_str("</g>");
}

fn render_category(svg: &mut String, category: &CategoryNode, dragging: bool, config: &Config) {
    let theme = &config.theme;
    svg.push_str(&format!(
        "<g class=\"category\" transform=\"translate(0,{:.2})\">",
        category.y
    ));

    let rect_style = if category.emphasized {
        &config.style.category_hover
    } else {
        &config.style.category
    };
    svg.push_str(&format!(
        "<rect class=\"catrect\" width=\"{:.2}\" height=\"{:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\"/>",
        category.width,
        category.height,
        escape_xml(&theme.category_stroke),
        rect_style.stroke_width,
        rect_style.stroke_opacity
    ));

    for band in &category.bands {
        let style = if band.emphasized {
            &config.style.band_hover
        } else {
            &config.style.band
        };
        svg.push_str(&format!(
            "<rect class=\"bandrect\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" {} stroke=\"{}\"/>",
            band.y,
            band.width,
            band.height,
            escape_xml(&band.fill),
            style_attrs(style),
            escape_xml(&theme.band_stroke)
        ));
    }

    let offset = config.layout.label_offset;
    let (label_x, anchor) = match category.label_side {
        LabelSide::Left => (-offset, "end"),
        LabelSide::Right => (category.width + offset, "start"),
    };
    svg.push_str(&format!(
        "<text class=\"catlabel\" x=\"{label_x:.2}\" y=\"{:.2}\" dominant-baseline=\"central\" text-anchor=\"{anchor}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"3\" paint-order=\"stroke\">{}</text>",
        category.height / 2.0,
        escape_xml(&theme.font_family),
        theme.category_label_font_size,
        escape_xml(&theme.label_color),
        escape_xml(&theme.label_halo),
        escape_xml(&category.label)
    ));

    if let Some(label) = &category.dimension_label {
        let weight = if dragging { "bold" } else { "normal" };
        svg.push_str(&format!(
            "<text class=\"dimlabel\" x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{weight}\" fill=\"{}\">{}</text>",
            category.width / 2.0,
            -offset,
            escape_xml(&theme.font_family),
            theme.dimension_label_font_size,
            escape_xml(&theme.label_color),
            escape_xml(label)
        ));
    }

    svg.push_str("</g>");
}

fn style_attrs(style: &StrokeStyle) -> String {
    format!(
        "fill-opacity=\"{}\" stroke-width=\"{}\" stroke-opacity=\"{}\"",
        style.fill_opacity, style.stroke_width, style.stroke_opacity
    )
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Open Sans".to_string();
    opt.fontdb_mut().load_system_fonts();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Category, Dimension, FigureLayout, Margin, Model, PathModel, RawColor, TraceSettings};
    use crate::layout::compute_trace_view;

    fn scene() -> Scene {
        let dim = |idx: usize, labels: [&str; 2]| Dimension {
            dimension_ind: idx,
            display_ind: idx,
            label: format!("Dim & {idx}"),
            categories: labels
                .iter()
                .enumerate()
                .map(|(cat_idx, label)| Category {
                    category_ind: cat_idx,
                    display_ind: cat_idx,
                    label: label.to_string(),
                    count: 1.0,
                    drag_y: None,
                })
                .collect(),
            count: 2.0,
            drag_x: None,
        };
        let model = Model::new(
            TraceSettings::default(),
            vec![dim(0, ["<a>", "b"]), dim(1, ["c", "d"])],
            vec![
                PathModel {
                    category_inds: vec![0, 0],
                    value_inds: vec![0],
                    count: 1.0,
                    color: "red".to_string(),
                    raw_color: RawColor::Name("red".to_string()),
                },
                PathModel {
                    category_inds: vec![1, 1],
                    value_inds: vec![1],
                    count: 1.0,
                    color: "blue".to_string(),
                    raw_color: RawColor::Name("blue".to_string()),
                },
            ],
        );
        let figure = FigureLayout {
            width: 400.0,
            height: 300.0,
            margin: Margin::default(),
        };
        let view = compute_trace_view(&model, &figure, &Config::default().layout, None);
        Scene::new(&view)
    }

    #[test]
    fn render_svg_basic() {
        let svg = render_svg(&scene(), &Config::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("class=\"path\"").count(), 2);
        assert_eq!(svg.matches("class=\"catrect\"").count(), 4);
        assert_eq!(svg.matches("class=\"dimlabel\"").count(), 2);
        assert!(svg.contains("&lt;a&gt;"));
        assert!(svg.contains("Dim &amp; 0"));
    }

    #[test]
    fn colors_are_escaped_in_attributes() {
        let mut scene = scene();
        scene.paths[0].fill = "red\" onload=\"x".to_string();
        let mut config = Config::default();
        config.render.background = "#fff\"/>".to_string();
        let svg = render_svg(&scene, &config);
        assert!(svg.contains("fill=\"red&quot; onload=&quot;x\""));
        assert!(svg.contains("fill=\"#fff&quot;/&gt;\""));
        assert!(!svg.contains("onload=\"x"));
    }

    #[test]
    fn labels_flip_on_the_last_dimension() {
        let svg = render_svg(&scene(), &Config::default());
        assert!(svg.contains("text-anchor=\"end\""));
        assert!(svg.contains("text-anchor=\"start\""));
    }

    #[test]
    fn emphasis_switches_stroke_style() {
        let mut scene = scene();
        let config = Config::default();
        let plain = render_svg(&scene, &config);
        scene.paths[0].emphasized = true;
        let hovered = render_svg(&scene, &config);
        assert_ne!(plain, hovered);
        assert!(hovered.contains(&format!(
            "stroke-width=\"{}\"",
            config.style.path_hover.stroke_width
        )));
    }
}
