use crate::ir::Margin;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal room kept free for category labels at both ends.
    pub category_label_pad: f32,
    pub dimension_width: f32,
    pub category_spacing: f32,
    pub linear_curvature: f32,
    pub hspline_curvature: f32,
    pub category_hit_slop: f32,
    pub dimension_grab_slop: f32,
    pub gap_hover_slop: f32,
    pub label_offset: f32,
    pub settle_duration_ms: u32,
    pub margin: Margin,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            category_label_pad: 40.0,
            dimension_width: 16.0,
            category_spacing: 8.0,
            linear_curvature: 0.0,
            hspline_curvature: 0.5,
            category_hit_slop: 2.0,
            dimension_grab_slop: 2.0,
            gap_hover_slop: 2.0,
            label_offset: 5.0,
            settle_duration_ms: 300,
            margin: Margin::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub fill_opacity: f32,
    pub stroke_width: f32,
    pub stroke_opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub path: StrokeStyle,
    pub path_hover: StrokeStyle,
    pub category: StrokeStyle,
    pub category_hover: StrokeStyle,
    pub band: StrokeStyle,
    pub band_hover: StrokeStyle,
    pub tooltip_category_font_size: f32,
    pub tooltip_color_font_size: f32,
    pub tooltip_path_font_size: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            path: StrokeStyle {
                fill_opacity: 0.6,
                stroke_width: 0.2,
                stroke_opacity: 1.0,
            },
            path_hover: StrokeStyle {
                fill_opacity: 0.8,
                stroke_width: 0.3,
                stroke_opacity: 1.0,
            },
            category: StrokeStyle {
                fill_opacity: 0.0,
                stroke_width: 1.0,
                stroke_opacity: 1.0,
            },
            category_hover: StrokeStyle {
                fill_opacity: 0.0,
                stroke_width: 2.5,
                stroke_opacity: 1.0,
            },
            band: StrokeStyle {
                fill_opacity: 1.0,
                stroke_width: 0.2,
                stroke_opacity: 1.0,
            },
            band_hover: StrokeStyle {
                fill_opacity: 1.0,
                stroke_width: 1.5,
                stroke_opacity: 1.0,
            },
            tooltip_category_font_size: 12.0,
            tooltip_color_font_size: 10.0,
            tooltip_path_font_size: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 600.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub style: StyleConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::plotly_default();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            style: StyleConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    font_family: Option<String>,
    category_label_font_size: Option<f32>,
    dimension_label_font_size: Option<f32>,
    label_color: Option<String>,
    category_stroke: Option<String>,
    band_stroke: Option<String>,
    path_stroke: Option<String>,
    tooltip_font_family: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarginFile {
    l: Option<f32>,
    r: Option<f32>,
    t: Option<f32>,
    b: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutFile {
    category_label_pad: Option<f32>,
    dimension_width: Option<f32>,
    category_spacing: Option<f32>,
    hspline_curvature: Option<f32>,
    category_hit_slop: Option<f32>,
    settle_duration_ms: Option<u32>,
    margin: Option<MarginFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StyleFile {
    path_opacity: Option<f32>,
    path_hover_opacity: Option<f32>,
    category_stroke_width: Option<f32>,
    category_hover_stroke_width: Option<f32>,
    band_stroke_width: Option<f32>,
    band_hover_stroke_width: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeFile>,
    layout: Option<LayoutFile>,
    style: Option<StyleFile>,
    width: Option<f32>,
    height: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "plotly" || theme_name == "default" {
            config.theme = Theme::plotly_default();
        } else {
            tracing::warn!(theme = theme_name, "unknown theme name; keeping default");
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.category_label_font_size {
            config.theme.category_label_font_size = v;
        }
        if let Some(v) = vars.dimension_label_font_size {
            config.theme.dimension_label_font_size = v;
        }
        if let Some(v) = vars.label_color {
            config.theme.label_color = v;
        }
        if let Some(v) = vars.category_stroke {
            config.theme.category_stroke = v;
        }
        if let Some(v) = vars.band_stroke {
            config.theme.band_stroke = v;
        }
        if let Some(v) = vars.path_stroke {
            config.theme.path_stroke = v;
        }
        if let Some(v) = vars.tooltip_font_family {
            config.theme.tooltip_font_family = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.category_label_pad {
            config.layout.category_label_pad = v;
        }
        if let Some(v) = layout.dimension_width {
            config.layout.dimension_width = v;
        }
        if let Some(v) = layout.category_spacing {
            config.layout.category_spacing = v;
        }
        if let Some(v) = layout.hspline_curvature {
            config.layout.hspline_curvature = v.clamp(0.0, 1.0);
        }
        if let Some(v) = layout.category_hit_slop {
            config.layout.category_hit_slop = v;
        }
        if let Some(v) = layout.settle_duration_ms {
            config.layout.settle_duration_ms = v;
        }
        if let Some(margin) = layout.margin {
            if let Some(v) = margin.l {
                config.layout.margin.l = v;
            }
            if let Some(v) = margin.r {
                config.layout.margin.r = v;
            }
            if let Some(v) = margin.t {
                config.layout.margin.t = v;
            }
            if let Some(v) = margin.b {
                config.layout.margin.b = v;
            }
        }
    }

    if let Some(style) = parsed.style {
        if let Some(v) = style.path_opacity {
            config.style.path.fill_opacity = v;
        }
        if let Some(v) = style.path_hover_opacity {
            config.style.path_hover.fill_opacity = v;
        }
        if let Some(v) = style.category_stroke_width {
            config.style.category.stroke_width = v;
        }
        if let Some(v) = style.category_hover_stroke_width {
            config.style.category_hover.stroke_width = v;
        }
        if let Some(v) = style.band_stroke_width {
            config.style.band.stroke_width = v;
        }
        if let Some(v) = style.band_hover_stroke_width {
            config.style.band_hover.stroke_width = v;
        }
    }

    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.height {
        config.render.height = v;
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
