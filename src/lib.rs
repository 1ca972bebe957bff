pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod interaction;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod reconcile;
pub mod render;
pub mod reorder;
pub mod scene;
pub mod theme;

pub use chart::{ChartEvent, EventSink, ParcatsChart, Pointer, PointsEvent};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use ir::{FigureLayout, Model, ModelError, TraceSpec};
pub use layout::{TraceView, compute_trace_view};
pub use reorder::{RestyleOp, RestyleUpdate};
pub use scene::Scene;

/// Renders a single trace described as JSON to an SVG document.
pub fn render_spec(json: &str, config: &Config) -> anyhow::Result<String> {
    let spec: TraceSpec = serde_json::from_str(json)?;
    let model = Model::from_spec(&spec)?;
    let figure = FigureLayout {
        width: config.render.width,
        height: config.render.height,
        margin: config.layout.margin,
    };
    let view = compute_trace_view(&model, &figure, &config.layout, None);
    Ok(render::render_svg(&Scene::new(&view), config))
}
