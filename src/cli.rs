use crate::config::{Config, load_config};
use crate::ir::{FigureLayout, Model, TraceSpec};
use crate::layout::{TraceView, compute_trace_view};
use crate::layout_dump::write_layout_dump;
use crate::render::{render_figure_svg, write_output_png, write_output_svg};
use crate::scene::Scene;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "parcats", version, about = "Parallel categories diagram renderer")]
pub struct Args {
    /// Input trace JSON (one trace or an array of traces) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Write the computed layout of the first trace as JSON
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Single(Box<TraceSpec>),
    Figure(Vec<TraceSpec>),
}

impl InputDocument {
    fn into_traces(self) -> Vec<TraceSpec> {
        match self {
            InputDocument::Single(trace) => vec![*trace],
            InputDocument::Figure(traces) => traces,
        }
    }
}

pub fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let input = read_input(args.input.as_deref())?;
    let document: InputDocument =
        serde_json::from_str(&input).context("input is not a parcats trace")?;
    let traces = document.into_traces();
    if traces.is_empty() {
        return Err(anyhow::anyhow!("No traces found in input"));
    }

    let views = compute_views(&traces, &config)?;
    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &views[0])?;
    }

    let scenes: Vec<Scene> = views.iter().map(Scene::new).collect();
    let svg = render_figure_svg(&scenes, &config);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render)?;
        }
    }
    Ok(())
}

pub fn figure_for(config: &Config) -> FigureLayout {
    FigureLayout {
        width: config.render.width,
        height: config.render.height,
        margin: config.layout.margin,
    }
}

fn compute_views(traces: &[TraceSpec], config: &Config) -> Result<Vec<TraceView>> {
    let figure = figure_for(config);
    traces
        .iter()
        .enumerate()
        .map(|(idx, spec)| {
            let mut model =
                Model::from_spec(spec).with_context(|| format!("invalid trace {idx}"))?;
            if spec.uid.is_none() {
                model.settings.uid = format!("trace-{idx}");
            }
            Ok(compute_trace_view(&model, &figure, &config.layout, None))
        })
        .collect()
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_single_trace_or_an_array() {
        let one = r#"{"dimensions": [{"label": "A", "values": ["x", "y"]}]}"#;
        let many = r#"[{"dimensions": [{"label": "A", "values": ["x"]}]},
                       {"dimensions": [{"label": "B", "values": [1, 2]}]}]"#;
        let one: InputDocument = serde_json::from_str(one).unwrap();
        let many: InputDocument = serde_json::from_str(many).unwrap();
        assert_eq!(one.into_traces().len(), 1);
        assert_eq!(many.into_traces().len(), 2);
    }

    #[test]
    fn unnamed_traces_get_positional_uids() {
        let traces: Vec<TraceSpec> = serde_json::from_str(
            r#"[{"dimensions": [{"label": "A", "values": ["x"]}]},
                {"dimensions": [{"label": "B", "values": ["y"]}]}]"#,
        )
        .unwrap();
        let views = compute_views(&traces, &Config::default()).unwrap();
        assert_eq!(views[0].key, "trace-0");
        assert_eq!(views[1].key, "trace-1");
    }
}
