use parcats_rs::Config;
use parcats_rs::theme::Theme;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParcatsRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f32>,
    height: Option<f32>,
    background: Option<String>,
}

fn build_config(options: ParcatsRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(background) = options.background {
        config.render.background = background;
    }
    config
}

#[wasm_bindgen]
pub fn render_parcats_svg(trace_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<ParcatsRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        ParcatsRenderOptions::default()
    };

    let config = build_config(options);
    parcats_rs::render_spec(trace_json, &config).map_err(|error| JsValue::from_str(&error.to_string()))
}
