use serde::{Deserialize, Serialize};

pub const DEFAULT_LINE_COLOR: &str = "#1f77b4";

const DEFAULT_COLORSCALE: [(f64, &str); 3] = [(0.0, "#440154"), (0.5, "#21918c"), (1.0, "#fde725")];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub category_label_font_size: f32,
    pub dimension_label_font_size: f32,
    pub label_color: String,
    pub label_halo: String,
    pub category_stroke: String,
    pub band_stroke: String,
    pub path_stroke: String,
    pub tooltip_font_family: String,
    pub tooltip_background: String,
    pub tooltip_border: String,
    pub background: String,
}

impl Theme {
    pub fn plotly_default() -> Self {
        Self {
            font_family: "\"Open Sans\", verdana, arial, sans-serif".to_string(),
            category_label_font_size: 10.0,
            dimension_label_font_size: 14.0,
            label_color: "rgb(0, 0, 0)".to_string(),
            label_halo: "rgb(255, 255, 255)".to_string(),
            category_stroke: "black".to_string(),
            band_stroke: "black".to_string(),
            path_stroke: "lightgray".to_string(),
            tooltip_font_family: "Monaco, \"Courier New\", monospace".to_string(),
            tooltip_background: "lightgray".to_string(),
            tooltip_border: "black".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            category_label_font_size: 11.0,
            dimension_label_font_size: 13.0,
            label_color: "#1C2430".to_string(),
            label_halo: "#FFFFFF".to_string(),
            category_stroke: "#1C2430".to_string(),
            band_stroke: "#1C2430".to_string(),
            path_stroke: "#C7D2E5".to_string(),
            tooltip_font_family: "Monaco, \"Courier New\", monospace".to_string(),
            tooltip_background: "#EEF2F8".to_string(),
            tooltip_border: "#7A8AA6".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::plotly_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8;
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }

    /// WCAG relative luminance.
    fn luminance(self) -> f64 {
        let channel = |c: u8| {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * channel(self.r) + 0.7152 * channel(self.g) + 0.0722 * channel(self.b)
    }

    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)`, `rgba(...)` and a handful of
/// CSS names.
pub fn parse_color(input: &str) -> Option<Rgb> {
    let value = input.trim().to_ascii_lowercase();
    if let Some(hex) = value.strip_prefix('#') {
        let expand = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let mut chars = hex.chars().map(|c| expand(&format!("{c}{c}")));
                Some(Rgb {
                    r: chars.next()??,
                    g: chars.next()??,
                    b: chars.next()??,
                })
            }
            6 => Some(Rgb {
                r: expand(&hex[0..2])?,
                g: expand(&hex[2..4])?,
                b: expand(&hex[4..6])?,
            }),
            _ => None,
        };
    }
    if let Some(args) = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let mut parts = args.split(',').map(|p| p.trim().parse::<f64>().ok());
        let mut next = || parts.next().flatten().map(|v| v.round().clamp(0.0, 255.0) as u8);
        return Some(Rgb {
            r: next()?,
            g: next()?,
            b: next()?,
        });
    }
    let named = match value.as_str() {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "gray" | "grey" => (128, 128, 128),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "orange" => (255, 165, 0),
        "purple" => (128, 0, 128),
        "steelblue" => (70, 130, 180),
        _ => return None,
    };
    Some(Rgb {
        r: named.0,
        g: named.1,
        b: named.2,
    })
}

/// Picks the candidate with the highest contrast ratio against `background`.
/// Unparseable input falls back to the first candidate.
pub fn most_readable<'a>(background: &str, candidates: &[&'a str]) -> &'a str {
    let fallback = candidates.first().copied().unwrap_or("black");
    let Some(bg) = parse_color(background) else {
        return fallback;
    };
    let bg_lum = bg.luminance();
    let mut best = fallback;
    let mut best_ratio = f64::NEG_INFINITY;
    for &candidate in candidates {
        let Some(fg) = parse_color(candidate) else {
            continue;
        };
        let fg_lum = fg.luminance();
        let ratio = (bg_lum.max(fg_lum) + 0.05) / (bg_lum.min(fg_lum) + 0.05);
        if ratio > best_ratio {
            best_ratio = ratio;
            best = candidate;
        }
    }
    best
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorscale {
    stops: Vec<(f64, Rgb)>,
}

impl Colorscale {
    pub fn from_stops(stops: &[(f64, String)]) -> Result<Self, String> {
        if stops.len() < 2 {
            return Err(format!("expected at least 2 stops, found {}", stops.len()));
        }
        let mut parsed = Vec::with_capacity(stops.len());
        for (position, color) in stops {
            if !position.is_finite() {
                return Err(format!("stop position {position} is not finite"));
            }
            let rgb = parse_color(color).ok_or_else(|| format!("unrecognized color `{color}`"))?;
            parsed.push((*position, rgb));
        }
        if parsed.windows(2).any(|w| w[1].0 < w[0].0) {
            return Err("stop positions must be ascending".to_string());
        }
        Ok(Self { stops: parsed })
    }

    /// Samples the scale at `t` in `[0, 1]` (clamped) as an `rgb(...)` string.
    pub fn sample(&self, t: f64) -> String {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let first = self.stops[0];
        if t <= first.0 {
            return first.1.to_css();
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let span = p1 - p0;
                let local = if span > 0.0 { (t - p0) / span } else { 1.0 };
                return c0.lerp(c1, local).to_css();
            }
        }
        self.stops[self.stops.len() - 1].1.to_css()
    }
}

impl Default for Colorscale {
    fn default() -> Self {
        Self {
            stops: DEFAULT_COLORSCALE
                .iter()
                .filter_map(|(p, c)| parse_color(c).map(|rgb| (*p, rgb)))
                .collect(),
        }
    }
}
