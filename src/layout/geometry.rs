//! Ribbon outlines for paths.
//!
//! A ribbon runs horizontally across each category it passes through and is
//! joined between neighboring dimensions by a cubic curve whose control
//! points sit at `curvature` and `1 - curvature` of the gap. `curvature = 0`
//! gives straight connectors, `0.5` a smooth horizontal spline.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    CubicTo {
        c1: (f32, f32),
        c2: (f32, f32),
        end: (f32, f32),
    },
    Close,
}

impl PathCommand {
    fn end_point(&self) -> Option<(f32, f32)> {
        match *self {
            PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => Some((x, y)),
            PathCommand::CubicTo { end, .. } => Some(end),
            PathCommand::Close => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RibbonOutline {
    pub commands: Vec<PathCommand>,
}

impl RibbonOutline {
    pub fn start(&self) -> Option<(f32, f32)> {
        self.commands.first().and_then(PathCommand::end_point)
    }

    /// Last drawn point before the closing command.
    pub fn end(&self) -> Option<(f32, f32)> {
        self.commands.iter().rev().find_map(PathCommand::end_point)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close)) && self.start() == self.end()
    }

    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        for command in &self.commands {
            if !d.is_empty() {
                d.push(' ');
            }
            match command {
                PathCommand::MoveTo(x, y) => d.push_str(&format!("M {x:.2},{y:.2}")),
                PathCommand::LineTo(x, y) => d.push_str(&format!("L {x:.2},{y:.2}")),
                PathCommand::CubicTo { c1, c2, end } => d.push_str(&format!(
                    "C {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
                    c1.0, c1.1, c2.0, c2.1, end.0, end.1
                )),
                PathCommand::Close => d.push('Z'),
            }
        }
        d
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn cubic(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Control-point x positions for the gap after each dimension but the last.
fn gap_controls(left_xs: &[f32], widths: &[f32], curvature: f32) -> Vec<(f32, f32)> {
    let n = left_xs.len().min(widths.len());
    (0..n.saturating_sub(1))
        .map(|d| {
            let from = left_xs[d] + widths[d];
            let to = left_xs[d + 1];
            (lerp(from, to, curvature), lerp(from, to, 1.0 - curvature))
        })
        .collect()
}

/// Builds the closed outline of one ribbon. Inputs are per display dimension;
/// mismatched lengths are truncated to the shortest.
pub fn build_ribbon(
    left_xs: &[f32],
    top_ys: &[f32],
    widths: &[f32],
    thickness: f32,
    curvature: f32,
) -> RibbonOutline {
    let n = left_xs.len().min(top_ys.len()).min(widths.len());
    if n == 0 {
        return RibbonOutline::default();
    }
    let h = if thickness.is_finite() { thickness.max(0.0) } else { 0.0 };
    let controls = gap_controls(&left_xs[..n], &widths[..n], curvature.clamp(0.0, 1.0));
    let mut commands = Vec::with_capacity(4 * n + 4);

    commands.push(PathCommand::MoveTo(left_xs[0], top_ys[0]));
    commands.push(PathCommand::LineTo(left_xs[0] + widths[0], top_ys[0]));
    for d in 1..n {
        let (cx1, cx2) = controls[d - 1];
        commands.push(PathCommand::CubicTo {
            c1: (cx1, top_ys[d - 1]),
            c2: (cx2, top_ys[d]),
            end: (left_xs[d], top_ys[d]),
        });
        commands.push(PathCommand::LineTo(left_xs[d] + widths[d], top_ys[d]));
    }

    let last = n - 1;
    commands.push(PathCommand::LineTo(left_xs[last] + widths[last], top_ys[last] + h));
    commands.push(PathCommand::LineTo(left_xs[last], top_ys[last] + h));
    for d in (0..last).rev() {
        let (cx1, cx2) = controls[d];
        commands.push(PathCommand::CubicTo {
            c1: (cx2, top_ys[d + 1] + h),
            c2: (cx1, top_ys[d] + h),
            end: (left_xs[d] + widths[d], top_ys[d] + h),
        });
        commands.push(PathCommand::LineTo(left_xs[d], top_ys[d] + h));
    }
    commands.push(PathCommand::LineTo(left_xs[0], top_ys[0]));
    commands.push(PathCommand::Close);

    RibbonOutline { commands }
}

/// Top edge of a ribbon at horizontal position `x`, if the ribbon spans it.
pub fn ribbon_top_at(
    left_xs: &[f32],
    top_ys: &[f32],
    widths: &[f32],
    curvature: f32,
    x: f32,
) -> Option<f32> {
    let n = left_xs.len().min(top_ys.len()).min(widths.len());
    for d in 0..n {
        if x >= left_xs[d] && x <= left_xs[d] + widths[d] {
            return Some(top_ys[d]);
        }
    }
    let controls = gap_controls(&left_xs[..n], &widths[..n], curvature.clamp(0.0, 1.0));
    for d in 0..n.saturating_sub(1) {
        let from = left_xs[d] + widths[d];
        let to = left_xs[d + 1];
        if !(from < to && x > from && x < to) {
            continue;
        }
        let (cx1, cx2) = controls[d];
        // x(t) is monotonic on [0, 1] because the control points lie inside the gap.
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        for _ in 0..32 {
            let mid = 0.5 * (lo + hi);
            if cubic(from, cx1, cx2, to, mid) < x {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        let t = 0.5 * (lo + hi);
        return Some(cubic(top_ys[d], top_ys[d], top_ys[d + 1], top_ys[d + 1], t));
    }
    None
}
