//! SVG line chart rendering.
//!
//! A [`ChartContext`] is built per render: it owns the style, collects the
//! line series, computes both axes from the data and serializes everything
//! into one self-contained SVG document. The x-axis is log base 2; the
//! y-axis is linear with its bottom pinned at zero.

use std::io::Write;

use quick_xml::escape::escape;

use crate::error::PerfError;
use crate::series::ThroughputSeries;

/// Fixed presentation parameters for the throughput chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    /// Canvas width in pixels.
    pub width: f64,
    /// Canvas height in pixels.
    pub height: f64,
    /// Chart title.
    pub title: String,
    /// X-axis label.
    pub x_label: String,
    /// Y-axis label.
    pub y_label: String,
    /// Legend label of the unsized-range series.
    pub unsized_label: String,
    /// Legend label of the `strlen` + sized-range series.
    pub sized_label: String,
    /// Stroke color of the unsized-range series.
    pub unsized_color: String,
    /// Stroke color of the sized-range series.
    pub sized_color: String,
    /// CSS font family for all text.
    pub font_family: String,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            title: "Performance benefit of accepting unsized ranges".into(),
            x_label: "Message length (B)".into(),
            y_label: "Throughput (GiB/s)".into(),
            unsized_label: "Passed as unsized range".into(),
            sized_label: "strlen + sized + passed as sized range".into(),
            unsized_color: "#ff0000".into(),
            sized_color: "#0000ff".into(),
            font_family: "DejaVu Sans, Bitstream Vera Sans, sans-serif".into(),
        }
    }
}

// Plot area margins, in pixels.
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 56.0;

const GRID_COLOR: &str = "#b0b0b0";
const TICK_LEN: f64 = 4.0;
const FONT_SIZE: f64 = 11.0;
const TITLE_FONT_SIZE: f64 = 13.0;
/// Exponent range shown when there is no data.
const EMPTY_X_EXPONENTS: (i32, i32) = (0, 10);
/// Most x ticks drawn before thinning to every n-th power.
const MAX_X_TICKS: i32 = 12;
/// Target number of y intervals.
const Y_INTERVALS: f64 = 6.0;

/// Render both throughput series with the given style.
pub fn render_chart(series: &ThroughputSeries, style: &ChartStyle) -> String {
    let mut chart = ChartContext::new(style);
    chart.add_line(
        &style.unsized_label,
        &style.unsized_color,
        &series.message_lens,
        &series.unsized_gibps,
    );
    chart.add_line(
        &style.sized_label,
        &style.sized_color,
        &series.message_lens,
        &series.sized_gibps,
    );
    chart.finish()
}

/// Write a rendered chart to `sink` and flush it.
pub fn write_chart(svg: &str, mut sink: impl Write) -> Result<(), PerfError> {
    sink.write_all(svg.as_bytes())
        .and_then(|()| sink.flush())
        .map_err(PerfError::OutputWrite)
}

/// One labeled polyline.
#[derive(Debug, Clone)]
struct Line {
    label: String,
    color: String,
    points: Vec<(f64, f64)>,
}

/// Drawing state for a single chart.
///
/// Nothing outlives [`ChartContext::finish`], so rendering several charts in
/// one process never shares state.
#[derive(Debug)]
pub struct ChartContext<'s> {
    style: &'s ChartStyle,
    lines: Vec<Line>,
}

impl<'s> ChartContext<'s> {
    /// Start an empty chart.
    pub fn new(style: &'s ChartStyle) -> Self {
        Self {
            style,
            lines: Vec::new(),
        }
    }

    /// Add a line series. Extra values in the longer slice are ignored.
    pub fn add_line(&mut self, label: &str, color: &str, xs: &[f64], ys: &[f64]) {
        self.lines.push(Line {
            label: label.to_owned(),
            color: color.to_owned(),
            points: xs.iter().copied().zip(ys.iter().copied()).collect(),
        });
    }

    /// Lay out the axes and serialize the chart.
    pub fn finish(self) -> String {
        let style = self.style;
        let plot = PlotArea {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            width: style.width - MARGIN_LEFT - MARGIN_RIGHT,
            height: style.height - MARGIN_TOP - MARGIN_BOTTOM,
        };
        let x_axis = LogAxis::fit(self.lines.iter().flat_map(|l| l.points.iter().map(|p| p.0)));
        let y_axis = LinearAxis::fit(self.lines.iter().flat_map(|l| l.points.iter().map(|p| p.1)));

        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
        svg.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" \
             viewBox=\"0 0 {w} {h}\" font-family=\"{font}\" font-size=\"{FONT_SIZE}\">\n",
            w = num(style.width),
            h = num(style.height),
            font = escape(&style.font_family),
        ));
        svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n");
        svg.push_str(&format!(
            "  <defs>\n    <clipPath id=\"plot-area\">\n      \
             <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"/>\n    </clipPath>\n  </defs>\n",
            num(plot.left),
            num(plot.top),
            num(plot.width),
            num(plot.height),
        ));

        push_grid(&mut svg, &plot, &x_axis, &y_axis);
        svg.push_str(&format!(
            "  <rect class=\"frame\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" \
             fill=\"none\" stroke=\"#000000\" stroke-width=\"0.8\"/>\n",
            num(plot.left),
            num(plot.top),
            num(plot.width),
            num(plot.height),
        ));
        push_ticks(&mut svg, &plot, &x_axis, &y_axis);

        svg.push_str("  <g class=\"series\" clip-path=\"url(#plot-area)\">\n");
        for line in &self.lines {
            push_line(&mut svg, &plot, &x_axis, &y_axis, line);
        }
        svg.push_str("  </g>\n");

        self.push_legend(&mut svg, &plot);
        self.push_labels(&mut svg, &plot);
        svg.push_str("</svg>\n");
        svg
    }

    fn push_legend(&self, svg: &mut String, plot: &PlotArea) {
        let row = FONT_SIZE + 8.0;
        let longest = self
            .lines
            .iter()
            .map(|l| l.label.chars().count())
            .max()
            .unwrap_or(0);
        // Rough glyph width; the legend only needs to contain its labels.
        let box_width = 44.0 + longest as f64 * FONT_SIZE * 0.6;
        let box_height = 8.0 + row * self.lines.len() as f64;
        let left = plot.left + 10.0;
        let top = plot.top + 10.0;

        svg.push_str("  <g class=\"legend\">\n");
        svg.push_str(&format!(
            "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"3\" \
             fill=\"#ffffff\" fill-opacity=\"0.8\" stroke=\"#cccccc\"/>\n",
            num(left),
            num(top),
            num(box_width),
            num(box_height),
        ));
        for (i, line) in self.lines.iter().enumerate() {
            let cy = top + 4.0 + row * (i as f64 + 0.5);
            svg.push_str(&format!(
                "    <line x1=\"{}\" y1=\"{cy}\" x2=\"{}\" y2=\"{cy}\" stroke=\"{}\" stroke-width=\"1.5\"/>\n",
                num(left + 8.0),
                num(left + 32.0),
                escape(&line.color),
                cy = num(cy),
            ));
            svg.push_str(&format!(
                "    <text x=\"{}\" y=\"{}\" dominant-baseline=\"middle\">{}</text>\n",
                num(left + 40.0),
                num(cy),
                escape(&line.label),
            ));
        }
        svg.push_str("  </g>\n");
    }

    fn push_labels(&self, svg: &mut String, plot: &PlotArea) {
        let style = self.style;
        svg.push_str(&format!(
            "  <text class=\"title\" x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"{TITLE_FONT_SIZE}\">{}</text>\n",
            num(plot.left + plot.width / 2.0),
            num(plot.top - 14.0),
            escape(&style.title),
        ));
        svg.push_str(&format!(
            "  <text class=\"x-label\" x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>\n",
            num(plot.left + plot.width / 2.0),
            num(style.height - 12.0),
            escape(&style.x_label),
        ));
        svg.push_str(&format!(
            "  <text class=\"y-label\" transform=\"translate({} {}) rotate(-90)\" text-anchor=\"middle\">{}</text>\n",
            num(16.0),
            num(plot.top + plot.height / 2.0),
            escape(&style.y_label),
        ));
    }
}

fn push_grid(svg: &mut String, plot: &PlotArea, x: &LogAxis, y: &LinearAxis) {
    svg.push_str(&format!(
        "  <g class=\"grid\" stroke=\"{GRID_COLOR}\" stroke-width=\"0.8\">\n"
    ));
    for exp in x.ticks() {
        let px = plot.x(x.position(2f64.powi(exp)));
        svg.push_str(&format!(
            "    <line x1=\"{px}\" y1=\"{}\" x2=\"{px}\" y2=\"{}\"/>\n",
            num(plot.top),
            num(plot.bottom()),
            px = num(px),
        ));
    }
    for value in y.ticks() {
        let py = plot.y(y.position(value));
        svg.push_str(&format!(
            "    <line x1=\"{}\" y1=\"{py}\" x2=\"{}\" y2=\"{py}\"/>\n",
            num(plot.left),
            num(plot.right()),
            py = num(py),
        ));
    }
    svg.push_str("  </g>\n");
}

fn push_ticks(svg: &mut String, plot: &PlotArea, x: &LogAxis, y: &LinearAxis) {
    svg.push_str("  <g class=\"ticks\" stroke=\"#000000\" stroke-width=\"0.8\">\n");
    for exp in x.ticks() {
        let px = num(plot.x(x.position(2f64.powi(exp))));
        svg.push_str(&format!(
            "    <line x1=\"{px}\" y1=\"{}\" x2=\"{px}\" y2=\"{}\"/>\n",
            num(plot.bottom()),
            num(plot.bottom() + TICK_LEN),
        ));
    }
    for value in y.ticks() {
        let py = num(plot.y(y.position(value)));
        svg.push_str(&format!(
            "    <line x1=\"{}\" y1=\"{py}\" x2=\"{}\" y2=\"{py}\"/>\n",
            num(plot.left - TICK_LEN),
            num(plot.left),
        ));
    }
    svg.push_str("  </g>\n");

    svg.push_str("  <g class=\"tick-labels\">\n");
    for exp in x.ticks() {
        svg.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" text-anchor=\"middle\">2<tspan dy=\"-5\" font-size=\"8\">{exp}</tspan></text>\n",
            num(plot.x(x.position(2f64.powi(exp)))),
            num(plot.bottom() + TICK_LEN + FONT_SIZE + 4.0),
        ));
    }
    for value in y.ticks() {
        svg.push_str(&format!(
            "    <text x=\"{}\" y=\"{}\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            num(plot.left - TICK_LEN - 3.0),
            num(plot.y(y.position(value))),
            y.label(value),
        ));
    }
    svg.push_str("  </g>\n");
}

fn push_line(svg: &mut String, plot: &PlotArea, x: &LogAxis, y: &LinearAxis, line: &Line) {
    if line.points.is_empty() {
        return;
    }
    let coords: Vec<(String, String)> = line
        .points
        .iter()
        .map(|&(px, py)| (num(plot.x(x.position(px))), num(plot.y(y.position(py)))))
        .collect();
    let points = coords
        .iter()
        .map(|(cx, cy)| format!("{cx},{cy}"))
        .collect::<Vec<_>>()
        .join(" ");
    let color = escape(&line.color);

    svg.push_str(&format!(
        "    <polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" \
         stroke-linejoin=\"round\" points=\"{points}\"/>\n"
    ));
    for (cx, cy) in &coords {
        svg.push_str(&format!(
            "    <circle cx=\"{cx}\" cy=\"{cy}\" r=\"2\" fill=\"{color}\"/>\n"
        ));
    }
}

/// Pixel rectangle the data is drawn into.
struct PlotArea {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

impl PlotArea {
    fn right(&self) -> f64 {
        self.left + self.width
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Pixel x for a fraction of the axis span.
    fn x(&self, fraction: f64) -> f64 {
        self.left + fraction * self.width
    }

    /// Pixel y for a fraction of the axis span (0 at the bottom).
    fn y(&self, fraction: f64) -> f64 {
        self.bottom() - fraction * self.height
    }
}

/// Base-2 logarithmic axis spanning whole powers of two.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LogAxis {
    min_exp: i32,
    max_exp: i32,
}

impl LogAxis {
    fn fit(values: impl Iterator<Item = f64>) -> Self {
        let (lo, hi) = values
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(f64::log2)
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .map_or(EMPTY_X_EXPONENTS, |(lo, hi)| {
                (lo.floor() as i32, hi.ceil() as i32)
            });
        if lo == hi {
            Self {
                min_exp: lo - 1,
                max_exp: hi + 1,
            }
        } else {
            Self {
                min_exp: lo,
                max_exp: hi,
            }
        }
    }

    /// Fraction of the axis span at which `value` sits.
    fn position(&self, value: f64) -> f64 {
        (value.log2() - f64::from(self.min_exp)) / f64::from(self.max_exp - self.min_exp)
    }

    /// Exponents that get a tick and gridline.
    fn ticks(&self) -> Vec<i32> {
        let span = self.max_exp - self.min_exp;
        let step = ((span + MAX_X_TICKS - 1) / MAX_X_TICKS).max(1);
        (0..=span / step).map(|i| self.min_exp + i * step).collect()
    }
}

/// Linear axis from zero to a rounded-up maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
struct LinearAxis {
    max: f64,
    step: f64,
}

impl LinearAxis {
    fn fit(values: impl Iterator<Item = f64>) -> Self {
        let peak = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
        if peak <= 0.0 {
            return Self { max: 1.0, step: 0.2 };
        }
        let step = nice_step(peak * 1.05 / Y_INTERVALS);
        Self {
            max: (peak * 1.05 / step).ceil() * step,
            step,
        }
    }

    fn position(&self, value: f64) -> f64 {
        value / self.max
    }

    fn ticks(&self) -> Vec<f64> {
        let count = (self.max / self.step).round() as u32;
        (0..=count).map(|i| f64::from(i) * self.step).collect()
    }

    fn label(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = decimals(self.step))
    }
}

/// Round `raw` up to 1, 2, 2.5 or 5 times a power of ten.
fn nice_step(raw: f64) -> f64 {
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 2.5 {
        2.5
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Fewest decimal places that print `step` exactly.
fn decimals(step: f64) -> usize {
    (0..=9)
        .find(|&d| {
            let scaled = step * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .map_or(9, |d| d as usize)
}

/// Fixed-precision coordinate formatting, so output is reproducible.
fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_owned() } else { s.to_owned() }
}
