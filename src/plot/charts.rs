//! PNG rendering with the [`plotters`] bitmap backend.

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::path::Path;

use super::data::{value_range, Bar, Group, Series};
use super::PlotError;

type Result<T> = core::result::Result<T, PlotError>;

const FONT: &str = "sans-serif";

/// Caption and axis titles of one chart.
#[derive(Debug, Clone, Copy)]
pub struct Labels<'a> {
    pub title: &'a str,
    pub x: &'a str,
    pub y: &'a str,
}

/// Bar colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarPalette {
    /// Purple → yellow-green sweep across the bars.
    Viridis,
    /// Dark → light greens.
    Greens,
}

impl BarPalette {
    fn shade(self, i: usize, n: usize) -> HSLColor {
        let t = if n > 1 {
            i as f64 / (n - 1) as f64
        } else {
            0.0
        };
        match self {
            BarPalette::Viridis => HSLColor(0.76 - 0.58 * t, 0.62, 0.32 + 0.22 * t),
            BarPalette::Greens => HSLColor(0.33, 0.55, 0.22 + 0.40 * t),
        }
    }
}

fn rotated_label_style() -> TextStyle<'static> {
    (FONT, 13).into_font().transform(FontTransform::Rotate90).into()
}

/// Single-series categorical bar chart.
pub fn bar_chart(
    path: &Path,
    size: (u32, u32),
    labels: Labels<'_>,
    bars: &[Bar],
    palette: BarPalette,
) -> Result<()> {
    if bars.is_empty() {
        return Err(PlotError::InvalidData("no bars to draw".into()));
    }
    let n = bars.len();
    let names: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
    let (y_lo, y_hi) = value_range(bars.iter().map(|b| b.value));

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(labels.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(150)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_fmt = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => names.get(*i).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&x_fmt)
        .x_label_style(rotated_label_style())
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, b)| {
            let mut bar = Rectangle::new(
                [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), b.value)],
                palette.shade(i, n).filled(),
            );
            bar.set_margin(0, 0, 6, 6);
            bar
        }))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// Side-by-side bars per category, one bar per series.
pub fn grouped_bar_chart(
    path: &Path,
    size: (u32, u32),
    labels: Labels<'_>,
    series_names: &[String],
    groups: &[Group],
) -> Result<()> {
    if groups.is_empty() || series_names.is_empty() {
        return Err(PlotError::InvalidData("no groups to draw".into()));
    }
    let m = series_names.len();
    // one empty slot after each group
    let stride = m + 1;
    let slots = groups.len() * stride;
    let names: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    let (y_lo, y_hi) = value_range(groups.iter().flat_map(|g| g.values.iter().flatten().copied()));

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(labels.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(150)
        .y_label_area_size(70)
        .build_cartesian_2d((0..slots).into_segmented(), y_lo..y_hi)
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    let x_fmt = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(j) if j % stride == 0 => {
            names.get(j / stride).map(|s| s.to_string()).unwrap_or_default()
        }
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&x_fmt)
        .x_label_style(rotated_label_style())
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    for (k, name) in series_names.iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        chart
            .draw_series(groups.iter().enumerate().filter_map(|(i, g)| {
                let v = g.values.get(k).copied().flatten()?;
                let x = i * stride + k;
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(x), 0.0), (SegmentValue::Exact(x + 1), v)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 1, 1);
                Some(bar)
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}

/// One line with point markers per series, plus a dashed horizontal reference line.
pub fn line_chart(
    path: &Path,
    size: (u32, u32),
    labels: Labels<'_>,
    series: &[Series],
    reference: f64,
) -> Result<()> {
    let points = || {
        series
            .iter()
            .flat_map(|s| s.points.iter())
            .filter(|(_, y)| y.is_finite())
    };
    let (x_lo, x_hi) = points()
        .fold(None, |acc: Option<(i32, i32)>, &(x, _)| {
            Some(acc.map_or((x, x), |(lo, hi)| (lo.min(x), hi.max(x))))
        })
        .ok_or_else(|| PlotError::InvalidData("no points to draw".into()))?;
    let (y_lo, y_hi) = points()
        .map(|&(_, y)| y)
        .chain(std::iter::once(reference))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
    let pad = ((y_hi - y_lo) * 0.05).max(1.0);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(labels.title, (FONT, 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi + 1, (y_lo - pad)..(y_hi + pad))
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .configure_mesh()
        .x_labels((x_hi - x_lo + 2) as usize)
        .x_label_formatter(&|y: &i32| y.to_string())
        .x_desc(labels.x)
        .y_desc(labels.y)
        .draw()
        .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

    chart
        .draw_series(DashedLineSeries::new(
            vec![(x_lo, reference), (x_hi + 1, reference)],
            8,
            6,
            BLACK.mix(0.5).stroke_width(1),
        ))
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    for (k, s) in series.iter().enumerate() {
        let color = Palette99::pick(k).to_rgba();
        chart
            .draw_series(LineSeries::new(
                s.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(|e| PlotError::Drawing(e.to_string()))?
            .label(s.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        chart
            .draw_series(
                s.points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font((FONT, 11))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;

    root.present()
        .map_err(|e| PlotError::Drawing(e.to_string()))?;
    Ok(())
}
