//! The five charts drawn from an [`Analysis`].
//!
//! Each chart is a PNG under [`ChartConfig::output_dir`]. Nothing here feeds back into the
//! analysis tables.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::analyze::Analysis;
use crate::config::ChartConfig;

pub mod charts;
pub mod data;

pub use charts::{BarPalette, Labels};

/// Errors that can occur during chart rendering
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to create chart directory: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub const TOP_DIFFERENCE_FILE: &str = "top_difference.png";
pub const SINGLE_YEAR_FILE: &str = "single_year.png";
pub const YEAR_COMPARISON_FILE: &str = "year_comparison.png";
pub const TIME_SERIES_FILE: &str = "time_series.png";
pub const TOP_MAX_INCREASE_FILE: &str = "top_max_increase.png";

const BAR_SIZE: (u32, u32) = (1200, 720);
const WIDE_SIZE: (u32, u32) = (1400, 800);

/// Render a chart unless its data is empty; returns the written path.
fn render(
    dir: &Path,
    file: &str,
    empty: bool,
    draw: impl FnOnce(&Path) -> Result<(), PlotError>,
) -> Result<Option<PathBuf>> {
    let path = dir.join(file);
    if empty {
        warn!(chart = file, "no data; chart skipped");
        return Ok(None);
    }
    draw(&path).with_context(|| format!("rendering {}", path.display()))?;
    info!(path = %path.display(), "chart written");
    Ok(Some(path))
}

/// Draw every chart and return the files written.
#[instrument(level = "info", skip_all, fields(dir = %cfg.output_dir.display()))]
pub fn render_all(analysis: &Analysis, cfg: &ChartConfig) -> Result<Vec<PathBuf>> {
    let dir = cfg.output_dir.as_path();
    fs::create_dir_all(dir)
        .map_err(PlotError::from)
        .with_context(|| format!("creating {:?}", dir))?;

    let mut written = Vec::new();

    // prepare every input first so a bad chart year fails before any file is written
    let top_difference = data::ranked_bars(&analysis.top_difference);
    let single_year = data::single_year_bars(&analysis.cleaned, cfg.single_year)?;
    let groups = data::year_groups(&analysis.cleaned, &cfg.compare_years)?;
    let series = data::country_series(&analysis.cleaned)?;
    let top_max_increase = data::ranked_bars(&analysis.top_max_increase);

    // (a) top-N rise in average change
    written.extend(render(dir, TOP_DIFFERENCE_FILE, top_difference.is_empty(), |p| {
        charts::bar_chart(
            p,
            BAR_SIZE,
            Labels {
                title: "Top 10 Countries with Highest Increase in % After COVID-19",
                x: "Country",
                y: "Increase in Average %",
            },
            &top_difference,
            BarPalette::Viridis,
        )
    })?);

    // (b) one year, raw values
    let title = format!("Profitability in {} by Country", cfg.single_year);
    written.extend(render(dir, SINGLE_YEAR_FILE, single_year.is_empty(), |p| {
        charts::bar_chart(
            p,
            BAR_SIZE,
            Labels {
                title: &title,
                x: "Country",
                y: "Profitability (%)",
            },
            &single_year,
            BarPalette::Greens,
        )
    })?);

    // (c) two years side by side
    let [a, b] = cfg.compare_years;
    let title = format!("Profitability in {} vs. {} by Country", a, b);
    let series_names = vec![a.to_string(), b.to_string()];
    written.extend(render(dir, YEAR_COMPARISON_FILE, groups.is_empty(), |p| {
        charts::grouped_bar_chart(
            p,
            BAR_SIZE,
            Labels {
                title: &title,
                x: "Country",
                y: "Profitability (%)",
            },
            &series_names,
            &groups,
        )
    })?);

    // (d) every country over time
    let span = data::year_span(&series);
    let title = match span {
        Some((first, last)) => format!(
            "House Price Index (HPI) for Various Countries from {} to {}",
            first, last
        ),
        None => "House Price Index (HPI) for Various Countries".to_string(),
    };
    written.extend(render(dir, TIME_SERIES_FILE, span.is_none(), |p| {
        charts::line_chart(
            p,
            WIDE_SIZE,
            Labels {
                title: &title,
                x: "Year",
                y: "House Price Index (HPI)",
            },
            &series,
            cfg.reference_line,
        )
    })?);

    // (e) top-N single-year jump
    written.extend(render(dir, TOP_MAX_INCREASE_FILE, top_max_increase.is_empty(), |p| {
        charts::bar_chart(
            p,
            BAR_SIZE,
            Labels {
                title: "Top 10 Countries with the Highest Increase in House Price Index",
                x: "Country",
                y: "Max Increase (%)",
            },
            &top_max_increase,
            BarPalette::Viridis,
        )
    })?);

    Ok(written)
}
