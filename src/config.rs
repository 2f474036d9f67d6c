// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};

static DEFAULT_PAGE_URL: &str =
    "https://ec.europa.eu/eurostat/web/products-eurostat-news/w/ddn-20241003-2";

static DEFAULT_IMAGE_URL: &str = "https://ec.europa.eu/eurostat/documents/4187653/18051237/house-prices-rents-change-between-2010-q2-2024jpg.jpg/14395314-47a4-721e-37ef-ea84c8a10a28?t=1727940974598";

/// Name the label column carries once the sheet is cleaned.
pub const COUNTRY_COLUMN: &str = "Country";

/// Problems with the spreadsheet layout or the configuration describing it.
#[derive(Error, Debug, PartialEq)]
pub enum LayoutError {
    #[error("column {column:?} not found in sheet header")]
    MissingColumn { column: String },

    #[error("drop row {index} is out of range: sheet has {rows} data rows")]
    RowOutOfRange { index: usize, rows: usize },

    #[error("no year columns found in sheet header")]
    NoYearColumns,

    #[error("need at least {needed} year columns, found {found}")]
    TooFewColumns { needed: usize, found: usize },

    #[error("year range {first}..={last} is empty")]
    EmptyYearRange { first: i32, last: i32 },

    #[error("year {year} is outside the configured range {first}..={last}")]
    YearOutsideRange { year: i32, first: i32, last: i32 },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Inclusive range of year columns to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: i32,
    pub last: i32,
}

impl YearRange {
    pub fn columns(&self) -> Vec<String> {
        (self.first..=self.last).map(|y| y.to_string()).collect()
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

/// Where the indicator values sit inside the spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetLayout {
    pub path: PathBuf,
    pub sheet: String,
    /// Rows above the header row.
    pub skip_rows: usize,
    /// Data-row indices (0 = first row under the header) holding footnotes.
    pub drop_rows: Vec<usize>,
    pub label_column: String,
    /// `None` keeps every header that looks like a four-digit year.
    pub years: Option<YearRange>,
}

impl Default for SpreadsheetLayout {
    fn default() -> Self {
        let mut drop_rows = vec![0, 1, 10];
        drop_rows.extend(32..39);
        Self {
            path: PathBuf::from("page_spreadsheet.xlsx"),
            sheet: "Sheet 1".into(),
            skip_rows: 8,
            drop_rows,
            label_column: "TIME".into(),
            years: Some(YearRange {
                first: 2010,
                last: 2023,
            }),
        }
    }
}

impl SpreadsheetLayout {
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.label_column.trim().is_empty() {
            return Err(LayoutError::InvalidSetting(
                "spreadsheet.label_column is empty".into(),
            ));
        }
        if let Some(r) = self.years {
            if r.first > r.last {
                return Err(LayoutError::EmptyYearRange {
                    first: r.first,
                    last: r.last,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Number of leading percentage-change columns in the pre-pandemic window.
    pub pre_window: usize,
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pre_window: 10,
            top_n: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub output_dir: PathBuf,
    pub single_year: i32,
    pub compare_years: [i32; 2],
    /// Horizontal guide drawn on the time-series chart (index base year = 100).
    pub reference_line: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("charts"),
            single_year: 2020,
            compare_years: [2019, 2022],
            reference_line: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub enabled: bool,
    pub page_url: String,
    /// `None` downloads the first image found on the page instead.
    pub image_url: Option<String>,
    pub image_path: PathBuf,
    pub print_html: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            page_url: DEFAULT_PAGE_URL.into(),
            image_url: Some(DEFAULT_IMAGE_URL.into()),
            image_path: PathBuf::from("house_prices_rents_change.jpg"),
            print_html: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub spreadsheet: SpreadsheetLayout,
    pub analysis: AnalysisConfig,
    pub charts: ChartConfig,
    pub scrape: ScrapeConfig,
}

impl PipelineConfig {
    /// Read a YAML config from `path`, or fall back to the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let cfg = match path {
            Some(p) => {
                info!(path = %p.display(), "loading config");
                let text =
                    fs::read_to_string(p).with_context(|| format!("reading config {:?}", p))?;
                Self::from_yaml(&text).with_context(|| format!("parsing config {:?}", p))?
            }
            None => {
                debug!("no config file given; using defaults");
                Self::default()
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        self.spreadsheet.validate()?;

        if self.analysis.pre_window == 0 {
            return Err(LayoutError::InvalidSetting(
                "analysis.pre_window must be at least 1".into(),
            ));
        }
        if self.analysis.top_n == 0 {
            return Err(LayoutError::InvalidSetting(
                "analysis.top_n must be at least 1".into(),
            ));
        }

        // chart years must exist among the kept columns
        if let Some(r) = self.spreadsheet.years {
            let needed = r.columns().len();
            if needed < self.analysis.pre_window {
                return Err(LayoutError::TooFewColumns {
                    needed: self.analysis.pre_window,
                    found: needed,
                });
            }
            let chart_years = std::iter::once(self.charts.single_year)
                .chain(self.charts.compare_years.iter().copied());
            for year in chart_years {
                if !r.contains(year) {
                    return Err(LayoutError::YearOutsideRange {
                        year,
                        first: r.first,
                        last: r.last,
                    });
                }
            }
        }

        if self.scrape.enabled && self.scrape.page_url.trim().is_empty() {
            return Err(LayoutError::InvalidSetting("scrape.page_url is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_eurostat_sheet() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.spreadsheet.skip_rows, 8);
        assert_eq!(
            cfg.spreadsheet.drop_rows,
            vec![0, 1, 10, 32, 33, 34, 35, 36, 37, 38]
        );
        assert_eq!(cfg.spreadsheet.years.unwrap().columns().len(), 14);
        assert_eq!(cfg.analysis.pre_window, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() -> Result<()> {
        let yaml = r#"
spreadsheet:
  path: data/hpi.csv
  years:
    first: 2012
    last: 2023
charts:
  single_year: 2021
scrape:
  enabled: false
"#;
        let cfg = PipelineConfig::from_yaml(yaml)?;
        assert_eq!(cfg.spreadsheet.path, PathBuf::from("data/hpi.csv"));
        assert_eq!(cfg.spreadsheet.sheet, "Sheet 1");
        assert_eq!(cfg.spreadsheet.label_column, "TIME");
        assert_eq!(cfg.charts.single_year, 2021);
        assert_eq!(cfg.charts.compare_years, [2019, 2022]);
        assert!(!cfg.scrape.enabled);
        assert!(cfg.validate().is_ok());
        Ok(())
    }

    #[test]
    fn chart_year_outside_range_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.charts.single_year = 2030;
        assert_eq!(
            cfg.validate(),
            Err(LayoutError::YearOutsideRange {
                year: 2030,
                first: 2010,
                last: 2023
            })
        );
    }

    #[test]
    fn short_year_range_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.spreadsheet.years = Some(YearRange {
            first: 2015,
            last: 2023,
        });
        cfg.charts.compare_years = [2019, 2022];
        assert_eq!(
            cfg.validate(),
            Err(LayoutError::TooFewColumns {
                needed: 10,
                found: 9
            })
        );
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.spreadsheet.years = Some(YearRange {
            first: 2023,
            last: 2010,
        });
        assert!(matches!(
            cfg.validate(),
            Err(LayoutError::EmptyYearRange { .. })
        ));
    }
}
