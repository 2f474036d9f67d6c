//! Chart inputs derived from the analysis tables.
//!
//! Kept apart from rendering so the shapes can be checked without a font stack.

use anyhow::{Context, Result};
use arrow::{
    array::{Array, Float64Array},
    record_batch::RecordBatch,
};

use crate::analyze::{countries, value_columns, Ranked};

/// One labelled bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// One category with a value per series (missing values draw no bar).
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

/// A country's value over time.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(i32, f64)>,
}

fn year_column<'a>(table: &'a RecordBatch, year: i32) -> Result<&'a Float64Array> {
    let name = year.to_string();
    table
        .column_by_name(&name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .with_context(|| format!("table has no numeric {} column", name))
}

pub fn ranked_bars(ranked: &[Ranked]) -> Vec<Bar> {
    ranked
        .iter()
        .map(|r| Bar {
            label: r.country.clone(),
            value: r.value,
        })
        .collect()
}

/// Every country with a value in `year`; countries missing that year are left out.
pub fn single_year_bars(cleaned: &RecordBatch, year: i32) -> Result<Vec<Bar>> {
    let names = countries(cleaned)?;
    let values = year_column(cleaned, year)?;
    Ok((0..cleaned.num_rows())
        .filter(|&i| !values.is_null(i))
        .map(|i| Bar {
            label: names.value(i).to_string(),
            value: values.value(i),
        })
        .collect())
}

/// Values for each country across `years`, one entry per year in the given order.
pub fn year_groups(cleaned: &RecordBatch, years: &[i32]) -> Result<Vec<Group>> {
    let names = countries(cleaned)?;
    let cols = years
        .iter()
        .map(|&y| year_column(cleaned, y))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..cleaned.num_rows())
        .map(|i| Group {
            label: names.value(i).to_string(),
            values: cols
                .iter()
                .map(|c| (!c.is_null(i)).then(|| c.value(i)))
                .collect(),
        })
        .collect())
}

/// Full time series per country, skipping missing or non-finite years. Non-year columns are ignored.
pub fn country_series(cleaned: &RecordBatch) -> Result<Vec<Series>> {
    let names = countries(cleaned)?;
    let cols: Vec<(i32, &Float64Array)> = value_columns(cleaned)?
        .into_iter()
        .filter_map(|(name, arr)| name.parse::<i32>().ok().map(|y| (y, arr)))
        .collect();

    Ok((0..cleaned.num_rows())
        .map(|i| Series {
            label: names.value(i).to_string(),
            points: cols
                .iter()
                .filter(|(_, c)| !c.is_null(i) && c.value(i).is_finite())
                .map(|(y, c)| (*y, c.value(i)))
                .collect(),
        })
        .collect())
}

/// First and last year plotted across all series.
pub fn year_span(series: &[Series]) -> Option<(i32, i32)> {
    series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(x, _)| x))
        .fold(None, |acc: Option<(i32, i32)>, x| {
            Some(acc.map_or((x, x), |(lo, hi)| (lo.min(x), hi.max(x))))
        })
}

/// Axis range covering every value and zero, padded by 5%.
pub fn value_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(1e-9);
    if hi == lo {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo - if lo < 0.0 { pad } else { 0.0 }, hi + pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::tests::table;

    #[test]
    fn series_skip_non_finite_and_report_span() -> Result<()> {
        let t = table(&[
            ("A", vec![None, Some(101.0), Some(f64::INFINITY)]),
            ("B", vec![Some(99.0), Some(f64::NAN), Some(103.0)]),
        ]);
        let series = country_series(&t)?;
        assert_eq!(series[0].points, vec![(2001, 101.0)]);
        assert_eq!(series[1].points, vec![(2000, 99.0), (2002, 103.0)]);
        assert_eq!(year_span(&series), Some((2000, 2002)));
        assert_eq!(year_span(&[]), None);
        Ok(())
    }

    #[test]
    fn single_year_skips_missing() -> Result<()> {
        let t = table(&[
            ("A", vec![Some(100.0), Some(104.0)]),
            ("B", vec![Some(100.0), None]),
        ]);
        let bars = single_year_bars(&t, 2001)?;
        assert_eq!(
            bars,
            vec![Bar {
                label: "A".into(),
                value: 104.0
            }]
        );
        assert!(single_year_bars(&t, 2030).is_err());
        Ok(())
    }

    #[test]
    fn groups_keep_year_order_and_gaps() -> Result<()> {
        let t = table(&[("A", vec![Some(1.0), None, Some(3.0)])]);
        let groups = year_groups(&t, &[2002, 2001])?;
        assert_eq!(groups[0].values, vec![Some(3.0), None]);
        Ok(())
    }

    #[test]
    fn series_use_year_axis() -> Result<()> {
        let t = table(&[("A", vec![Some(100.0), None, Some(108.0)])]);
        let s = country_series(&t)?;
        assert_eq!(s[0].points, vec![(2000, 100.0), (2002, 108.0)]);
        Ok(())
    }

    #[test]
    fn ranges_include_zero() {
        let (lo, hi) = value_range([4.0, 10.0]);
        assert_eq!(lo, 0.0);
        assert!(hi > 10.0);

        let (lo, hi) = value_range([-5.0, 5.0]);
        assert!(lo < -5.0 && hi > 5.0);

        assert_eq!(value_range(std::iter::empty()), (-1.0, 1.0));
    }
}
