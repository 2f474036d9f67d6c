// src/analyze/mod.rs
use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Float64Array, StringArray},
    record_batch::RecordBatch,
};
use tracing::{debug, info, instrument};

use crate::config::{AnalysisConfig, COUNTRY_COLUMN};

pub mod change;
pub mod rank;

pub use change::{compare, pct_change, row_max, row_means, split_windows};
pub use rank::{top_by_difference, top_by_max_increase, Ranked};

/// The `Country` column of a cleaned or derived table.
pub fn countries(table: &RecordBatch) -> Result<&StringArray> {
    table
        .column_by_name(COUNTRY_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .with_context(|| format!("table has no {} text column", COUNTRY_COLUMN))
}

/// Every column after `Country`, as `(name, values)`.
pub fn value_columns(table: &RecordBatch) -> Result<Vec<(&str, &Float64Array)>> {
    let schema = table.schema_ref();
    if schema.fields().first().map(|f| f.name().as_str()) != Some(COUNTRY_COLUMN) {
        return Err(anyhow!("first column must be {}", COUNTRY_COLUMN));
    }
    schema
        .fields()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, f)| {
            table
                .column(i)
                .as_any()
                .downcast_ref::<Float64Array>()
                .map(|a| (f.name().as_str(), a))
                .with_context(|| format!("column {} is not Float64", f.name()))
        })
        .collect()
}

/// Everything computed from the cleaned table in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub cleaned: RecordBatch,
    pub profitability: RecordBatch,
    pub comparison: RecordBatch,
    pub top_difference: Vec<Ranked>,
    pub top_max_increase: Vec<Ranked>,
}

#[instrument(level = "info", skip_all, fields(countries = cleaned.num_rows()))]
pub fn analyze(cleaned: RecordBatch, cfg: &AnalysisConfig) -> Result<Analysis> {
    let profitability = pct_change(&cleaned)?;
    let comparison = compare(&profitability, cfg.pre_window)?;
    debug!(pre_window = cfg.pre_window, "built comparison table");

    let top_difference = top_by_difference(&comparison, cfg.top_n)?;
    let top_max_increase = top_by_max_increase(&profitability, cfg.top_n)?;
    info!(
        rising = top_difference.len(),
        ranked = top_max_increase.len(),
        "analysis done"
    );

    Ok(Analysis {
        cleaned,
        profitability,
        comparison,
        top_difference,
        top_max_increase,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow::{
        array::ArrayRef,
        csv::WriterBuilder,
        datatypes::{DataType, Field, Schema},
    };
    use std::sync::Arc;

    /// Test table: `Country` plus one Float64 column per value, named 2000, 2001, ...
    pub fn table(rows: &[(&str, Vec<Option<f64>>)]) -> RecordBatch {
        let width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut fields = vec![Field::new(COUNTRY_COLUMN, DataType::Utf8, true)];
        let mut cols: Vec<ArrayRef> = vec![Arc::new(
            rows.iter().map(|(n, _)| Some(*n)).collect::<StringArray>(),
        )];
        for c in 0..width {
            fields.push(Field::new((2000 + c).to_string(), DataType::Float64, true));
            let vals: Float64Array = rows
                .iter()
                .map(|(_, v)| v.get(c).copied().flatten())
                .collect();
            cols.push(Arc::new(vals));
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), cols).expect("valid test table")
    }

    fn to_csv(batch: &RecordBatch) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut w = WriterBuilder::new().with_header(true).build(&mut buf);
            w.write(batch).expect("csv write");
        }
        buf
    }

    fn hpi_fixture() -> RecordBatch {
        let series = |base: f64, step: f64| -> Vec<Option<f64>> {
            (0..14).map(|i| Some(base + step * (i as f64).powf(1.3))).collect()
        };
        let mut gappy = series(95.0, 2.0);
        gappy[4] = None;
        table(&[
            ("Estonia", series(80.0, 6.0)),
            ("Finland", series(100.0, 0.4)),
            ("Italy", series(110.0, -1.0)),
            ("Portugal", gappy),
            ("Missing", vec![None; 14]),
        ])
    }

    #[test]
    fn analysis_is_deterministic() -> Result<()> {
        let cfg = AnalysisConfig::default();
        let first = analyze(hpi_fixture(), &cfg)?;
        let second = analyze(hpi_fixture(), &cfg)?;

        assert_eq!(to_csv(&first.profitability), to_csv(&second.profitability));
        assert_eq!(to_csv(&first.comparison), to_csv(&second.comparison));
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn analysis_shapes() -> Result<()> {
        let a = analyze(hpi_fixture(), &AnalysisConfig::default())?;
        assert_eq!(a.profitability.num_columns(), 15);
        assert_eq!(a.comparison.num_rows(), 5);
        assert!(a.top_difference.len() <= 10);
        assert!(a.top_difference.iter().all(|r| r.country != "Missing"));
        assert_eq!(a.top_max_increase[0].country, "Estonia");
        Ok(())
    }

    #[test]
    fn value_columns_rejects_missing_label() {
        let t = table(&[("A", vec![Some(1.0)])]);
        let projected = t.project(&[1]).expect("projection");
        assert!(value_columns(&projected).is_err());
    }
}
