use crate::analyze::{countries, value_columns};
use crate::config::{LayoutError, COUNTRY_COLUMN};
use anyhow::Result;
use arrow::{
    array::{Array, ArrayRef, Float64Array, Float64Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;

pub const AVG_PRE_COLUMN: &str = "Avg Pre-Pandemic (%)";
pub const AVG_POST_COLUMN: &str = "Avg Post-Pandemic (%)";
pub const DIFFERENCE_COLUMN: &str = "Difference";

fn value_at(arr: &Float64Array, row: usize) -> Option<f64> {
    if arr.is_null(row) {
        None
    } else {
        Some(arr.value(row))
    }
}

/// Year-over-year change in percent along each row:
/// `(v[t] - v[t-1]) / v[t-1] * 100`, null when either side is missing or `v[t-1]` is zero.
/// The first value column has no predecessor and is all null.
pub fn pct_change(table: &RecordBatch) -> Result<RecordBatch> {
    let cols = value_columns(table)?;
    let rows = table.num_rows();

    let mut out: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());
    out.push(table.column(0).clone());

    for (t, (_, cur)) in cols.iter().enumerate() {
        let mut b = Float64Builder::with_capacity(rows);
        match t.checked_sub(1).map(|p| cols[p].1) {
            None => b.append_nulls(rows),
            Some(prev) => {
                for r in 0..rows {
                    let change = match (value_at(prev, r), value_at(cur, r)) {
                        (Some(p), Some(c)) if p != 0.0 => Some((c - p) / p * 100.0),
                        _ => None,
                    };
                    b.append_option(change);
                }
            }
        }
        out.push(Arc::new(b.finish()) as ArrayRef);
    }

    RecordBatch::try_new(table.schema(), out).map_err(Into::into)
}

/// Split the value columns into the first `pre_len` (pre window) and the rest (post window).
/// Both halves keep the `Country` column in front.
pub fn split_windows(table: &RecordBatch, pre_len: usize) -> Result<(RecordBatch, RecordBatch)> {
    let found = table.num_columns().saturating_sub(1);
    if found < pre_len {
        return Err(LayoutError::TooFewColumns {
            needed: pre_len,
            found,
        }
        .into());
    }

    let pre: Vec<usize> = (0..=pre_len).collect();
    let post: Vec<usize> = std::iter::once(0)
        .chain(pre_len + 1..table.num_columns())
        .collect();
    Ok((table.project(&pre)?, table.project(&post)?))
}

/// Mean of each row's non-null values; null for rows with nothing to average.
pub fn row_means(table: &RecordBatch) -> Result<Float64Array> {
    let cols = value_columns(table)?;
    let means = (0..table.num_rows())
        .map(|r| {
            let (sum, n) = cols
                .iter()
                .filter_map(|(_, c)| value_at(c, r))
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            (n > 0).then(|| sum / n as f64)
        })
        .collect();
    Ok(means)
}

/// Largest non-null value per row.
pub fn row_max(table: &RecordBatch) -> Result<Float64Array> {
    let cols = value_columns(table)?;
    let maxes = (0..table.num_rows())
        .map(|r| {
            cols.iter()
                .filter_map(|(_, c)| value_at(c, r))
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        })
        .collect();
    Ok(maxes)
}

/// Per-country average change before and after the split, and `post - pre`.
pub fn compare(profitability: &RecordBatch, pre_len: usize) -> Result<RecordBatch> {
    let (pre, post) = split_windows(profitability, pre_len)?;
    let pre_avg = row_means(&pre)?;
    let post_avg = row_means(&post)?;
    let difference: Float64Array = pre_avg
        .iter()
        .zip(post_avg.iter())
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(b - a),
            _ => None,
        })
        .collect();

    let names: StringArray = countries(profitability)?.iter().collect();
    let schema = Schema::new(vec![
        Field::new(COUNTRY_COLUMN, DataType::Utf8, true),
        Field::new(AVG_PRE_COLUMN, DataType::Float64, true),
        Field::new(AVG_POST_COLUMN, DataType::Float64, true),
        Field::new(DIFFERENCE_COLUMN, DataType::Float64, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(names),
            Arc::new(pre_avg),
            Arc::new(post_avg),
            Arc::new(difference),
        ],
    )
    .map_err(Into::into)
}
