use crate::analyze::change::{row_max, DIFFERENCE_COLUMN};
use crate::analyze::countries;
use anyhow::{Context, Result};
use arrow::{
    array::{Array, Float64Array},
    record_batch::RecordBatch,
};

/// One country with the value it was ranked by.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub country: String,
    pub value: f64,
}

/// Stable descending selection of at most `n` rows. Ties keep input order.
fn n_largest(mut rows: Vec<Ranked>, n: usize) -> Vec<Ranked> {
    rows.sort_by(|a, b| b.value.total_cmp(&a.value));
    rows.truncate(n);
    rows
}

fn ranked_rows<'a>(
    names: &'a arrow::array::StringArray,
    values: &'a Float64Array,
) -> impl Iterator<Item = Ranked> + 'a {
    (0..values.len()).filter_map(move |i| {
        if values.is_null(i) || names.is_null(i) || !values.value(i).is_finite() {
            return None;
        }
        Some(Ranked {
            country: names.value(i).to_string(),
            value: values.value(i),
        })
    })
}

/// Countries whose average change rose after the split, largest rise first.
pub fn top_by_difference(comparison: &RecordBatch, n: usize) -> Result<Vec<Ranked>> {
    let names = countries(comparison)?;
    let diff = comparison
        .column_by_name(DIFFERENCE_COLUMN)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .with_context(|| format!("comparison table has no {} column", DIFFERENCE_COLUMN))?;

    let rows = ranked_rows(names, diff).filter(|r| r.value > 0.0).collect();
    Ok(n_largest(rows, n))
}

/// Countries by their single largest year-over-year increase.
pub fn top_by_max_increase(profitability: &RecordBatch, n: usize) -> Result<Vec<Ranked>> {
    let names = countries(profitability)?;
    let maxes = row_max(profitability)?;
    let rows = ranked_rows(names, &maxes).collect();
    Ok(n_largest(rows, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::change::{compare, pct_change};
    use crate::load::convert::coerce_numeric;
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;
    use crate::analyze::tests::table;

    #[test]
    fn difference_ranking_is_positive_sorted_and_capped() -> Result<()> {
        // pre window = first two columns (null, 0.0), so difference = last value
        let rows: Vec<(String, Vec<Option<f64>>)> = (0..15)
            .map(|i| {
                let diff = i as f64 - 3.0; // -3..=11
                (format!("C{i}"), vec![None, Some(0.0), Some(diff)])
            })
            .collect();
        let borrowed: Vec<(&str, Vec<Option<f64>>)> =
            rows.iter().map(|(n, v)| (n.as_str(), v.clone())).collect();
        let comparison = compare(&table(&borrowed), 2)?;

        let top = top_by_difference(&comparison, 10)?;
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].country, "C14");
        assert_eq!(top[0].value, 11.0);
        assert!(top.windows(2).all(|w| w[0].value > w[1].value));
        assert!(top.iter().all(|r| r.value > 0.0));
        Ok(())
    }

    #[test]
    fn difference_ranking_excludes_non_positive_and_missing() -> Result<()> {
        let comparison = compare(
            &table(&[
                ("up", vec![None, Some(1.0), Some(4.0)]),
                ("flat", vec![None, Some(2.0), Some(2.0)]),
                ("down", vec![None, Some(5.0), Some(1.0)]),
                ("empty", vec![None, None, None]),
            ]),
            2,
        )?;
        let top = top_by_difference(&comparison, 10)?;
        assert_eq!(
            top,
            vec![Ranked {
                country: "up".into(),
                value: 3.0
            }]
        );
        Ok(())
    }

    #[test]
    fn max_increase_ranking() -> Result<()> {
        let p = table(&[
            ("A", vec![None, Some(3.0), Some(-1.0)]),
            ("B", vec![None, Some(12.5), Some(2.0)]),
            ("C", vec![None, None, None]),
            ("D", vec![None, Some(-4.0), Some(-2.0)]),
        ]);
        let top = top_by_max_increase(&p, 2)?;
        let names: Vec<&str> = top.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(top[0].value, 12.5);

        let all = top_by_max_increase(&p, 10)?;
        assert_eq!(all.len(), 3, "all-null rows are not ranked");
        assert_eq!(all[2].value, -2.0);
        Ok(())
    }

    #[test]
    fn infinite_cells_never_reach_the_ranking() -> Result<()> {
        let cols = ["Country", "2010", "2011"];
        let schema = Arc::new(Schema::new(
            cols.iter()
                .map(|c| Field::new(*c, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["A", "N", "B"])) as ArrayRef,
                Arc::new(StringArray::from(vec!["100", "inf", "100"])),
                Arc::new(StringArray::from(vec!["105", "inf", "110"])),
            ],
        )?;
        let cleaned = coerce_numeric(&batch, "Country")?;

        let top = top_by_max_increase(&pct_change(&cleaned)?, 10)?;
        let names: Vec<&str> = top.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
        Ok(())
    }

    #[test]
    fn non_finite_values_are_skipped_when_ranking() -> Result<()> {
        let p = table(&[
            ("A", vec![None, Some(5.0)]),
            ("N", vec![None, Some(f64::NAN)]),
            ("I", vec![None, Some(f64::INFINITY)]),
            ("B", vec![None, Some(10.0)]),
        ]);
        let top = top_by_max_increase(&p, 10)?;
        assert_eq!(
            top,
            vec![
                Ranked { country: "B".into(), value: 10.0 },
                Ranked { country: "A".into(), value: 5.0 },
            ]
        );
        Ok(())
    }
}
