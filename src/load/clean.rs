use crate::config::{LayoutError, SpreadsheetLayout, COUNTRY_COLUMN};
use crate::load::{convert, utils, RawSheet};
use anyhow::Result;
use arrow::{
    array::{ArrayRef, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, instrument};

/// Header positions of the year columns to keep, in output order.
fn select_year_columns(
    raw: &RawSheet,
    layout: &SpreadsheetLayout,
) -> Result<Vec<(String, usize)>, LayoutError> {
    match layout.years {
        Some(range) => range
            .columns()
            .into_iter()
            .map(|name| match raw.column_index(&name) {
                Some(idx) => Ok((name, idx)),
                None => Err(LayoutError::MissingColumn { column: name }),
            })
            .collect(),
        None => {
            let found: Vec<(String, usize)> = raw
                .headers
                .iter()
                .enumerate()
                .filter_map(|(i, h)| utils::header_year(h).map(|y| (y.to_string(), i)))
                .collect();
            if found.is_empty() {
                Err(LayoutError::NoYearColumns)
            } else {
                Ok(found)
            }
        }
    }
}

/// Apply `layout` to a raw sheet:
/// - drops unnamed columns and every named column that is neither the label nor a year,
/// - drops the footnote rows listed in `layout.drop_rows`,
/// - renames the label column to `Country`,
/// - coerces year cells to `Float64` (unparseable → null).
///
/// Layout mismatches are errors, never silent mis-drops.
#[instrument(level = "debug", skip_all, fields(rows = raw.rows.len(), cols = raw.headers.len()))]
pub fn clean(raw: &RawSheet, layout: &SpreadsheetLayout) -> Result<RecordBatch> {
    let label_idx =
        raw.column_index(&layout.label_column)
            .ok_or_else(|| LayoutError::MissingColumn {
                column: layout.label_column.clone(),
            })?;
    let years = select_year_columns(raw, layout)?;

    let unnamed = raw.headers.iter().filter(|h| utils::is_unnamed(h)).count();
    debug!(
        unnamed,
        years = years.len(),
        "selected label + year columns"
    );

    let drop: BTreeSet<usize> = layout.drop_rows.iter().copied().collect();
    if let Some(&index) = drop.iter().find(|&&i| i >= raw.rows.len()) {
        return Err(LayoutError::RowOutOfRange {
            index,
            rows: raw.rows.len(),
        }
        .into());
    }
    let kept: Vec<&Vec<String>> = raw
        .rows
        .iter()
        .enumerate()
        .filter(|(i, _)| !drop.contains(i))
        .map(|(_, r)| r)
        .collect();
    debug!(dropped = drop.len(), kept = kept.len(), "dropped footnote rows");

    let mut fields = Vec::with_capacity(years.len() + 1);
    let mut columns = Vec::with_capacity(years.len() + 1);

    fields.push(Field::new(COUNTRY_COLUMN, DataType::Utf8, true));
    let labels: StringArray = kept
        .iter()
        .map(|r| Some(utils::clean_str(&r[label_idx])))
        .collect();
    columns.push(Arc::new(labels) as ArrayRef);

    for (name, idx) in &years {
        fields.push(Field::new(name, DataType::Utf8, true));
        let cells: StringArray = kept.iter().map(|r| Some(r[*idx].as_str())).collect();
        columns.push(Arc::new(cells) as ArrayRef);
    }

    let text = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    convert::coerce_numeric(&text, COUNTRY_COLUMN)
}
