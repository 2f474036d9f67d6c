// src/load/mod.rs
use anyhow::{anyhow, Context, Result};
use arrow::record_batch::RecordBatch;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::config::SpreadsheetLayout;

pub mod clean;
pub mod convert;
pub mod raw_sheet;
pub mod utils;

pub use clean::clean;
pub use raw_sheet::RawSheet;

/// Split a full cell grid into header + data rows after `skip_rows` preamble rows.
fn from_grid(mut grid: Vec<Vec<String>>, skip_rows: usize) -> Result<RawSheet> {
    if grid.len() <= skip_rows {
        return Err(anyhow!(
            "sheet has {} rows; expected a header after skipping {}",
            grid.len(),
            skip_rows
        ));
    }
    let mut rest = grid.split_off(skip_rows);
    let rows = rest.split_off(1);
    let headers = rest.pop().unwrap_or_default();
    Ok(RawSheet::new(headers, rows))
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => utils::format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Read every row of `sheet` from a workbook, keeping the sheet's absolute row/column positions.
fn read_workbook_grid(path: &Path, sheet: &str) -> Result<Vec<Vec<String>>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| anyhow!("opening workbook {:?}: {}", path, e))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| anyhow!("reading sheet {:?} from {:?}: {}", sheet, path, e))?;

    // calamine ranges start at the first used cell; pad back to A1
    let (row0, col0) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); row0];
    for row in range.rows() {
        let mut cells = vec![String::new(); col0];
        cells.extend(row.iter().map(cell_to_string));
        grid.push(cells);
    }
    Ok(grid)
}

fn read_csv_grid(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // preamble rows are shorter than the table
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    let mut grid = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
        grid.push(record.iter().map(|s| s.to_string()).collect());
    }
    Ok(grid)
}

/// Load one sheet as raw strings.
///
/// Workbooks (`xlsx`, `xlsm`, `xlsb`, `xls`, `ods`) go through calamine; `csv` files are read
/// directly and `sheet` is ignored. The first `skip_rows` rows are discarded and the next row
/// becomes the header.
#[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_sheet<P: AsRef<Path>>(path: P, sheet: &str, skip_rows: usize) -> Result<RawSheet> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "csv" => read_csv_grid(path)?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_grid(path, sheet)?,
        other => return Err(anyhow!("unsupported spreadsheet extension {:?}", other)),
    };
    debug!(rows = grid.len(), "read sheet grid");

    from_grid(grid, skip_rows)
}

/// Read and clean the spreadsheet described by `layout`.
pub fn load_cleaned(layout: &SpreadsheetLayout) -> Result<RecordBatch> {
    let raw = read_sheet(&layout.path, &layout.sheet, layout.skip_rows)?;
    let batch = clean(&raw, layout)
        .with_context(|| format!("cleaning {:?}", layout.path))?;
    info!(
        countries = batch.num_rows(),
        years = batch.num_columns() - 1,
        "loaded cleaned table"
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearRange;
    use arrow::array::Array;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn from_grid_skips_preamble() -> Result<()> {
        let grid = vec![
            vec!["Dataset".to_string()],
            vec![],
            vec!["TIME".to_string(), "2010".to_string()],
            vec!["Spain".to_string()],
        ];
        let raw = from_grid(grid, 2)?;
        assert_eq!(raw.headers, vec!["TIME", "2010"]);
        assert_eq!(raw.rows, vec![vec!["Spain".to_string(), String::new()]]);
        Ok(())
    }

    #[test]
    fn from_grid_without_header_errors() {
        let grid = vec![vec!["only".to_string()]];
        assert!(from_grid(grid, 1).is_err());
    }

    #[test]
    fn load_cleaned_from_csv() -> Result<()> {
        let content = "\
House price index - annual data,,,,
Source: Eurostat,,,,
TIME,,2010,2011,2012
GEO (Labels),,,,
Denmark,,100,98.5,95.1
Portugal,,100,\":\",94.0
";
        let mut tmp = Builder::new().suffix(".csv").tempfile()?;
        tmp.write_all(content.as_bytes())?;

        let layout = SpreadsheetLayout {
            path: tmp.path().to_path_buf(),
            skip_rows: 2,
            drop_rows: vec![0],
            years: Some(YearRange {
                first: 2010,
                last: 2012,
            }),
            ..SpreadsheetLayout::default()
        };
        let batch = load_cleaned(&layout)?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);
        assert_eq!(batch.column(2).null_count(), 1);
        Ok(())
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(read_sheet("hpi.txt", "Sheet 1", 0).is_err());
    }
}
