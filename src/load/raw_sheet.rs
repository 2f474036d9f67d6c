#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Column names, from the first row after the skipped preamble.
    pub headers: Vec<String>,
    /// Each data row below the header, padded to the header width.
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// Build from header + rows, padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                if r.len() < width {
                    r.resize(width, String::new());
                }
                r
            })
            .collect();
        Self { headers, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}
