use std::fmt;
use rusqlite::types::ValueRef;

pub const NO_RESULTS: &str = "No results found.";

/// A single result cell, decoded from whatever SQLite handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(v) => Cell::Integer(v),
            ValueRef::Real(v) => Cell::Real(v),
            ValueRef::Text(text) => Cell::Text(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Cell::Blob(bytes.to_vec()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "NULL"),
            Cell::Integer(v) => write!(f, "{}", v),
            Cell::Real(v) => write!(f, "{:.4}", v),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

// Long free-text columns (descriptions, dimensions) get cut to this width.
const MAX_CELL_WIDTH: usize = 48;

fn clip(s: &str) -> String {
    let single_line = s.replace(['\r', '\n'], " ");
    if single_line.chars().count() <= MAX_CELL_WIDTH {
        single_line
    } else {
        let mut out: String = single_line.chars().take(MAX_CELL_WIDTH - 1).collect();
        out.push('…');
        out
    }
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Plain-text grid; empty tables render as [`NO_RESULTS`].
    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_RESULTS.to_string();
        }

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| clip(&c.to_string())).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                if i >= widths.len() {
                    widths.push(0);
                }
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let fmt_row = |cells: &[String]| -> String {
            widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    format!("{:<width$}", cell, width = *w)
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let header = fmt_row(&self.columns);
        let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-");

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');
        out.push_str(&rule);
        for row in &body {
            out.push('\n');
            out.push_str(&fmt_row(row));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_renders_no_results() {
        let table = Table::new(vec!["Culture".to_string()], Vec::new());
        assert_eq!(table.render(), NO_RESULTS);
    }

    #[test]
    fn test_render_aligns_columns() {
        let table = Table::new(
            vec!["Hue".to_string(), "AvgPercent".to_string()],
            vec![
                vec![Cell::Text("Grey".to_string()), Cell::Real(0.5)],
                vec![Cell::Null, Cell::Integer(3)],
            ],
        );
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Hue  | AvgPercent");
        assert_eq!(lines[1], "-----+-----------");
        assert_eq!(lines[2], "Grey | 0.5000");
        assert_eq!(lines[3], "NULL | 3");
    }

    #[test]
    fn test_long_text_is_clipped() {
        let long = "x".repeat(100);
        let table = Table::new(vec!["Description".to_string()], vec![vec![Cell::Text(long)]]);
        let rendered = table.render();
        let last = rendered.lines().last().unwrap();
        assert_eq!(last.chars().count(), MAX_CELL_WIDTH);
        assert!(last.ends_with('…'));
    }

    #[test]
    fn test_head_keeps_columns() {
        let rows = (0..10).map(|i| vec![Cell::Integer(i)]).collect();
        let table = Table::new(vec!["ObjectID".to_string()], rows);
        let head = table.head(5);
        assert_eq!(head.rows.len(), 5);
        assert_eq!(head.columns, table.columns);
    }
}
