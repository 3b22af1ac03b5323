//! Positional table model shared by every pipeline stage

use std::collections::HashSet;

/// A single cell value. Blank cells are `Empty`; text that trims to
/// nothing is also treated as blank by the predicates below.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    /// True when the cell holds no usable value.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Text is parsed after trimming;
    /// booleans count as 0/1. Non-convertible cells yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Empty => None,
        }
    }

    /// Text view of the cell. Whole numbers render without a decimal
    /// part so identifiers read back from numeric columns stay stable.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => format!("{}", b),
        }
    }

    /// Trimmed text view, `None` when blank. Used for grouping and
    /// deduplication keys.
    pub fn normalized(&self) -> Option<String> {
        let s = self.display();
        let t = s.trim();
        if t.is_empty() { None } else { Some(t.to_string()) }
    }
}

/// An in-memory two-dimensional table addressed purely by position.
/// Whether row 0 is a header is the caller's business; the table never
/// tracks it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Cell at (row, col); out-of-range positions read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Set (row, col), growing the table with blanks as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        while self.rows.len() <= row {
            self.rows.push(Vec::new());
        }
        let r = &mut self.rows[row];
        while r.len() <= col {
            r.push(Cell::Empty);
        }
        r[col] = value;
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Split off the first row as a header. An empty table yields an
    /// empty header and no data rows.
    pub fn split_header(mut self) -> (Vec<Cell>, Table) {
        if self.rows.is_empty() {
            (Vec::new(), self)
        } else {
            let header = self.rows.remove(0);
            (header, self)
        }
    }

    /// Column-wise arithmetic mean over every row of this table.
    /// Cells that do not convert are excluded (not treated as zero);
    /// a column with no convertible value yields a blank cell.
    pub fn average_row(&self) -> Vec<Cell> {
        let width = self.column_count();
        let mut avg = Vec::with_capacity(width);
        for col in 0..width {
            let values: Vec<f64> = self
                .rows
                .iter()
                .filter_map(|r| r.get(col).and_then(Cell::as_number))
                .collect();
            if values.is_empty() {
                avg.push(Cell::Empty);
            } else {
                avg.push(Cell::Number(values.iter().sum::<f64>() / values.len() as f64));
            }
        }
        avg
    }

    /// Remove rows whose normalized key in `col` was already seen,
    /// keeping the first occurrence in source order. Blank keys are
    /// deduplicated against each other as well. Returns the number of
    /// rows removed.
    pub fn dedup_by_column(&mut self, col: usize) -> usize {
        let before = self.rows.len();
        let mut seen: HashSet<Option<String>> = HashSet::new();
        self.rows
            .retain(|row| seen.insert(row.get(col).unwrap_or(&Cell::Empty).normalized()));
        before - self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_average_excludes_non_numeric() {
        let table = Table::from_rows(vec![
            vec![Cell::Number(2.0)],
            vec![Cell::Number(4.0)],
            vec![text("abc")],
            vec![Cell::Number(6.0)],
        ]);
        assert_eq!(table.average_row(), vec![Cell::Number(4.0)]);
    }

    #[test]
    fn test_average_all_non_numeric_is_blank() {
        let table = Table::from_rows(vec![vec![text("x")], vec![text("y")]]);
        assert_eq!(table.average_row(), vec![Cell::Empty]);
    }

    #[test]
    fn test_average_parses_numeric_text() {
        let table = Table::from_rows(vec![vec![text(" 3.0 ")], vec![Cell::Number(5.0)]]);
        assert_eq!(table.average_row(), vec![Cell::Number(4.0)]);
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let mut table = Table::from_rows(vec![
            vec![text("X"), text("a")],
            vec![text("X"), text("b")],
            vec![text("Y"), text("c")],
        ]);
        let removed = table.dedup_by_column(0);
        assert_eq!(removed, 1);
        assert_eq!(
            table.rows,
            vec![
                vec![text("X"), text("a")],
                vec![text("Y"), text("c")],
            ]
        );
    }

    #[test]
    fn test_dedup_blank_keys_collapse() {
        let mut table = Table::from_rows(vec![
            vec![Cell::Empty, text("a")],
            vec![text("  "), text("b")],
            vec![text("Z"), text("c")],
        ]);
        assert_eq!(table.dedup_by_column(0), 1);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_display_drops_integral_decimal() {
        assert_eq!(Cell::Number(123.0).display(), "123");
        assert_eq!(Cell::Number(1.5).display(), "1.5");
    }

    #[test]
    fn test_split_header() {
        let table = Table::from_rows(vec![vec![text("h")], vec![text("d")]]);
        let (header, data) = table.split_header();
        assert_eq!(header, vec![text("h")]);
        assert_eq!(data.row_count(), 1);
    }

    #[test]
    fn test_set_cell_grows_table() {
        let mut table = Table::new();
        table.set_cell(2, 3, Cell::Number(1.0));
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cell(2, 3), &Cell::Number(1.0));
        assert_eq!(table.cell(0, 0), &Cell::Empty);
    }
}
