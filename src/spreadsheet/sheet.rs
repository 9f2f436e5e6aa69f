use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::SpreadsheetError;
use std::collections::HashMap;

/// A fully loaded sheet, keyed by (row, col) for random access.
///
/// The extraction engine walks designated columns row by row and probes
/// isolated named cells, so cells are indexed rather than streamed.
pub struct Sheet {
    /// Sheet name as declared in the workbook
    pub name: String,
    cells: HashMap<(usize, usize), Cell>,
    max_row: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            cells: HashMap::new(),
            max_row: None,
        }
    }

    /// Adds a cell, tracking the highest occupied row.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.max_row = Some(self.max_row.map_or(cell.row, |row| row.max(cell.row)));
        self.cells.insert((cell.row, cell.col), cell);
    }

    /// Returns the cell at 0-based (row, col), if present.
    pub(crate) fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Returns the cell at an A1-style reference like "D5".
    pub(crate) fn cell_by_reference(&self, reference: &str) -> Result<Option<&Cell>, SpreadsheetError> {
        let (row, col) = reference_to_index(reference)
            .ok_or_else(|| SpreadsheetError::InvalidCellReferenceError(reference.to_owned()))?;
        Ok(self.cell(row, col))
    }

    /// Rendered text of the cell at (row, col); "" when absent.
    pub(crate) fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(ToString::to_string).unwrap_or_default()
    }

    /// True if the cell at (row, col) is absent or whitespace-only.
    pub(crate) fn is_blank(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).map_or(true, Cell::is_blank)
    }

    /// Highest occupied 0-based row index, None for an empty sheet.
    pub(crate) fn max_row(&self) -> Option<usize> {
        self.max_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellKind;

    pub(crate) fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: if value.is_empty() { CellKind::Empty } else { CellKind::Text },
            raw: value.to_owned(),
            number_format: String::new(),
        });
    }

    #[test]
    fn sheet_lookup() {
        let mut sheet = Sheet::new("test");
        push(&mut sheet, 1, 0, "a");
        push(&mut sheet, 4, 3, "b");

        assert_eq!(sheet.text(1, 0), "a");
        assert_eq!(sheet.text(0, 0), "");
        assert!(sheet.is_blank(2, 2));
        assert!(!sheet.is_blank(4, 3));
        assert_eq!(sheet.max_row(), Some(4));
    }

    #[test]
    fn sheet_reference_lookup() {
        let mut sheet = Sheet::new("test");
        push(&mut sheet, 4, 3, "42.1");

        let cell = sheet.cell_by_reference("D5").unwrap();
        assert_eq!(cell.unwrap().raw, "42.1");
        assert!(sheet.cell_by_reference("A1").unwrap().is_none());
        assert!(sheet.cell_by_reference("bogus").is_err());
    }

    #[test]
    fn empty_sheet_bounds() {
        let sheet = Sheet::new("test");
        assert_eq!(sheet.max_row(), None);
        assert!(sheet.is_blank(0, 0));
    }
}
