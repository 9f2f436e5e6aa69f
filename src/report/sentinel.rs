use crate::config::ReportConfig;
use crate::document::Table;

/// Text placed in the first data cell of a table that received no records.
pub const EMPTY_TABLE_SENTINEL: &str = "無";

/// Marks a table whose population produced no records.
///
/// A table counts as empty when every cell outside the header row is blank;
/// a header-only table is empty vacuously. Empty tables get one data row
/// whose first cell holds the sentinel text, so the printed report never
/// shows a bare header.
pub fn fill_if_empty(table: &mut Table, config: &ReportConfig) {
    if !is_empty(table) {
        return;
    }
    table.grow_to(2);
    if let Some(cell) = table.cell_mut(1, 0) {
        cell.set_text(EMPTY_TABLE_SENTINEL, &config.run_properties());
    }
}

fn is_empty(table: &Table) -> bool {
    table
        .rows
        .iter()
        .skip(1)
        .all(|row| row.cells.iter().all(|cell| cell.is_blank()))
}
