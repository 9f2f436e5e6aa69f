use crate::document::Table;
use crate::document::VerticalMerge;

/// Vertically merges consecutive data rows sharing the same trimmed key
/// column text, in the designated columns. The header row (row 0) never
/// participates, and groups of size one are left untouched.
pub fn merge_consecutive(table: &mut Table, key_column: usize, merge_columns: &[usize]) {
    if table.rows.len() <= 1 {
        return;
    }

    let mut group_start = 1usize;
    let mut previous_key = key_of(table, 1, key_column);
    for row in 2..table.rows.len() {
        let key = key_of(table, row, key_column);
        if key != previous_key {
            flush_group(table, group_start, row, merge_columns);
            group_start = row;
            previous_key = key;
        }
    }
    // The final group ends at the last row
    flush_group(table, group_start, table.rows.len(), merge_columns);
}

fn key_of(table: &Table, row: usize, key_column: usize) -> String {
    table
        .rows
        .get(row)
        .and_then(|row| row.cells.get(key_column))
        .map(|cell| cell.text().trim().to_owned())
        .unwrap_or_default()
}

/// Marks rows [start, end) as one merge group in each designated column.
/// Continuation cells lose their text first so the merged cell does not
/// render concatenated duplicates.
fn flush_group(table: &mut Table, start: usize, end: usize, merge_columns: &[usize]) {
    if end - start <= 1 {
        return;
    }
    for &column in merge_columns {
        if let Some(cell) = table.cell_mut(start, column) {
            cell.vertical_merge = Some(VerticalMerge::Restart);
        }
        for row in (start + 1)..end {
            if let Some(cell) = table.cell_mut(row, column) {
                cell.paragraphs.clear();
                cell.vertical_merge = Some(VerticalMerge::Continue);
            }
        }
    }
}
