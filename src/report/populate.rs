use crate::config::ReportConfig;
use crate::document::Table;
use crate::report::extract::RecordSet;

/// Where a field's values land in a target table: the first value is
/// written at `(start_row + row_offset, column)`, subsequent values on the
/// following rows.
#[derive(Copy, Clone, Debug)]
pub struct FieldTarget {
    pub row_offset: usize,
    pub column: usize,
}

/// Association from record-set field names to table positions.
pub type FieldMapping = &'static [(&'static str, FieldTarget)];

/// Grows a template table to fit a record set and writes formatted cells.
///
/// Layout is forced deterministic first: auto-fit is disabled and every
/// column gets the configured default width, so template authoring quirks
/// cannot shift columns. Growth is monotonic; existing rows are never
/// removed or reordered.
pub fn populate(
    table: &mut Table,
    mapping: FieldMapping,
    records: &RecordSet,
    start_row: usize,
    config: &ReportConfig,
) {
    table.fixed_layout = true;
    if table.grid.is_empty() {
        table.grid = vec![config.default_column_width; table.column_count()];
    } else {
        for width in &mut table.grid {
            *width = config.default_column_width;
        }
    }

    let required_rows = start_row
        + mapping
            .iter()
            .map(|(field, target)| target.row_offset + records.get(field).len())
            .max()
            .unwrap_or(0);
    table.grow_to(required_rows);

    let properties = config.run_properties();
    for (field, target) in mapping {
        for (index, value) in records.get(field).iter().enumerate() {
            if let Some(cell) = table.cell_mut(start_row + target.row_offset + index, target.column) {
                cell.set_text(value.trim(), &properties);
                cell.width = Some(config.default_column_width);
                // Long text must wrap instead of overflowing the page
                cell.no_wrap = false;
            }
        }
    }
}
