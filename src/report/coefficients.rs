use crate::report::extract::RecordSet;
use crate::spreadsheet::reference::column_to_index;
use crate::spreadsheet::sheet::Sheet;

/// Decimal digits used when a coefficient value is numeric.
const COEFFICIENT_PRECISION: usize = 10;

/// Declarative description of the wide coefficient sheet: one row per
/// emission source, one column per gas.
pub struct CoefficientLayout {
    /// Exact sheet name
    pub sheet: &'static str,
    /// Header row, 0-based; data starts on the next row
    pub header_row: usize,
    /// Column letters of the fields shared by every emitted row
    pub category_column: &'static str,
    pub source_column: &'static str,
    pub factor_source_column: &'static str,
    pub factor_name_column: &'static str,
    pub unit_column: &'static str,
    /// (gas identifier, column letter) pairs, in declaration order
    pub gas_columns: &'static [(&'static str, &'static str)],
}

/// Pivots the wide coefficient table into one output row per source×gas.
///
/// Rows without a category are header clutter and are skipped; rows whose
/// gas columns are all blank emit nothing. Output order is input row order,
/// then gas declaration order within a row.
pub fn transform(sheet: &Sheet, layout: &CoefficientLayout) -> RecordSet {
    let mut records = RecordSet::new();
    for field in ["category", "source", "gas", "value", "factor_source", "factor_name", "unit"] {
        records.register(field);
    }

    let last_row = match sheet.max_row() {
        Some(row) => row,
        None => return records,
    };

    let category_col = column(layout.category_column);
    for row in (layout.header_row + 1)..=last_row {
        if sheet.is_blank(row, category_col) {
            continue;
        }
        let category = sheet.text(row, category_col);
        let source = sheet.text(row, column(layout.source_column));
        let factor_source = sheet.text(row, column(layout.factor_source_column));
        let factor_name = sheet.text(row, column(layout.factor_name_column));
        let unit = sheet.text(row, column(layout.unit_column));

        for (gas, letter) in layout.gas_columns {
            let Some(cell) = sheet.cell(row, column(letter)) else {
                continue;
            };
            if cell.is_blank() {
                continue;
            }
            // Parseability decides, not cell kind: factor cells are often
            // typed as text in hand-edited workbooks
            let value = match cell.to_double() {
                Ok(value) => format!("{value:.COEFFICIENT_PRECISION$}"),
                Err(_) => cell.to_string(),
            };
            records.push("category", category.to_owned());
            records.push("source", source.to_owned());
            records.push("gas", (*gas).to_owned());
            records.push("value", value);
            records.push("factor_source", factor_source.to_owned());
            records.push("factor_name", factor_name.to_owned());
            records.push("unit", unit.to_owned());
        }
    }

    records
}

fn column(letter: &str) -> usize {
    column_to_index(letter).expect("layout column letter")
}
