use crate::report::format::CellFormatter;
use crate::spreadsheet::reference::column_to_index;
use crate::spreadsheet::sheet::Sheet;
use std::collections::HashMap;

/// Aligned, named value sequences extracted from one sheet scan.
///
/// All fields populated by the same scan pass have equal length, with index
/// `i` across fields referring to the same source row. Category-bucket
/// fields hold filtered subsets and may be shorter.
#[derive(Debug, Default)]
pub struct RecordSet {
    order: Vec<String>,
    columns: HashMap<String, Vec<String>>,
}

impl RecordSet {
    pub fn new() -> Self {
        RecordSet::default()
    }

    /// Registers a field so it exists (possibly empty) in field order.
    pub(crate) fn register(&mut self, field: &str) {
        if !self.columns.contains_key(field) {
            self.order.push(field.to_owned());
            self.columns.insert(field.to_owned(), Vec::new());
        }
    }

    /// Appends a value to a field's sequence.
    pub(crate) fn push(&mut self, field: &str, value: String) {
        self.register(field);
        if let Some(column) = self.columns.get_mut(field) {
            column.push(value);
        }
    }

    /// The ordered sequence for a field; empty for unknown fields.
    pub fn get(&self, field: &str) -> &[String] {
        self.columns.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Field names in registration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Length of the longest field sequence.
    pub fn max_len(&self) -> usize {
        self.columns.values().map(Vec::len).max().unwrap_or(0)
    }
}

/// Classifies accepted rows into category buckets by exact string equality
/// on a discriminator column. A label may appear in several bucket entries,
/// fanning one row out to multiple buckets from different value columns.
pub struct Discriminator {
    /// Column letter holding the category label
    pub column: &'static str,
    /// (label, value column letter, bucket field) triples; unmatched labels
    /// contribute to no bucket
    pub buckets: &'static [(&'static str, &'static str, &'static str)],
}

/// Declarative description of one sheet's scan: where it starts, which
/// columns are read, and how rows are classified. The workbook itself
/// declares no schema, so these are part of the contract.
pub struct SheetLayout {
    /// Exact sheet name, CJK included
    pub sheet: &'static str,
    /// First scanned row, 0-based
    pub start_row: usize,
    /// Columns that decide row acceptance and termination
    pub core_columns: &'static [&'static str],
    /// (field name, column letter) pairs tracked for every accepted row
    pub fields: &'static [(&'static str, &'static str)],
    pub discriminator: Option<Discriminator>,
    /// (field name, literal) pairs appended for every accepted row
    pub synthetic_fields: &'static [(&'static str, &'static str)],
}

/// How many consecutive fully-blank core rows end the scan. A single blank
/// row is an intentional separator, not the end of data.
const BLANK_ROW_TOLERANCE: usize = 2;

/// Scans a sheet under a layout, producing aligned field sequences plus
/// category buckets.
pub fn extract(sheet: &Sheet, layout: &SheetLayout, formatter: &CellFormatter) -> RecordSet {
    let mut records = RecordSet::new();
    for (field, _) in layout.fields {
        records.register(field);
    }
    for (field, _) in layout.synthetic_fields {
        records.register(field);
    }
    if let Some(discriminator) = &layout.discriminator {
        for (_, _, bucket) in discriminator.buckets {
            records.register(bucket);
        }
    }

    let last_row = match sheet.max_row() {
        Some(row) => row,
        None => return records,
    };

    let mut blank_streak = 0usize;
    let mut row = layout.start_row;
    while row <= last_row + BLANK_ROW_TOLERANCE {
        let accepted = layout
            .core_columns
            .iter()
            .any(|letter| !sheet.is_blank(row, column(letter)));
        if !accepted {
            blank_streak += 1;
            if blank_streak >= BLANK_ROW_TOLERANCE {
                break;
            }
            row += 1;
            continue;
        }
        blank_streak = 0;

        // Record every tracked field, blanks included, to keep row alignment
        for (field, letter) in layout.fields {
            let value = formatter.format(sheet.cell(row, column(letter)));
            records.push(field, value);
        }
        for (field, literal) in layout.synthetic_fields {
            records.push(field, (*literal).to_owned());
        }
        if let Some(discriminator) = &layout.discriminator {
            let label = sheet.text(row, column(discriminator.column));
            let label = label.trim();
            for (candidate, value_column, bucket) in discriminator.buckets {
                if *candidate == label {
                    let value = formatter.format(sheet.cell(row, column(value_column)));
                    records.push(bucket, value);
                }
            }
        }
        row += 1;
    }

    records
}

/// 0-based index of a layout column letter.
fn column(letter: &str) -> usize {
    column_to_index(letter).expect("layout column letter")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PercentPolicy;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellKind;

    fn sheet(cells: &[(usize, &str, &str)]) -> Sheet {
        let mut sheet = Sheet::new("测试");
        for (row, letter, value) in cells {
            sheet.push(Cell {
                row: *row,
                col: column(letter),
                kind: CellKind::Text,
                raw: (*value).to_owned(),
                number_format: String::new(),
            });
        }
        sheet
    }

    fn formatter() -> CellFormatter {
        CellFormatter::new(PercentPolicy::SymmetricFraction)
    }

    const PLAIN_LAYOUT: SheetLayout = SheetLayout {
        sheet: "测试",
        start_row: 1,
        core_columns: &["A", "B"],
        fields: &[("name", "A"), ("value", "B"), ("unit", "C")],
        discriminator: None,
        synthetic_fields: &[("remark", "（待补充）")],
    };

    #[test]
    fn sequences_stay_aligned_across_fields() {
        let sheet = sheet(&[
            (1, "A", "one"),
            (1, "C", "kg"),
            (2, "B", "2"),
        ]);
        let records = extract(&sheet, &PLAIN_LAYOUT, &formatter());

        assert_eq!(records.get("name"), ["one", ""]);
        assert_eq!(records.get("value"), ["", "2"]);
        assert_eq!(records.get("unit"), ["kg", ""]);
        assert_eq!(records.get("remark"), ["（待补充）", "（待补充）"]);
        // Pairwise equal lengths for one scan pass
        let lengths: Vec<usize> = records.field_names().map(|f| records.get(f).len()).collect();
        assert!(lengths.iter().all(|len| *len == lengths[0]));
    }

    #[test]
    fn single_blank_row_does_not_terminate() {
        let sheet = sheet(&[
            (1, "A", "one"),
            // row 2 fully blank: intentional separator
            (3, "A", "two"),
        ]);
        let records = extract(&sheet, &PLAIN_LAYOUT, &formatter());
        assert_eq!(records.get("name"), ["one", "two"]);
    }

    #[test]
    fn two_consecutive_blank_rows_terminate() {
        let sheet = sheet(&[
            (1, "A", "one"),
            // rows 2 and 3 fully blank
            (4, "A", "ghost"),
        ]);
        let records = extract(&sheet, &PLAIN_LAYOUT, &formatter());
        assert_eq!(records.get("name"), ["one"]);
    }

    #[test]
    fn non_core_columns_do_not_accept_rows() {
        let sheet = sheet(&[
            (1, "A", "one"),
            (2, "C", "unit only"),
            (3, "C", "unit only"),
        ]);
        let records = extract(&sheet, &PLAIN_LAYOUT, &formatter());
        assert_eq!(records.get("name"), ["one"]);
    }

    #[test]
    fn empty_sheet_yields_registered_empty_fields() {
        let records = extract(&Sheet::new("测试"), &PLAIN_LAYOUT, &formatter());
        assert_eq!(records.field_names().count(), 4);
        assert_eq!(records.max_len(), 0);
    }

    #[test]
    fn discriminator_fills_buckets_by_exact_match() {
        const LAYOUT: SheetLayout = SheetLayout {
            sheet: "测试",
            start_row: 1,
            core_columns: &["A"],
            fields: &[("source", "A"), ("scope", "B")],
            discriminator: Some(Discriminator {
                column: "B",
                buckets: &[("範疇1", "A", "scope1"), ("類別3", "A", "category3")],
            }),
            synthetic_fields: &[],
        };
        let sheet = sheet(&[
            (1, "A", "锅炉"),
            (1, "B", "範疇1"),
            (2, "A", "通勤"),
            (2, "B", "類別3"),
            (3, "A", "其他"),
            (3, "B", "類別99"), // matches no bucket, silently skipped
        ]);
        let records = extract(&sheet, &LAYOUT, &formatter());

        assert_eq!(records.get("source"), ["锅炉", "通勤", "其他"]);
        assert_eq!(records.get("scope1"), ["锅炉"]);
        assert_eq!(records.get("category3"), ["通勤"]);
        assert_eq!(records.max_len(), 3);
    }

    #[test]
    fn one_label_can_fan_out_to_several_buckets() {
        const LAYOUT: SheetLayout = SheetLayout {
            sheet: "测试",
            start_row: 1,
            core_columns: &["A"],
            fields: &[("name", "A")],
            discriminator: Some(Discriminator {
                column: "C",
                buckets: &[
                    ("範疇1", "B", "scope1_gases"),
                    ("範疇1", "A", "scope1_sources"),
                ],
            }),
            synthetic_fields: &[],
        };
        let sheet = sheet(&[
            (1, "A", "锅炉"),
            (1, "B", "CO2"),
            (1, "C", "範疇1"),
        ]);
        let records = extract(&sheet, &LAYOUT, &formatter());

        assert_eq!(records.get("scope1_gases"), ["CO2"]);
        assert_eq!(records.get("scope1_sources"), ["锅炉"]);
    }
}
