//! The fixed mapping catalog: which workbook sheets feed which template
//! tables, in document order, plus the merge, placeholder and sentinel
//! steps that follow. Sheet names, column letters, cell references and
//! table positions are the contract with the workbook/template pair; the
//! workbook declares no schema of its own, so record-set field keys mirror
//! the source column letters (bucket keys carry the category suffix).

use crate::report::coefficients::CoefficientLayout;
use crate::report::extract::Discriminator;
use crate::report::extract::SheetLayout;
use crate::report::populate::FieldMapping;
use crate::report::populate::FieldTarget;

/// Company profile sheet. The name/address listing starts at spreadsheet
/// row 18; isolated `rb_*` cells above it are read by placeholder groups.
pub(crate) const BASIC_INFO: SheetLayout = SheetLayout {
    sheet: "表1.基本資料",
    start_row: 17,
    core_columns: &["A", "C"],
    fields: &[("A", "A"), ("C", "C")],
    discriminator: None,
    synthetic_fields: &[],
};

/// Emission source identification sheet. Column E carries the scope or
/// category label; `範疇1` rows fan out both their gas (K) and source (C)
/// while each `類別N` label feeds one single-column table.
pub(crate) const SOURCES: SheetLayout = SheetLayout {
    sheet: "表2.排放源鑑別",
    start_row: 3,
    core_columns: &["B", "C", "E", "K"],
    fields: &[
        ("B", "B"),
        ("C", "C"),
        ("E", "E"),
        ("K", "K"),
        ("I", "I"),
    ],
    discriminator: Some(Discriminator {
        column: "E",
        buckets: &[
            ("範疇1", "K", "K_category1"),
            ("範疇1", "C", "C_category1"),
            ("類別3", "C", "C_category3"),
            ("類別5", "C", "C_category5"),
            ("類別6", "C", "C_category6"),
            ("類別7", "C", "C_category7"),
            ("類別8", "C", "C_category8"),
            ("類別10", "C", "C_category10"),
            ("類別11", "C", "C_category11"),
            ("類別13", "C", "C_category13"),
            ("類別14", "C", "C_category14"),
            ("類別15", "C", "C_category15"),
        ],
    }),
    synthetic_fields: &[("others", "請輸入文字")],
};

/// Activity data sheet.
pub(crate) const ACTIVITY: SheetLayout = SheetLayout {
    sheet: "表3.活動數據",
    start_row: 3,
    core_columns: &["C", "I"],
    fields: &[("C", "C"), ("I", "I")],
    discriminator: None,
    synthetic_fields: &[("others", "請輸入文字")],
};

/// Uncertainty analysis sheet; all twelve columns decide row acceptance.
pub(crate) const UNCERTAINTY: SheetLayout = SheetLayout {
    sheet: "表8.不確定分析",
    start_row: 3,
    core_columns: &["B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M"],
    fields: &[
        ("B", "B"),
        ("C", "C"),
        ("D", "D"),
        ("E", "E"),
        ("F", "F"),
        ("G", "G"),
        ("H", "H"),
        ("I", "I"),
        ("J", "J"),
        ("K", "K"),
        ("L", "L"),
        ("M", "M"),
    ],
    discriminator: None,
    synthetic_fields: &[],
};

/// Wide emission factor sheet, one column per greenhouse gas.
pub(crate) const COEFFICIENTS: CoefficientLayout = CoefficientLayout {
    sheet: "表5.排放係數",
    header_row: 2,
    category_column: "A",
    source_column: "B",
    factor_source_column: "C",
    factor_name_column: "D",
    unit_column: "E",
    gas_columns: &[
        ("CO2", "F"),
        ("CH4", "G"),
        ("N2O", "H"),
        ("HFCS", "I"),
        ("PFCS", "J"),
        ("SF6", "K"),
        ("NF3", "L"),
    ],
};

/// Where a population step's records come from.
pub(crate) enum RecordSource {
    /// Columnar scan of a sheet under a layout
    Layout(&'static SheetLayout),
    /// Wide-to-long pivot of the coefficient sheet
    Coefficients(&'static CoefficientLayout),
}

/// One table population step: extract records from a source and write them
/// into a template table under a field mapping.
pub(crate) struct PopulationStep {
    pub source: RecordSource,
    /// Zero-based position among the template's tables
    pub table_index: usize,
    /// First data row; row 0 is the template's header
    pub start_row: usize,
    pub mapping: FieldMapping,
}

const fn target(column: usize) -> FieldTarget {
    FieldTarget { row_offset: 0, column }
}

/// Field mapping shared by the single-column `類別N` tables.
macro_rules! category_step {
    ($table:expr, $bucket:expr) => {
        PopulationStep {
            source: RecordSource::Layout(&SOURCES),
            table_index: $table,
            start_row: 1,
            mapping: &[($bucket, target(0))],
        }
    };
}

/// Template population steps, in document order.
pub(crate) const POPULATION_STEPS: &[PopulationStep] = &[
    PopulationStep {
        source: RecordSource::Layout(&BASIC_INFO),
        table_index: 0,
        start_row: 1,
        mapping: &[("A", target(0)), ("C", target(1))],
    },
    PopulationStep {
        source: RecordSource::Layout(&SOURCES),
        table_index: 1,
        start_row: 1,
        mapping: &[("K_category1", target(0)), ("C_category1", target(1))],
    },
    category_step!(3, "C_category3"),
    category_step!(5, "C_category5"),
    category_step!(6, "C_category6"),
    category_step!(7, "C_category7"),
    category_step!(8, "C_category8"),
    category_step!(10, "C_category10"),
    category_step!(11, "C_category11"),
    category_step!(13, "C_category13"),
    category_step!(14, "C_category14"),
    category_step!(15, "C_category15"),
    PopulationStep {
        source: RecordSource::Layout(&SOURCES),
        table_index: 16,
        start_row: 1,
        mapping: &[
            ("E", target(0)),
            ("K", target(1)),
            ("B", target(2)),
            ("C", target(3)),
        ],
    },
    PopulationStep {
        source: RecordSource::Layout(&ACTIVITY),
        table_index: 23,
        start_row: 1,
        mapping: &[("C", target(0)), ("I", target(1)), ("others", target(2))],
    },
    PopulationStep {
        source: RecordSource::Layout(&SOURCES),
        table_index: 24,
        start_row: 1,
        mapping: &[("E", target(0)), ("C", target(1)), ("others", target(2))],
    },
    PopulationStep {
        source: RecordSource::Coefficients(&COEFFICIENTS),
        table_index: 25,
        start_row: 1,
        mapping: &[
            ("category", target(0)),
            ("source", target(1)),
            ("factor_source", target(2)),
            ("factor_name", target(3)),
            ("gas", target(4)),
            ("value", target(5)),
            ("unit", target(6)),
        ],
    },
    PopulationStep {
        source: RecordSource::Layout(&UNCERTAINTY),
        table_index: 34,
        start_row: 1,
        mapping: &[
            ("B", target(0)),
            ("C", target(1)),
            ("D", target(2)),
            ("E", target(3)),
            ("F", target(4)),
            ("G", target(5)),
            ("H", target(6)),
            ("I", target(7)),
            ("J", target(8)),
        ],
    },
];

/// One vertical merge pass over a populated table.
pub(crate) struct MergeStep {
    pub table_index: usize,
    pub key_column: usize,
    pub merge_columns: &'static [usize],
}

/// Merge steps, applied after all tables are populated. Coefficient rows
/// repeat their source once per gas; the shared leading columns collapse
/// into one cell per source group.
pub(crate) const MERGE_STEPS: &[MergeStep] = &[MergeStep {
    table_index: 25,
    key_column: 1,
    merge_columns: &[0, 1, 2, 3],
}];

/// Tokens resolved from individually named cells of one sheet.
pub(crate) struct PlaceholderGroup {
    pub sheet: &'static str,
    /// (literal token, A1 cell reference) pairs
    pub tokens: &'static [(&'static str, &'static str)],
}

/// Placeholder groups, applied after merging.
pub(crate) const PLACEHOLDER_GROUPS: &[PlaceholderGroup] = &[
    PlaceholderGroup {
        sheet: "表6.2溫室氣體排放量 (範疇1&2, 類別1-15)",
        tokens: &[
            ("Table6.2_D5", "D5"),
            ("Table6.2_D6", "D6"),
            ("Table6.2_D7", "D7"),
            ("Table6.2_D8", "D8"),
            ("Table6.2_D9", "D9"),
            ("Table6.2_D10", "D10"),
            ("Table6.2_D11", "D11"),
            ("Table6.2_D17", "D17"),
            ("Table6.2_D18", "D18"),
            ("Table6.2_D19", "D19"),
            ("Table6.2_D20", "D20"),
            ("Table6.2_D21", "D21"),
            ("Table6.2_D22", "D22"),
            ("Table6.2_D23", "D23"),
            ("Table6.2_D24", "D24"),
            ("Table6.2_D25", "D25"),
            ("Table6.2_D26", "D26"),
            ("Table6.2_D27", "D27"),
            ("Table6.2_D28", "D28"),
            ("Table6.2_D29", "D29"),
            ("Table6.2_D30", "D30"),
            ("Table6.2_D31", "D31"),
            ("Table6.2_D32", "D32"),
            ("Table6.2_D33", "D33"),
        ],
    },
    PlaceholderGroup {
        sheet: "表6.1溫室氣體排放量(範疇1-2)",
        tokens: &[
            ("Table6.1_J4", "J4"),
            ("Table6.1_C24", "C24"),
            ("Table6.1_C25", "C25"),
            ("Table6.1_G21", "G21"),
            ("Table6.1_H21", "H21"),
            ("Table6.1_J21", "J21"),
            ("Table6.1_K21", "K21"),
            ("Table6.1_G22", "G22"),
            ("Table6.1_H23", "H23"),
            ("Table6.1_C13", "C13"),
            ("Table6.1_D13", "D13"),
            ("Table6.1_E13", "E13"),
            ("Table6.1_F13", "F13"),
            ("Table6.1_G13", "G13"),
            ("Table6.1_H13", "H13"),
            ("Table6.1_I13", "I13"),
            ("Table6.1_C15", "C15"),
            ("Table6.1_D15", "D15"),
            ("Table6.1_E15", "E15"),
            ("Table6.1_F15", "F15"),
            ("Table6.1_G15", "G15"),
            ("Table6.1_H15", "H15"),
            ("Table6.1_I15", "I15"),
            ("Table6.1_C21", "C21"),
            ("Table6.1_D21", "D21"),
            ("Table6.1_E21", "E21"),
            ("Table6.1_F21", "F21"),
            ("Table6.1_C22", "C22"),
            ("Table6.1_D22", "D22"),
            ("Table6.1_E22", "E22"),
            ("Table6.1_F22", "F22"),
            ("Table6.1_C23", "C23"),
            ("Table6.1_D23", "D23"),
            ("Table6.1_E23", "E23"),
            ("Table6.1_F23", "F23"),
            ("Table6.1_G23", "G23"),
            ("Table6.1_H22", "H22"),
        ],
    },
    PlaceholderGroup {
        sheet: "表7.數據品質分析",
        tokens: &[("Table7_O2", "O2"), ("Table7_Q2", "Q2")],
    },
    PlaceholderGroup {
        sheet: "表8.不確定分析",
        tokens: &[
            ("Table8_A23", "A23"),
            ("Table8_C23", "C23"),
            ("Table8_E23", "E23"),
        ],
    },
    PlaceholderGroup {
        sheet: "表1.基本資料",
        tokens: &[
            ("rb_version", "B2"),
            ("rb_published_year", "D2"),
            ("rb_published_month", "D3"),
            ("rb_company_name", "B5"),
            ("rb_company_address", "B6"),
            ("rb_initiating_year", "B8"),
            ("rb_base_year", "B9"),
            ("rb_reporting_year", "B10"),
            ("rb_reporting_period", "B11"),
            ("rb_contact_name", "B12"),
            ("rb_contact_dept", "B13"),
            ("rb_contact_phone", "B14"),
            ("rb_contact_email", "B15"),
        ],
    },
];

/// The per-category tables checked for emptiness once every other step has
/// run; most category buckets are empty for a typical inventory.
pub(crate) const SENTINEL_TABLES: &[usize] = &[1, 3, 5, 6, 7, 8, 10, 11, 13, 14, 15];
