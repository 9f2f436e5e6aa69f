//! # Report Building Module
//!
//! The two engines that turn workbook rows into a populated report: sheet
//! scanning into aligned record sets, and template table population with
//! merging, placeholder substitution and empty-table sentinels. The
//! `catalog` submodule pins the fixed sheet/table contract; `build_report`
//! drives the whole pipeline over one in-memory document and saves once at
//! the end.

pub(crate) mod catalog;
pub(crate) mod coefficients;
pub(crate) mod extract;
pub(crate) mod format;
pub(crate) mod merge;
pub(crate) mod populate;
pub(crate) mod sentinel;
pub(crate) mod substitute;

use crate::config::ReportConfig;
use crate::document::docx;
use crate::document::Document;
use crate::error::ReportError;
use crate::error::ResultMessage;
use crate::report::catalog::RecordSource;
use crate::report::format::CellFormatter;
use crate::spreadsheet::Workbook;

/// Builds a report: opens the workbook, loads the template, populates it
/// and saves the result. The document is mutated in memory throughout and
/// persisted exactly once.
pub fn build_report(
    workbook_path: &str,
    template_path: &str,
    output_path: &str,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let workbook = Workbook::open(workbook_path).with_prefix("Failed to open workbook")?;
    let mut document = docx::load_path(template_path).with_prefix("Failed to load template")?;
    populate_document(&workbook, &mut document, config)?;
    docx::save_path(&document, output_path).with_prefix("Failed to save report")
}

/// Runs the full population catalog against an opened workbook and loaded
/// document: table population in document order, then merges, placeholder
/// substitution and empty-table sentinels.
///
/// A missing source sheet or an out-of-range table index aborts the
/// pipeline: the workbook/template pair is structurally incompatible with
/// the catalog and a partial report would be misleading. Placeholder
/// groups degrade instead, so one damaged summary sheet does not block the
/// rest of the report.
pub fn populate_document(
    workbook: &Workbook,
    document: &mut Document,
    config: &ReportConfig,
) -> Result<(), ReportError> {
    let formatter = CellFormatter::new(config.percent_policy);

    for step in catalog::POPULATION_STEPS {
        let (sheet_name, records) = match &step.source {
            RecordSource::Layout(layout) => (
                layout.sheet,
                extract::extract(workbook.sheet(layout.sheet)?, layout, &formatter),
            ),
            RecordSource::Coefficients(layout) => (
                layout.sheet,
                coefficients::transform(workbook.sheet(layout.sheet)?, layout),
            ),
        };
        log::debug!(
            "Populating table {} from sheet '{}' ({} records)",
            step.table_index,
            sheet_name,
            records.max_len()
        );
        let table = document.table_mut(step.table_index)?;
        populate::populate(table, step.mapping, &records, step.start_row, config);
    }

    for step in catalog::MERGE_STEPS {
        let table = document.table_mut(step.table_index)?;
        merge::merge_consecutive(table, step.key_column, step.merge_columns);
    }

    let replacements = placeholder_replacements(workbook, &formatter);
    substitute::substitute(document, &replacements, config);

    for index in catalog::SENTINEL_TABLES {
        sentinel::fill_if_empty(document.table_mut(*index)?, config);
    }

    Ok(())
}

/// Resolves every placeholder token of every group to a replacement value.
///
/// A group whose sheet is missing degrades to empty replacements for all
/// its tokens, so the tokens still vanish from the output; an unreadable
/// single cell degrades the same way. Both are logged.
fn placeholder_replacements(workbook: &Workbook, formatter: &CellFormatter) -> Vec<(String, String)> {
    let mut replacements: Vec<(String, String)> = Vec::new();
    for group in catalog::PLACEHOLDER_GROUPS {
        let sheet = match workbook.sheet(group.sheet) {
            Ok(sheet) => sheet,
            Err(error) => {
                log::warn!("Placeholder sheet '{}' unavailable, blanking its tokens: {error}", group.sheet);
                replacements.extend(group.tokens.iter().map(|(token, _)| ((*token).to_owned(), String::new())));
                continue;
            }
        };
        for (token, reference) in group.tokens {
            let value = match sheet.cell_by_reference(reference) {
                Ok(cell) => formatter.format(cell),
                Err(error) => {
                    log::warn!("Placeholder cell {}!{reference} unreadable: {error}", group.sheet);
                    String::new()
                }
            };
            replacements.push(((*token).to_owned(), value));
        }
    }
    replacements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;
    use crate::document::Paragraph;
    use crate::document::RunProperties;
    use crate::document::Table;
    use crate::document::TableCell;
    use crate::document::TableRow;
    use crate::document::VerticalMerge;
    use std::io::Cursor;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const SHEET_NAMES: &[&str] = &[
        "表1.基本資料",
        "表2.排放源鑑別",
        "表3.活動數據",
        "表5.排放係數",
        "表6.1溫室氣體排放量(範疇1-2)",
        "表6.2溫室氣體排放量 (範疇1&amp;2, 類別1-15)",
        "表7.數據品質分析",
        "表8.不確定分析",
    ];

    fn write_workbook(sheets: &[(&str, String)]) -> Workbook {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut entry = |path: &str, content: &str| {
            zip.start_file(path, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        let mut relationships = String::from("<Relationships>");
        let mut workbook = String::from("<workbook><sheets>");
        for (index, (name, _)) in sheets.iter().enumerate() {
            let id = index + 1;
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
            ));
            workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
        }
        relationships.push_str("</Relationships>");
        workbook.push_str("</sheets></workbook>");

        entry("xl/_rels/workbook.xml.rels", &relationships);
        entry("xl/workbook.xml", &workbook);
        // xf 0 = General, xf 1 = builtin percent format 0.00%
        entry(
            "xl/styles.xml",
            r#"<styleSheet><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="10"/></cellXfs></styleSheet>"#,
        );
        for (index, (_, xml)) in sheets.iter().enumerate() {
            entry(&format!("xl/worksheets/sheet{}.xml", index + 1), xml);
        }

        let cursor = zip.finish().unwrap();
        Workbook::from_reader("fixture.xlsx", cursor).unwrap()
    }

    fn write_fixture_workbook() -> Workbook {
        // Basic info: isolated rb_* cells above the row-18 listing; one
        // intentional blank row inside the listing
        let basic_info = sheet_xml(&[
            text("B2", "v7"),
            text("D2", "2026"),
            text("D3", "8"),
            text("B5", "示範科技股份有限公司"),
            text("B6", "臺北市信義區示範路一號"),
            text("B8", "2020"),
            text("B9", "2023"),
            text("B10", "2025"),
            text("B11", "2025/01/01-2025/12/31"),
            text("B12", "王小明"),
            text("B13", "永續發展部"),
            text("B14", "02-12345678"),
            text("B15", "esg@example.com"),
            text("A18", "公司名稱"),
            text("C18", "示範科技股份有限公司"),
            text("A19", "統一編號"),
            text("C19", "12345678"),
            // row 20 blank: separator, not the end
            text("A21", "行業別"),
            text("C21", "製造業"),
        ]);

        // Source identification: two scope-1 rows, a separator blank row,
        // one category-3 row, then two blank rows and a ghost row the scan
        // must never reach
        let sources = sheet_xml(&[
            text("B4", "固定燃燒"), text("C4", "天然氣鍋爐"), text("E4", "範疇1"), text("K4", "CO2"), text("I4", "備註甲"),
            text("B5", "固定燃燒"), text("C5", "柴油發電機"), text("E5", "範疇1"), text("K5", "CO2、CH4"),
            text("B7", "員工通勤"), text("C7", "通勤車輛"), text("E7", "類別3"),
            text("B10", "幽靈"), text("C10", "不應出現"),
        ]);

        let activity = sheet_xml(&[
            text("C4", "天然氣"), number("I4", "12345.6", None),
            text("C5", "外購電力"), number("I5", "54321", None),
        ]);

        // Coefficients: header on Excel row 3, data from row 4; the second
        // row's CO2 factor is typed as text
        let coefficients = sheet_xml(&[
            text("A4", "能源"), text("B4", "天然氣鍋爐"), text("C4", "IPCC 2006"),
            text("D4", "預設值"), text("E4", "kgCO2e/度"),
            number("F4", "21.622", None), number("G4", "0.001", None),
            text("A5", "能源"), text("B5", "柴油發電機"), text("C5", "IPCC 2006"),
            text("D5", "預設值"), text("E5", "kgCO2e/公升"),
            text("F5", "3.1"),
        ]);

        let emissions_61 = sheet_xml(&[number("J4", "123.45", None)]);
        let emissions_62 = sheet_xml(&[number("D5", "0.35", Some(1))]);
        let quality = sheet_xml(&[text("O2", "等級2")]);
        let uncertainty = sheet_xml(&[
            text("B4", "天然氣鍋爐"), text("C4", "-5%"), text("D4", "+5%"),
            text("E4", "-2%"), text("F4", "+2%"), text("G4", "-5.4%"),
            text("H4", "+5.4%"), text("I4", "排放係數"), text("J4", "儀器校正"),
            text("A23", "不確定性說明"), text("C23", "±10%"),
        ]);

        write_workbook(&[
            (SHEET_NAMES[0], basic_info),
            (SHEET_NAMES[1], sources),
            (SHEET_NAMES[2], activity),
            (SHEET_NAMES[3], coefficients),
            (SHEET_NAMES[4], emissions_61),
            (SHEET_NAMES[5], emissions_62),
            (SHEET_NAMES[6], quality),
            (SHEET_NAMES[7], uncertainty),
        ])
    }

    fn text(reference: &str, value: &str) -> String {
        format!(r#"<c r="{reference}" t="inlineStr"><is><t>{value}</t></is></c>"#)
    }

    fn number(reference: &str, value: &str, style: Option<usize>) -> String {
        match style {
            Some(style) => format!(r#"<c r="{reference}" s="{style}"><v>{value}</v></c>"#),
            None => format!(r#"<c r="{reference}"><v>{value}</v></c>"#),
        }
    }

    fn sheet_xml(cells: &[String]) -> String {
        format!("<worksheet><sheetData>{}</sheetData></worksheet>", cells.join(""))
    }

    fn header_table(columns: usize) -> Table {
        let cells = (0..columns)
            .map(|index| {
                let mut cell = TableCell::blank();
                cell.set_text(&format!("欄{index}"), &RunProperties::default());
                cell
            })
            .collect();
        Table {
            rows: vec![TableRow { cells }],
            ..Table::default()
        }
    }

    /// A template shaped like the real one: 35 tables, body paragraphs
    /// carrying placeholder tokens.
    fn fixture_template() -> Document {
        let properties = RunProperties::default();
        let mut blocks = vec![
            Block::Paragraph(Paragraph::from_text(
                "報告機構：rb_company_name（rb_reporting_year 年度）",
                &properties,
            )),
            Block::Paragraph(Paragraph::from_text(
                "範疇一占比 Table6.2_D5，數據品質 Table7_O2",
                &properties,
            )),
            Block::Paragraph(Paragraph::from_text(
                "小計 Table6.1_J4；說明：Table8_A23；空白欄【Table7_Q2】",
                &properties,
            )),
        ];
        for index in 0..35 {
            let columns = match index {
                0 | 1 => 2,
                16 => 4,
                23 | 24 => 3,
                25 => 7,
                34 => 9,
                _ => 1,
            };
            blocks.push(Block::Table(header_table(columns)));
        }
        Document::from_blocks(blocks)
    }

    fn cell_text(document: &Document, table: usize, row: usize, col: usize) -> String {
        document.table(table).unwrap().rows[row].cells[col].text()
    }

    #[test]
    fn full_pipeline_populates_template() {
        let workbook = write_fixture_workbook();
        let mut document = fixture_template();
        populate_document(&workbook, &mut document, &ReportConfig::default()).unwrap();

        // Basic info listing: three rows, the single blank row tolerated
        let basic = document.table(0).unwrap();
        assert_eq!(basic.rows.len(), 4);
        assert_eq!(cell_text(&document, 0, 1, 0), "公司名稱");
        assert_eq!(cell_text(&document, 0, 1, 1), "示範科技股份有限公司");
        assert_eq!(cell_text(&document, 0, 3, 0), "行業別");
        assert_eq!(cell_text(&document, 0, 3, 1), "製造業");

        // Scope-1 buckets fan out gas and source from the same rows; the
        // ghost row past the double blank never arrives
        let scope1 = document.table(1).unwrap();
        assert_eq!(scope1.rows.len(), 3);
        assert_eq!(cell_text(&document, 1, 1, 0), "CO2");
        assert_eq!(cell_text(&document, 1, 1, 1), "天然氣鍋爐");
        assert_eq!(cell_text(&document, 1, 2, 0), "CO2、CH4");
        assert_eq!(cell_text(&document, 1, 2, 1), "柴油發電機");

        // Category 3 bucket; category 5 stays header-only and gets the
        // sentinel instead
        assert_eq!(cell_text(&document, 3, 1, 0), "通勤車輛");
        assert_eq!(cell_text(&document, 5, 1, 0), sentinel::EMPTY_TABLE_SENTINEL);
        assert_ne!(cell_text(&document, 1, 1, 0), sentinel::EMPTY_TABLE_SENTINEL);

        // The full source inventory keeps every accepted row
        let inventory = document.table(16).unwrap();
        assert_eq!(inventory.rows.len(), 4);
        assert_eq!(cell_text(&document, 16, 1, 0), "範疇1");
        assert_eq!(cell_text(&document, 16, 1, 1), "CO2");
        assert_eq!(cell_text(&document, 16, 1, 2), "固定燃燒");
        assert_eq!(cell_text(&document, 16, 1, 3), "天然氣鍋爐");
        assert_eq!(cell_text(&document, 16, 3, 0), "類別3");
        assert_eq!(cell_text(&document, 16, 3, 1), "");

        // Activity data plus the synthetic free-text column
        assert_eq!(cell_text(&document, 23, 1, 0), "天然氣");
        assert_eq!(cell_text(&document, 23, 1, 1), "12345.6");
        assert_eq!(cell_text(&document, 23, 1, 2), "請輸入文字");
        assert_eq!(cell_text(&document, 24, 1, 0), "範疇1");
        assert_eq!(cell_text(&document, 24, 1, 1), "天然氣鍋爐");
        assert_eq!(cell_text(&document, 24, 2, 2), "請輸入文字");

        // Coefficients pivot to one row per source and gas at fixed
        // precision; a numeric string typed as text still gets formatted
        let factors = document.table(25).unwrap();
        assert_eq!(factors.rows.len(), 4);
        assert_eq!(cell_text(&document, 25, 1, 4), "CO2");
        assert_eq!(cell_text(&document, 25, 1, 5), "21.6220000000");
        assert_eq!(cell_text(&document, 25, 2, 4), "CH4");
        assert_eq!(cell_text(&document, 25, 2, 5), "0.0010000000");
        assert_eq!(cell_text(&document, 25, 3, 1), "柴油發電機");
        assert_eq!(cell_text(&document, 25, 3, 5), "3.1000000000");

        // Shared source merged vertically across the leading columns
        assert_eq!(factors.rows[1].cells[0].vertical_merge, Some(VerticalMerge::Restart));
        assert_eq!(factors.rows[2].cells[0].vertical_merge, Some(VerticalMerge::Continue));
        assert!(factors.rows[2].cells[0].is_blank());
        assert_eq!(factors.rows[1].cells[3].vertical_merge, Some(VerticalMerge::Restart));
        assert_eq!(factors.rows[3].cells[0].vertical_merge, None);

        // Uncertainty table spans nine columns
        assert_eq!(cell_text(&document, 34, 1, 0), "天然氣鍋爐");
        assert_eq!(cell_text(&document, 34, 1, 1), "-5%");
        assert_eq!(cell_text(&document, 34, 1, 8), "儀器校正");

        // Placeholder substitution across body paragraphs: the percent-
        // styled fraction renders scaled, absent cells render empty
        let paragraphs: Vec<String> = document
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph(paragraph) => Some(paragraph.text()),
                Block::Table(_) => None,
            })
            .collect();
        assert_eq!(paragraphs[0], "報告機構：示範科技股份有限公司（2025 年度）");
        assert_eq!(paragraphs[1], "範疇一占比 35.00%，數據品質 等級2");
        assert_eq!(paragraphs[2], "小計 123.45；說明：不確定性說明；空白欄【】");
    }

    #[test]
    fn missing_sheet_aborts_pipeline() {
        let workbook = write_workbook(&[("別的表", sheet_xml(&[text("A1", "x")]))]);
        let mut document = fixture_template();
        let error = populate_document(&workbook, &mut document, &ReportConfig::default()).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("表1.基本資料"), "{message}");
        assert!(message.contains("別的表"), "{message}");
    }

    #[test]
    fn incompatible_template_aborts_pipeline() {
        let workbook = write_fixture_workbook();
        // A template with too few tables for the catalog
        let mut document = Document::from_blocks(vec![Block::Table(header_table(2))]);
        let error = populate_document(&workbook, &mut document, &ReportConfig::default()).unwrap_err();
        assert!(error.to_string().contains("out of range"), "{error}");
    }

    #[test]
    fn missing_placeholder_sheet_blanks_its_whole_group() {
        // Only the basic-info sheet exists; the four summary-sheet groups
        // must degrade to empty replacements rather than fail
        let basic_info = sheet_xml(&[text("B5", "示範科技股份有限公司")]);
        let workbook = write_workbook(&[(SHEET_NAMES[0], basic_info)]);
        let formatter = CellFormatter::new(crate::config::PercentPolicy::default());

        let replacements = placeholder_replacements(&workbook, &formatter);

        let total: usize = catalog::PLACEHOLDER_GROUPS.iter().map(|group| group.tokens.len()).sum();
        assert_eq!(replacements.len(), total);
        let value = |token: &str| {
            replacements
                .iter()
                .find(|(candidate, _)| candidate == token)
                .map(|(_, value)| value.clone())
                .unwrap()
        };
        assert_eq!(value("rb_company_name"), "示範科技股份有限公司");
        assert_eq!(value("Table7_O2"), "");
        assert_eq!(value("Table6.2_D5"), "");
    }
}
