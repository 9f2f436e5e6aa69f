use crate::config::ReportConfig;
use crate::document::Document;
use crate::document::Paragraph;
use crate::document::Run;
use crate::document::RunProperties;
use crate::document::TableCell;

/// Replaces literal placeholder tokens across every paragraph and table
/// cell of the document.
///
/// Replacements apply in list order and several tokens may hit the same
/// paragraph. A rewritten paragraph is rebuilt as one freshly styled run:
/// run-level formatting variation inside it is deliberately dropped in
/// exchange for consistent font/size/east-asian styling of the result.
///
/// Body paragraphs match independently, but a table cell matches on its
/// concatenated text so a token spanning the cell's paragraph breaks is
/// still found; a hit rewrites the whole cell as one trimmed paragraph.
pub fn substitute(document: &mut Document, replacements: &[(String, String)], config: &ReportConfig) {
    let properties = config.run_properties();
    for paragraph in document.paragraphs_mut() {
        substitute_paragraph(paragraph, replacements, &properties);
    }
    for table in document.tables_mut() {
        for row in &mut table.rows {
            for cell in &mut row.cells {
                substitute_cell(cell, replacements, &properties);
            }
        }
    }
}

fn substitute_paragraph(paragraph: &mut Paragraph, replacements: &[(String, String)], properties: &RunProperties) {
    let mut text = paragraph.text();
    let mut replaced = false;
    for (token, value) in replacements {
        if text.contains(token.as_str()) {
            text = text.replace(token.as_str(), value);
            replaced = true;
        }
    }
    if replaced {
        paragraph.runs = vec![Run {
            text,
            properties: properties.clone(),
        }];
    }
}

fn substitute_cell(cell: &mut TableCell, replacements: &[(String, String)], properties: &RunProperties) {
    let mut text = cell.text();
    let mut replaced = false;
    for (token, value) in replacements {
        if text.contains(token.as_str()) {
            text = text.replace(token.as_str(), value);
            replaced = true;
        }
    }
    if replaced {
        cell.set_text(text.trim(), properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Block;
    use crate::document::Table;
    use crate::document::TableCell;
    use crate::document::TableRow;

    fn pair(token: &str, value: &str) -> (String, String) {
        (token.to_owned(), value.to_owned())
    }

    #[test]
    fn token_is_replaced_with_no_residue() {
        let mut document = Document::from_blocks(vec![Block::Paragraph(Paragraph::from_text(
            "Value: Table6.2_D5 units",
            &RunProperties::default(),
        ))]);
        substitute(&mut document, &[pair("Table6.2_D5", "42.1")], &ReportConfig::default());

        let Block::Paragraph(paragraph) = &document.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.text(), "Value: 42.1 units");
    }

    #[test]
    fn token_split_across_runs_is_still_replaced() {
        let properties = RunProperties::default();
        let paragraph = Paragraph {
            runs: vec![
                Run { text: "合计：Table5".to_owned(), properties: properties.clone() },
                Run { text: "_C2 吨".to_owned(), properties },
            ],
        };
        let mut document = Document::from_blocks(vec![Block::Paragraph(paragraph)]);
        let config = ReportConfig::default();
        substitute(&mut document, &[pair("Table5_C2", "270.3")], &config);

        let Block::Paragraph(paragraph) = &document.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.text(), "合计：270.3 吨");
        // Rebuilt as a single freshly styled run
        assert_eq!(paragraph.runs.len(), 1);
        assert_eq!(paragraph.runs[0].properties, config.run_properties());
    }

    #[test]
    fn multiple_tokens_in_one_paragraph() {
        let mut document = Document::from_blocks(vec![Block::Paragraph(Paragraph::from_text(
            "{组织名称}（{报告年度}）",
            &RunProperties::default(),
        ))]);
        let replacements = vec![pair("{组织名称}", "示例公司"), pair("{报告年度}", "2024")];
        substitute(&mut document, &replacements, &ReportConfig::default());

        let Block::Paragraph(paragraph) = &document.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.text(), "示例公司（2024）");
    }

    #[test]
    fn untouched_paragraphs_keep_their_runs() {
        let original = Paragraph {
            runs: vec![
                Run { text: "无".to_owned(), properties: RunProperties { size: Some(28), ..RunProperties::default() } },
                Run { text: "占位符".to_owned(), properties: RunProperties::default() },
            ],
        };
        let mut document = Document::from_blocks(vec![Block::Paragraph(original)]);
        substitute(&mut document, &[pair("不存在", "x")], &ReportConfig::default());

        let Block::Paragraph(paragraph) = &document.blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(paragraph.runs.len(), 2);
        assert_eq!(paragraph.runs[0].properties.size, Some(28));
    }

    #[test]
    fn table_cells_are_substituted_too() {
        let mut table = Table::default();
        let mut cell = TableCell::blank();
        cell.set_text("Table5_C6", &RunProperties::default());
        table.rows.push(TableRow { cells: vec![cell] });

        let mut document = Document::from_blocks(vec![Block::Table(table)]);
        substitute(&mut document, &[pair("Table5_C6", "100.00%")], &ReportConfig::default());

        let table = document.table(0).unwrap();
        assert_eq!(table.rows[0].cells[0].text(), "100.00%");
    }

    #[test]
    fn token_split_across_cell_paragraphs_is_still_replaced() {
        let properties = RunProperties::default();
        let mut cell = TableCell::blank();
        cell.paragraphs = vec![
            Paragraph::from_text("Table6.1_", &properties),
            Paragraph::from_text("J4", &properties),
        ];
        let mut table = Table::default();
        table.rows.push(TableRow { cells: vec![cell] });

        let mut document = Document::from_blocks(vec![Block::Table(table)]);
        substitute(&mut document, &[pair("Table6.1_J4", "123.4")], &ReportConfig::default());

        let cell = &document.table(0).unwrap().rows[0].cells[0];
        assert_eq!(cell.text(), "123.4");
        assert_eq!(cell.paragraphs.len(), 1);
    }
}
