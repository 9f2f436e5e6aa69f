use crate::error::ReportError;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellKind;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// XML tag names for parsing the XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";          // Workbook relationship
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");      // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");        // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");      // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");             // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");       // Shared string table item
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");           // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");                      // Text content within strings
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr"); // Workbook properties
const TAG_SHEET: QName = QName(b"sheet");                 // Worksheet definition
const TAG_CELL: QName = QName(b"c");                      // Cell in worksheet
const TAG_INLINE_STRING: QName = QName(b"is");            // Inline string value
const TAG_VALUE: QName = QName(b"v");                     // Cell value content

/// Loads every sheet of an xlsx workbook into random-access `Sheet` grids.
///
/// Resolves shared strings eagerly and keeps each cell's number format as
/// the literal format code string, because the percent formatter needs to
/// inspect the code itself rather than a pre-classified type.
pub(super) fn load<RS: Read + Seek>(file_name: &str, reader: RS) -> Result<Vec<Sheet>, ReportError> {
    let mut zip = ZipArchive::new(reader)?;
    let (sheet_paths, is_1904) = load_workbook(&mut zip)?;
    let shared_strings = load_shared_strings(&mut zip)?;
    let formats = load_number_formats(&mut zip, is_1904)?;

    let mut sheets = Vec::<Sheet>::new();
    for (sheet_name, zip_path) in &sheet_paths {
        let mut sheet = Sheet::new(sheet_name);
        let mut reader = zip.xml_reader(zip_path)?
            .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;

        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellKind::default();
        let mut is_shared = false;
        let mut number_format = String::new();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_CELL => {
                if let Some((r, c)) = event.get_attribute_value("r")?
                    .and_then(|reference| reference_to_index(&reference))
                {
                    (row, col) = (r, c);
                } else {
                    col += 1;
                }
                is_shared = false;
                kind = event.get_attribute_value("t")?.map(|t| {
                    match t.as_ref() {
                        "inlineStr" | "str" | "d" => CellKind::Text,
                        "s" => {
                            is_shared = true;
                            CellKind::Text
                        }
                        "b" => CellKind::Boolean,
                        "e" => CellKind::Empty, // error literal, treated as absent
                        _ => CellKind::Number,
                    }
                }).unwrap_or(CellKind::Number);
                number_format.clear();
                if let Some(style_id) = event.get_attribute_value("s")? {
                    if !style_id.is_empty() {
                        let index = style_id.parse::<usize>()?;
                        if let Some((code, format_kind)) = formats.get(index) {
                            number_format.push_str(code);
                            if kind == CellKind::Number {
                                kind = *format_kind;
                            }
                        }
                    }
                }
                value.clear();
            }
            Event::Start(event) if kind != CellKind::Empty && event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if kind != CellKind::Empty && event.name() == TAG_VALUE => {
                let text = read_string_value(&mut reader, TAG_VALUE, true)?;
                value = if is_shared {
                    let index = text.trim().parse::<usize>()?;
                    shared_strings.get(index).cloned().unwrap_or_default()
                } else {
                    text
                };
            }
            Event::End(event) if kind != CellKind::Empty && event.name() == TAG_CELL => {
                if !value.is_empty() {
                    sheet.push(Cell {
                        row,
                        col,
                        kind,
                        raw: std::mem::take(&mut value),
                        number_format: number_format.to_owned(),
                    });
                }
                kind = CellKind::default();
            }
        });
        sheets.push(sheet);
    }

    log::debug!("Loaded {} sheets from '{}'", sheets.len(), file_name);
    Ok(sheets)
}

/// Loads worksheet relationships, mapping relationship ids to sheet XML paths.
fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<HashMap<String, String>, ReportError> {
    let path = "xl/_rels/workbook.xml.rels";
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships matter here
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Loads the workbook sheet list (name, zip path) and the date system flag.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), ReportError> {
    let relationships = load_relationships(zip)?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id.to_string()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the entire shared string table.
fn load_shared_strings<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<Vec<String>, ReportError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// Loads cell styles, resolving each style index to its number format code
/// and a pre-classified cell kind for numeric cells.
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<(String, CellKind)>, ReportError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, String>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if !custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = true;
        }
        Event::End(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMATS => {
            custom_formats_context = false;
        }
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), format.to_string());
            }
        }

        Event::Start(event) if !format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = true;
        }
        Event::End(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEXES => {
            format_indexes_context = false;
        }
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.get_attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });

    let formats = format_indexes
        .iter()
        .map(|id| {
            let code = custom_formats
                .get(id)
                .map(String::to_owned)
                .unwrap_or_else(|| builtin_format_code(id).to_owned());
            let kind = if code.is_empty() {
                CellKind::Number
            } else {
                CellKind::parse_number_format(&code, is_1904)
            };
            (code, kind)
        })
        .collect();
    Ok(formats)
}

/// Format codes for the builtin number format ids this report cares about:
/// percent, date and time formats. Everything else renders as General.
fn builtin_format_code(id: &str) -> &'static str {
    match id {
        "9" => "0%",
        "10" => "0.00%",
        "14" => "m/d/yy",
        "15" => "d-mmm-yy",
        "16" => "d-mmm",
        "17" => "mmm-yy",
        "18" => "h:mm AM/PM",
        "19" => "h:mm:ss AM/PM",
        "20" => "h:mm",
        "21" => "h:mm:ss",
        "22" => "m/d/yy h:mm",
        "45" => "mm:ss",
        "46" => "[h]:mm:ss",
        "47" => "mm:ss.0",
        _ => "",
    }
}

/// Normalizes a relationship target into a path inside the xlsx archive.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if path.starts_with("/xl/") {
        path[1..].to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads string content, skipping phonetic annotations and handling text,
/// CDATA and entity references.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, ReportError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
