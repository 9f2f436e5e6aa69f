//! Loads and saves the document model as a .docx container.
//!
//! Only the WordprocessingML subset this system mutates is modelled
//! (paragraphs, runs with fonts/size, tables with widths, wrap and vertical
//! merge). Every other container entry, and the template's section
//! properties, pass through save byte-for-byte.

use crate::document::Block;
use crate::document::Document;
use crate::document::DocumentError;
use crate::document::Paragraph;
use crate::document::Run;
use crate::document::Table;
use crate::document::TableCell;
use crate::document::TableRow;
use crate::document::VerticalMerge;
use crate::error::ReportError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::match_xml_events;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;
use quick_xml::Writer;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;

const DOCUMENT_PART: &str = "word/document.xml";
const MAIN_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Loads a document template from a file path.
pub fn load_path(file_name: &str) -> Result<Document, ReportError> {
    let file = File::open(file_name)?;
    load(BufReader::new(file))
}

/// Loads a document template from any seekable reader.
pub fn load<RS: Read + Seek>(reader: RS) -> Result<Document, ReportError> {
    let mut zip = ZipArchive::new(reader)?;
    let mut entries = Vec::<(String, Vec<u8>)>::new();
    let mut body = None::<Vec<u8>>;
    for index in 0..zip.len() {
        let mut file = zip.by_index(index)?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_owned();
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        if name == DOCUMENT_PART {
            body = Some(bytes);
        } else {
            entries.push((name, bytes));
        }
    }
    let body = body.ok_or_else(|| DocumentError::FileError(DOCUMENT_PART.to_owned()))?;

    let (blocks, section_properties) = parse_body(&body)?;
    Ok(Document {
        blocks,
        section_properties,
        entries,
    })
}

/// Saves the document back into a .docx container at a file path.
pub fn save_path(document: &Document, file_name: &str) -> Result<(), ReportError> {
    let file = File::create(file_name)?;
    save(document, file)
}

/// Saves the document back into a .docx container.
/// word/document.xml is regenerated from the model; all other entries are
/// copied through unchanged.
pub fn save<W: Write + Seek>(document: &Document, writer: W) -> Result<(), ReportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file(DOCUMENT_PART, options)?;
    zip.write_all(&write_body(document)?)?;
    for (name, bytes) in &document.entries {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(bytes)?;
    }
    zip.finish()?;
    Ok(())
}

/// Parses the body of word/document.xml into blocks plus raw section properties.
fn parse_body(body: &[u8]) -> Result<(Vec<Block>, Vec<u8>), ReportError> {
    let mut reader = XmlReader::new(body);
    let mut blocks = Vec::<Block>::new();
    let mut section_properties = Vec::<u8>::new();

    let mut table = None::<Table>;
    let mut row = None::<TableRow>;
    let mut cell = None::<TableCell>;
    let mut paragraph = None::<Paragraph>;
    let mut run = None::<Run>;
    let mut in_text = false;
    // Depth of nested tables being skipped; the template contains none,
    // so anything nested is dropped rather than flattened.
    let mut skipped_tables = 0usize;

    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == b"tbl" => {
            if table.is_some() || skipped_tables > 0 {
                skipped_tables += 1;
            } else {
                table = Some(Table::default());
            }
        }
        Event::End(event) if event.local_name().as_ref() == b"tbl" => {
            if skipped_tables > 0 {
                skipped_tables -= 1;
            } else if let Some(table) = table.take() {
                blocks.push(Block::Table(table));
            }
        }
        _ if skipped_tables > 0 => (),

        Event::Start(event) if event.local_name().as_ref() == b"sectPr" && table.is_none() && paragraph.is_none() => {
            // Own the start tag first; echoing the subtree re-enters the reader
            let start = event.to_owned();
            echo_element(&mut reader, &start, &mut section_properties)?;
        }

        Event::Start(event) if event.local_name().as_ref() == b"tblLayout" => {
            if let (Some(table), Some(kind)) = (&mut table, event.get_attribute_value("w:type")?) {
                table.fixed_layout = kind == "fixed";
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"gridCol" => {
            if let (Some(table), Some(width)) = (&mut table, event.parse_attribute_value::<u32>("w:w")?) {
                table.grid.push(width);
            }
        }

        Event::Start(event) if event.local_name().as_ref() == b"tr" && table.is_some() => {
            row = Some(TableRow::default());
        }
        Event::End(event) if event.local_name().as_ref() == b"tr" => {
            if let (Some(table), Some(row)) = (&mut table, row.take()) {
                table.rows.push(row);
            }
        }

        Event::Start(event) if event.local_name().as_ref() == b"tc" && row.is_some() => {
            cell = Some(TableCell::default());
        }
        Event::End(event) if event.local_name().as_ref() == b"tc" => {
            if let (Some(row), Some(cell)) = (&mut row, cell.take()) {
                row.cells.push(cell);
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"tcW" => {
            if let Some(cell) = &mut cell {
                cell.width = event.parse_attribute_value::<u32>("w:w")?;
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"noWrap" => {
            if let Some(cell) = &mut cell {
                cell.no_wrap = event.get_attribute_value("w:val")?
                    .map(|value| value != "0" && value != "false")
                    .unwrap_or(true);
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"vMerge" => {
            if let Some(cell) = &mut cell {
                cell.vertical_merge = Some(match event.get_attribute_value("w:val")?.as_deref() {
                    Some("restart") => VerticalMerge::Restart,
                    _ => VerticalMerge::Continue,
                });
            }
        }

        Event::Start(event) if event.local_name().as_ref() == b"p" => {
            paragraph = Some(Paragraph::default());
        }
        Event::End(event) if event.local_name().as_ref() == b"p" => {
            if let Some(paragraph) = paragraph.take() {
                if let Some(cell) = &mut cell {
                    cell.paragraphs.push(paragraph);
                } else if table.is_none() {
                    blocks.push(Block::Paragraph(paragraph));
                }
            }
        }

        Event::Start(event) if event.local_name().as_ref() == b"r" && paragraph.is_some() => {
            run = Some(Run::default());
        }
        Event::End(event) if event.local_name().as_ref() == b"r" => {
            if let (Some(paragraph), Some(run)) = (&mut paragraph, run.take()) {
                paragraph.runs.push(run);
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"rFonts" => {
            if let Some(run) = &mut run {
                run.properties.font = event.get_attribute_value("w:ascii")?.map(|value| value.to_string());
                run.properties.east_asian = event.get_attribute_value("w:eastAsia")?.map(|value| value.to_string());
            }
        }
        Event::Start(event) if event.local_name().as_ref() == b"sz" => {
            if let Some(run) = &mut run {
                run.properties.size = event.parse_attribute_value::<u32>("w:val")?;
            }
        }

        Event::Start(event) if event.local_name().as_ref() == b"t" && run.is_some() => {
            in_text = true;
        }
        Event::End(event) if event.local_name().as_ref() == b"t" => {
            in_text = false;
        }
        Event::Text(event) if in_text => {
            if let Some(run) = &mut run {
                run.text.push_str(&event.xml_content()?);
            }
        }
        Event::CData(event) if in_text => {
            if let Some(run) = &mut run {
                run.text.push_str(&event.xml_content()?);
            }
        }
        Event::GeneralRef(event) if in_text => {
            if let Some(run) = &mut run {
                run.text.push_bytes_ref(&event)?;
            }
        }
    });

    Ok((blocks, section_properties))
}

/// Copies an element and its entire subtree verbatim into `target`.
fn echo_element<R: std::io::BufRead>(
    reader: &mut XmlReader<R>,
    start: &BytesStart<'_>,
    target: &mut Vec<u8>,
) -> Result<(), ReportError> {
    let end_name = start.name().as_ref().to_owned();
    let mut writer = Writer::new(std::mem::take(target));
    writer.write_event(Event::Start(start.to_owned()))?;
    let mut depth = 1usize;
    while let Some(event) = reader.next()? {
        match &event {
            Event::Eof => break,
            Event::Start(inner) if inner.name().as_ref() == end_name => depth += 1,
            Event::End(inner) if inner.name().as_ref() == end_name => depth -= 1,
            _ => (),
        }
        writer.write_event(event)?;
        if depth == 0 {
            break;
        }
    }
    *target = writer.into_inner();
    Ok(())
}

/// Serializes the document model into word/document.xml bytes.
fn write_body(document: &Document) -> Result<Vec<u8>, ReportError> {
    let mut writer = Writer::new(Vec::<u8>::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

    let mut root = BytesStart::new("w:document");
    root.push_attribute(("xmlns:w", MAIN_NAMESPACE));
    writer.write_event(Event::Start(root))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(&mut writer, paragraph)?,
            Block::Table(table) => write_table(&mut writer, table)?,
        }
    }
    if !document.section_properties.is_empty() {
        writer.get_mut().write_all(&document.section_properties)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(writer.into_inner())
}

fn write_paragraph<W: Write>(writer: &mut Writer<W>, paragraph: &Paragraph) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new("w:p")))?;
    for run in &paragraph.runs {
        write_run(writer, run)?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_run<W: Write>(writer: &mut Writer<W>, run: &Run) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new("w:r")))?;

    let properties = &run.properties;
    if properties != &crate::document::RunProperties::default() {
        writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
        if properties.font.is_some() || properties.east_asian.is_some() {
            let mut fonts = BytesStart::new("w:rFonts");
            if let Some(font) = &properties.font {
                fonts.push_attribute(("w:ascii", font.as_str()));
                fonts.push_attribute(("w:hAnsi", font.as_str()));
            }
            if let Some(east_asian) = &properties.east_asian {
                fonts.push_attribute(("w:eastAsia", east_asian.as_str()));
            }
            writer.write_event(Event::Empty(fonts))?;
        }
        if let Some(size) = properties.size {
            let value = size.to_string();
            let mut sz = BytesStart::new("w:sz");
            sz.push_attribute(("w:val", value.as_str()));
            writer.write_event(Event::Empty(sz))?;
            let mut sz_cs = BytesStart::new("w:szCs");
            sz_cs.push_attribute(("w:val", value.as_str()));
            writer.write_event(Event::Empty(sz_cs))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    }

    let mut text = BytesStart::new("w:t");
    text.push_attribute(("xml:space", "preserve"));
    writer.write_event(Event::Start(text))?;
    writer.write_event(Event::Text(BytesText::new(&run.text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))?;

    writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    Ok(())
}

fn write_table<W: Write>(writer: &mut Writer<W>, table: &Table) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;

    writer.write_event(Event::Start(BytesStart::new("w:tblPr")))?;
    if table.fixed_layout {
        let mut layout = BytesStart::new("w:tblLayout");
        layout.push_attribute(("w:type", "fixed"));
        writer.write_event(Event::Empty(layout))?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:tblPr")))?;

    if !table.grid.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
        for width in &table.grid {
            let value = width.to_string();
            let mut grid_col = BytesStart::new("w:gridCol");
            grid_col.push_attribute(("w:w", value.as_str()));
            writer.write_event(Event::Empty(grid_col))?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
    }

    for row in &table.rows {
        writer.write_event(Event::Start(BytesStart::new("w:tr")))?;
        for cell in &row.cells {
            write_cell(writer, cell)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
    Ok(())
}

fn write_cell<W: Write>(writer: &mut Writer<W>, cell: &TableCell) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new("w:tc")))?;

    writer.write_event(Event::Start(BytesStart::new("w:tcPr")))?;
    if let Some(width) = cell.width {
        let value = width.to_string();
        let mut tc_w = BytesStart::new("w:tcW");
        tc_w.push_attribute(("w:w", value.as_str()));
        tc_w.push_attribute(("w:type", "dxa"));
        writer.write_event(Event::Empty(tc_w))?;
    }
    if cell.no_wrap {
        writer.write_event(Event::Empty(BytesStart::new("w:noWrap")))?;
    }
    if let Some(merge) = cell.vertical_merge {
        let mut v_merge = BytesStart::new("w:vMerge");
        v_merge.push_attribute(("w:val", match merge {
            VerticalMerge::Restart => "restart",
            VerticalMerge::Continue => "continue",
        }));
        writer.write_event(Event::Empty(v_merge))?;
    }
    writer.write_event(Event::End(BytesEnd::new("w:tcPr")))?;

    // Word requires at least one paragraph per cell
    if cell.paragraphs.is_empty() {
        write_paragraph(writer, &Paragraph::default())?;
    }
    for paragraph in &cell.paragraphs {
        write_paragraph(writer, paragraph)?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
    Ok(())
}
