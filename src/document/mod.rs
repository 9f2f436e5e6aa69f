//! # Document Model Module
//!
//! In-memory model of the report template: an ordered body of paragraphs and
//! tables addressed by zero-based position. The population engine grows and
//! mutates this model; `docx` loads it from and saves it back to a .docx
//! container.

pub mod docx;

use thiserror::Error;

/// Errors raised while addressing the document model.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Catalog references a table position the template does not have
    #[error("Table index {index} out of range; document has {count} tables")]
    TableIndexOutOfRange { index: usize, count: usize },

    /// Required ZIP entry is missing from the container
    #[error("Missing entry '{0}' in document file")]
    FileError(String),
}

/// Character-level formatting applied to a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunProperties {
    /// Latin glyph font
    pub font: Option<String>,
    /// East-asian glyph font
    pub east_asian: Option<String>,
    /// Size in half-points
    pub size: Option<u32>,
}

/// A contiguous stretch of identically formatted text.
#[derive(Clone, Debug, Default)]
pub struct Run {
    pub text: String,
    pub properties: RunProperties,
}

/// A paragraph: an ordered list of runs.
#[derive(Clone, Debug, Default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Builds a paragraph holding one styled run.
    pub fn from_text(text: &str, properties: &RunProperties) -> Self {
        Paragraph {
            runs: vec![Run {
                text: text.to_owned(),
                properties: properties.clone(),
            }],
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }
}

/// Vertical merge state of a table cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VerticalMerge {
    /// First cell of a merge group
    Restart,
    /// Continuation cell, rendered as part of the group above
    Continue,
}

/// A table cell: paragraphs plus the layout properties this system touches.
#[derive(Clone, Debug, Default)]
pub struct TableCell {
    pub paragraphs: Vec<Paragraph>,
    /// Preferred width in twips
    pub width: Option<u32>,
    /// Suppresses text wrapping when set
    pub no_wrap: bool,
    pub vertical_merge: Option<VerticalMerge>,
}

impl TableCell {
    /// A blank cell holding one empty paragraph, as Word requires.
    pub fn blank() -> Self {
        TableCell {
            paragraphs: vec![Paragraph::default()],
            ..TableCell::default()
        }
    }

    /// Concatenated text of all paragraphs.
    pub fn text(&self) -> String {
        self.paragraphs.iter().map(Paragraph::text).collect()
    }

    /// True if the cell contains only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text().trim().is_empty()
    }

    /// Replaces all content with a single styled paragraph.
    pub fn set_text(&mut self, text: &str, properties: &RunProperties) {
        self.paragraphs.clear();
        self.paragraphs.push(Paragraph::from_text(text, properties));
    }
}

/// A table row.
#[derive(Clone, Debug, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// A table: rows, column grid widths, and the fixed-layout flag.
/// Rows and cells are only ever appended, never removed.
#[derive(Clone, Debug, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
    /// Declared column widths in twips
    pub grid: Vec<u32>,
    /// Disables the word processor's auto-fit when set
    pub fixed_layout: bool,
}

impl Table {
    /// Number of columns, taken from the first row (grid as fallback).
    pub fn column_count(&self) -> usize {
        self.rows
            .first()
            .map(|row| row.cells.len())
            .unwrap_or(self.grid.len())
    }

    /// Appends blank rows until the table has at least `count` rows.
    pub fn grow_to(&mut self, count: usize) {
        let columns = self.column_count();
        while self.rows.len() < count {
            let cells = (0..columns).map(|_| TableCell::blank()).collect();
            self.rows.push(TableRow { cells });
        }
    }

    /// Mutable cell access by 0-based (row, col).
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|row| row.cells.get_mut(col))
    }
}

/// One body-level element, in document order.
#[derive(Clone, Debug)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// The report document: body blocks plus the untouched container entries
/// (styles, content types, ...) carried through save verbatim.
pub struct Document {
    pub blocks: Vec<Block>,
    /// Raw section properties from the template body, preserved on save
    pub(crate) section_properties: Vec<u8>,
    /// Container entries other than word/document.xml, copied through save
    pub(crate) entries: Vec<(String, Vec<u8>)>,
}

impl Document {
    /// Builds an in-memory document from body blocks alone (tests, previews).
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Document {
            blocks,
            section_properties: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Number of tables in the body.
    pub fn table_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| matches!(block, Block::Table(_)))
            .count()
    }

    /// Table at a zero-based position among the body's tables.
    pub fn table(&self, index: usize) -> Result<&Table, DocumentError> {
        let count = self.table_count();
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                Block::Paragraph(_) => None,
            })
            .nth(index)
            .ok_or(DocumentError::TableIndexOutOfRange { index, count })
    }

    /// Mutable table access by zero-based position among the body's tables.
    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table, DocumentError> {
        let count = self.table_count();
        self.blocks
            .iter_mut()
            .filter_map(|block| match block {
                Block::Table(table) => Some(table),
                Block::Paragraph(_) => None,
            })
            .nth(index)
            .ok_or(DocumentError::TableIndexOutOfRange { index, count })
    }

    /// All body-level paragraphs, mutable.
    pub(crate) fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            Block::Table(_) => None,
        })
    }

    /// All tables, mutable.
    pub(crate) fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.blocks.iter_mut().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        })
    }
}
