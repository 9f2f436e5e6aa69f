//! # Workbook Reading Module
//!
//! Reads the emissions workbook (.xlsx) into an in-memory model the
//! extraction engine can address randomly by (row, column). Sheet names are
//! an exact-match contract, CJK characters included; a miss reports the
//! available names for diagnostics.

pub(crate) mod cell;
pub(crate) mod reference;
pub(crate) mod sheet;
mod xlsx;

use crate::error::ReportError;
use crate::spreadsheet::sheet::Sheet;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use thiserror::Error;

/// Errors raised while opening or addressing a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Requested sheet name is absent from the workbook
    #[error("Sheet '{name}' not found in '{file_name}'; available sheets: {available}")]
    SheetNotFound {
        file_name: String,
        name: String,
        available: String,
    },

    /// Required ZIP entry is missing from the container
    #[error("Missing entry '{0}' in workbook file")]
    FileError(String),

    /// Workbook contains no sheets at all
    #[error("Spreadsheet '{0}' has no sheets")]
    SpreadsheetEmptyError(String),

    /// Cell reference string could not be parsed (e.g. "D5")
    #[error("Invalid cell reference '{0}'")]
    InvalidCellReferenceError(String),
}

/// An opened workbook: a named list of fully loaded sheets.
pub struct Workbook {
    /// Source file name, used in diagnostics
    pub file_name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    /// Opens and fully loads an xlsx workbook from a file path.
    pub fn open(file_name: &str) -> Result<Workbook, ReportError> {
        let file = File::open(file_name)?;
        Self::from_reader(file_name, BufReader::new(file))
    }

    /// Opens and fully loads an xlsx workbook from any seekable reader.
    pub fn from_reader<RS: Read + Seek>(file_name: &str, reader: RS) -> Result<Workbook, ReportError> {
        let sheets = xlsx::load(file_name, reader)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;
        }
        Ok(Workbook {
            file_name: file_name.to_owned(),
            sheets,
        })
    }

    /// Looks up a sheet by its exact name.
    /// Failure lists the available sheet names so a renamed sheet in the
    /// source workbook is diagnosable from the error alone.
    pub fn sheet(&self, name: &str) -> Result<&Sheet, SpreadsheetError> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name == name)
            .ok_or_else(|| SpreadsheetError::SheetNotFound {
                file_name: self.file_name.to_owned(),
                name: name.to_owned(),
                available: self.sheet_names().join(", "),
            })
    }

    /// Returns all sheet names in workbook order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}
