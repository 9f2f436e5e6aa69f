//! # GHG Report Builder
//!
//! Builds a greenhouse-gas emissions report by extracting categorized
//! records from a multi-sheet xlsx workbook and populating a fixed-layout
//! docx template.
//!
//! ## Features
//!
//! - Reads xlsx workbooks directly (shared strings, number formats, both
//!   date systems), keeping each cell's lexical value intact.
//! - Scans sheets under declarative layouts: record boundary inference,
//!   blank-separator tolerance, scope bucketing, synthetic fields.
//! - Pivots the wide per-gas coefficient sheet into long-form rows.
//! - Populates, grows and vertically merges template tables, substitutes
//!   placeholder tokens and marks empty tables with a sentinel.
//! - One in-memory document mutated throughout, saved exactly once.
//!
//! ```no_run
//! use ghg_report::{build_report, ReportConfig};
//!
//! build_report("data.xlsx", "template.docx", "report.docx", &ReportConfig::default())?;
//! # Ok::<(), ghg_report::ReportError>(())
//! ```

mod config;
mod document;
mod error;
mod helpers;
mod report;
mod spreadsheet;

pub use crate::config::PercentPolicy;
pub use crate::config::ReportConfig;
pub use crate::document::docx;
pub use crate::document::Document;
pub use crate::document::DocumentError;
pub use crate::error::ReportError;
pub use crate::report::build_report;
pub use crate::report::extract::RecordSet;
pub use crate::report::format::CellFormatter;
pub use crate::report::populate_document;
pub use crate::spreadsheet::SpreadsheetError;
pub use crate::spreadsheet::Workbook;
