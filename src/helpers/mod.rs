//! Shared XML and ZIP plumbing used by both the xlsx reader and the docx adapter.

pub(crate) mod xml;
pub(crate) mod zip;
