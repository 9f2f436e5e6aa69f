use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// Types of cell data in the workbook.
/// Dates and times are Excel serial numbers; the epoch (1900 vs 1904) is a
/// workbook-level property baked into the kind at load time.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellKind {
    #[default]
    Empty,
    /// Boolean values (raw "1"/"0")
    Boolean,
    /// Plain numeric values
    Number,
    /// Date values stored as serial numbers from the 1900 epoch
    Date1900,
    /// Date values stored as serial numbers from the 1904 epoch
    Date1904,
    /// Date/time values stored as serial numbers from the 1900 epoch
    DateTime1900,
    /// Date/time values stored as serial numbers from the 1904 epoch
    DateTime1904,
    /// Time-of-day values stored as day fractions
    Time,
    /// String values (shared or inline)
    Text,
}

impl CellKind {
    /// Classifies a number format code as date, time, datetime or plain number.
    /// Scans the format skipping escaped characters, quoted literals and
    /// `[...]` sections so literal text never triggers date detection.
    pub(crate) fn parse_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_bracket && !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        if is_date && is_time {
            if is_1904 { Self::DateTime1904 } else { Self::DateTime1900 }
        } else if is_date {
            if is_1904 { Self::Date1904 } else { Self::Date1900 }
        } else if is_time {
            Self::Time
        } else {
            Self::Number
        }
    }
}

/// A single workbook cell: position, kind, raw lexical value, and the number
/// format code its style resolves to (empty string for General).
///
/// The raw value keeps the exact lexical form found in the file ("6.6",
/// "0.066") so stringified output matches the source byte-for-byte instead
/// of round-tripping through f64 formatting.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    /// Cell data kind
    pub(crate) kind: CellKind,
    /// Raw cell value as found in the file
    pub(crate) raw: String,
    /// Resolved number format code, "" for General
    pub(crate) number_format: String,
}

impl Cell {
    /// True if the cell holds no usable content.
    pub(crate) fn is_blank(&self) -> bool {
        self.kind == CellKind::Empty || self.raw.trim().is_empty()
    }

    /// True if the cell holds a numeric value.
    pub(crate) fn is_number(&self) -> bool {
        self.kind == CellKind::Number
    }

    /// Parses the raw value as a double.
    pub(crate) fn to_double(&self) -> Result<f64, std::num::ParseFloatError> {
        self.raw.trim().parse::<f64>()
    }
}

impl Display for Cell {
    /// Renders the cell for human consumption: serial dates become ISO
    /// strings, booleans become true/false, everything else is the raw
    /// lexical value. Unparseable serials fall back to the raw value.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self.kind {
            CellKind::Boolean => if self.raw == "1" { "true" } else { "false" }.to_owned(),
            CellKind::Date1900 => to_date_string(&self.raw, false).unwrap_or_else(|| self.raw.to_owned()),
            CellKind::Date1904 => to_date_string(&self.raw, true).unwrap_or_else(|| self.raw.to_owned()),
            CellKind::DateTime1900 => to_datetime_string(&self.raw, false).unwrap_or_else(|| self.raw.to_owned()),
            CellKind::DateTime1904 => to_datetime_string(&self.raw, true).unwrap_or_else(|| self.raw.to_owned()),
            CellKind::Time => to_time_string(&self.raw).unwrap_or_else(|| self.raw.to_owned()),
            _ => self.raw.to_owned(),
        };
        write!(f, "{}", value)
    }
}

/// Converts an Excel serial date to an ISO date string.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Option<String> {
    let days = value.trim().parse::<f64>().ok()?.trunc() as i64;
    let duration = Duration::days(
        days + if is_1904 {
            1462
        } else if days < 60 {
            1
        } else {
            0
        },
    );
    let date = NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate Literal") + duration;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Converts an Excel day fraction to an ISO time string.
fn to_time_string(value: &str) -> Option<String> {
    let factor = value.trim().parse::<f64>().ok()?;
    let mut hours = (factor.fract() * 86_400_000f64).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Some(timestamp)
}

/// Converts an Excel serial datetime to an ISO datetime string.
fn to_datetime_string(value: &str, is_1904: bool) -> Option<String> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Some(format!("{date} {time}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellKind, raw: &str) -> Cell {
        Cell {
            row: 0,
            col: 0,
            kind,
            raw: raw.to_owned(),
            number_format: String::new(),
        }
    }

    #[test]
    fn number_format_classification() {
        assert_eq!(CellKind::parse_number_format("0.00", false), CellKind::Number);
        assert_eq!(CellKind::parse_number_format("0.00%", false), CellKind::Number);
        assert_eq!(CellKind::parse_number_format("yyyy-mm-dd", false), CellKind::Date1900);
        assert_eq!(CellKind::parse_number_format("yyyy-mm-dd", true), CellKind::Date1904);
        assert_eq!(CellKind::parse_number_format("h:mm", false), CellKind::Time);
        assert_eq!(CellKind::parse_number_format("yyyy-mm-dd h:mm:ss", false), CellKind::DateTime1900);
        // Quoted literals and color sections must not count as date codes
        assert_eq!(CellKind::parse_number_format("0.0\"days\"", false), CellKind::Number);
        assert_eq!(CellKind::parse_number_format("[Red]0.0", false), CellKind::Number);
    }

    #[test]
    fn serial_date_rendering() {
        // 2021-06-15 is serial 44362 in the 1900 system
        assert_eq!(cell(CellKind::Date1900, "44362").to_string(), "2021-06-15");
        // Lotus bug region: serial 59 is 1900-02-28
        assert_eq!(cell(CellKind::Date1900, "59").to_string(), "1900-02-28");
        assert_eq!(cell(CellKind::Time, "0.5").to_string(), "12:00:00");
        assert_eq!(cell(CellKind::DateTime1900, "44362.25").to_string(), "2021-06-15 06:00:00");
    }

    #[test]
    fn blank_and_boolean() {
        assert!(cell(CellKind::Text, "   ").is_blank());
        assert!(!cell(CellKind::Text, "x").is_blank());
        assert_eq!(cell(CellKind::Boolean, "1").to_string(), "true");
        assert_eq!(cell(CellKind::Boolean, "0").to_string(), "false");
    }
}
