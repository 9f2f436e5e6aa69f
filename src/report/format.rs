use crate::config::PercentPolicy;
use crate::spreadsheet::cell::Cell;

/// Normalizes a single cell into its canonical display string.
///
/// Percent-formatted numbers are rendered with two decimals and a trailing
/// `%`; whether the stored number is first scaled by 100 is decided by the
/// explicit [`PercentPolicy`] rather than an implicit magnitude check.
#[derive(Copy, Clone, Debug)]
pub struct CellFormatter {
    policy: PercentPolicy,
}

impl CellFormatter {
    pub fn new(policy: PercentPolicy) -> Self {
        CellFormatter { policy }
    }

    /// Formats an optional cell: absent or blank cells become "".
    pub(crate) fn format(&self, cell: Option<&Cell>) -> String {
        let Some(cell) = cell else {
            return String::new();
        };
        if cell.is_blank() {
            return String::new();
        }
        if cell.is_number() && format_has_percent(&cell.number_format) {
            if let Ok(value) = cell.to_double() {
                let scaled = if self.policy.is_fraction(value) { value * 100.0 } else { value };
                return format!("{scaled:.2}%");
            }
        }
        cell.to_string()
    }
}

/// True if the number format code carries a percent marker outside quoted
/// literals, `[...]` sections and escapes.
fn format_has_percent(format: &str) -> bool {
    let mut is_escaped = false;
    let mut is_literal = false;
    let mut is_bracket = false;
    for character in format.chars() {
        match character {
            _ if is_escaped => is_escaped = false,
            '_' | '\\' if !is_escaped => is_escaped = true,

            '"' if is_literal => is_literal = false,
            '"' if !is_literal && !is_bracket => is_literal = true,

            ']' if is_bracket => is_bracket = false,
            '[' if !is_bracket && !is_literal => is_bracket = true,
            _ if is_literal || is_bracket => (),

            '%' => return true,
            _ => (),
        }
    }
    false
}
