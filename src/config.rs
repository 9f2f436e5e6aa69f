use crate::document::RunProperties;

/// Policy for deciding whether a percent-formatted number is stored as a
/// fraction (to be scaled by 100) or as an already-scaled percentage.
///
/// Upstream workbooks are inconsistent: the same column may hold `0.066`
/// (a fraction) in one file and `6.6` (a percentage) in another. A value
/// inside the policy's fraction range is scaled by 100; anything outside
/// is rendered as-is with two decimals.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PercentPolicy {
    /// Fraction range is [-1, 1].
    #[default]
    SymmetricFraction,
    /// Fraction range is [0, 1]; negative values are never rescaled.
    PositiveFraction,
}

impl PercentPolicy {
    /// Returns true if the value should be multiplied by 100 before rendering.
    pub fn is_fraction(&self, value: f64) -> bool {
        match self {
            Self::SymmetricFraction => (-1.0..=1.0).contains(&value),
            Self::PositiveFraction => (0.0..=1.0).contains(&value),
        }
    }
}

/// Immutable configuration for one report generation run.
///
/// These knobs are constants for a single invocation and are threaded
/// explicitly into the formatting and population code instead of living in
/// ambient global state.
#[derive(Clone, Debug)]
pub struct ReportConfig {
    /// Font applied to east-asian glyphs in rewritten runs.
    pub east_asian_font: String,
    /// Font applied to latin glyphs in rewritten runs.
    pub default_font: String,
    /// Run size in half-points (24 = 12pt).
    pub default_font_size: u32,
    /// Column width in twips applied to populated tables.
    pub default_column_width: u32,
    /// Percent rendering policy for percent-formatted cells.
    pub percent_policy: PercentPolicy,
}

impl ReportConfig {
    /// Run formatting applied to every run this system writes.
    pub fn run_properties(&self) -> RunProperties {
        RunProperties {
            font: Some(self.default_font.to_owned()),
            east_asian: Some(self.east_asian_font.to_owned()),
            size: Some(self.default_font_size),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            east_asian_font: "標楷體".to_owned(),
            default_font: "Times New Roman".to_owned(),
            default_font_size: 24,
            default_column_width: 2000,
            percent_policy: PercentPolicy::default(),
        }
    }
}
