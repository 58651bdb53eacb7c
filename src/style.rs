//! Style classification for rendered tables.
//!
//! These functions only label rows and cells; turning a token into colour or
//! weight is up to whoever draws the table.

use crate::config::HighlightRuleCfg;
use crate::types::{DeltaStyle, HighlightToken, PivotMatrix};
use crate::util::contains_folded;

/// Ordered brand patterns mapped to highlight tokens.
#[derive(Debug, Clone, Default)]
pub struct HighlightRule {
    rules: Vec<HighlightRuleCfg>,
}

impl HighlightRule {
    pub fn new(rules: Vec<HighlightRuleCfg>) -> Self {
        Self { rules }
    }

    /// Token of the first pattern contained in `row_key`, ignoring case.
    pub fn classify(&self, row_key: &str) -> HighlightToken {
        self.rules
            .iter()
            .find(|r| contains_folded(row_key, &r.pattern))
            .map_or(HighlightToken::None, |r| r.token)
    }

    /// One token per matrix row, classified by the row's own key.
    pub fn per_row(&self, matrix: &PivotMatrix) -> Vec<HighlightToken> {
        matrix.rows.iter().map(|r| self.classify(&r.key)).collect()
    }

    /// Every row gets the token of `brand`; used when the whole table belongs
    /// to one brand.
    pub fn uniform(&self, matrix: &PivotMatrix, brand: &str) -> Vec<HighlightToken> {
        vec![self.classify(brand); matrix.rows.len()]
    }
}

pub fn delta_style(delta: Option<f64>) -> DeltaStyle {
    match delta {
        None => DeltaStyle::Absent,
        Some(v) if v.abs() < 1e-9 => DeltaStyle::Flat,
        Some(v) if v > 0.0 => DeltaStyle::Rise,
        Some(_) => DeltaStyle::Fall,
    }
}
