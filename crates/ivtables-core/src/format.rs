//! Estimate cells with significance stars

use crate::errors::StatsResult;
use crate::types::IvFitResult;

/// p-value cutoffs for one, two and three stars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarThresholds {
    pub one: f64,
    pub two: f64,
    pub three: f64,
}

impl Default for StarThresholds {
    fn default() -> Self {
        Self {
            one: 0.05,
            two: 0.01,
            three: 0.001,
        }
    }
}

impl StarThresholds {
    /// Stars for `p_value`. Comparisons are strict and NaN earns none.
    pub fn stars(&self, p_value: f64) -> &'static str {
        if p_value < self.three {
            "***"
        } else if p_value < self.two {
            "**"
        } else if p_value < self.one {
            "*"
        } else {
            ""
        }
    }
}

/// Layout of a formatted estimate cell
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Digits after the decimal point for estimate and standard error
    pub decimals: usize,
    /// Placed between the estimate and the parenthesized standard error
    pub separator: String,
    pub thresholds: StarThresholds,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            separator: "<br>".to_string(),
            thresholds: StarThresholds::default(),
        }
    }
}

/// Stars at the conventional 0.05 / 0.01 / 0.001 levels
pub fn significance_stars(p_value: f64) -> &'static str {
    StarThresholds::default().stars(p_value)
}

/// Format `param` of `result` as `"{estimate}{stars}<br>({std_error})"` to two decimals
pub fn format_estimates(result: &IvFitResult, param: &str) -> StatsResult<String> {
    format_estimates_with(result, param, &FormatOptions::default())
}

pub fn format_estimates_with(
    result: &IvFitResult,
    param: &str,
    options: &FormatOptions,
) -> StatsResult<String> {
    let coef = result.coefficient(param)?;
    let stars = options.thresholds.stars(coef.p_value);
    Ok(format!(
        "{est}{stars}{sep}({se})",
        est = fixed(coef.estimate, options.decimals),
        se = fixed(coef.std_error, options.decimals),
        sep = options.separator,
    ))
}

/// Fixed-point text; NaN prints as `nan`
fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.decimals$}")
    }
}
