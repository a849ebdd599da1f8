//! ivtables-core: instrumental-variable regression tables
//!
//! This crate fits one two-stage least squares regression per outcome and
//! renders the instrumented coefficient of each fit as an HTML table cell
//! with significance stars.

pub mod data;
pub mod errors;
pub mod format;
pub mod models;
pub mod runner;
pub mod table;
pub mod types;

pub use data::DataFrame;
pub use errors::{StatsError, StatsResult};
pub use format::{
    format_estimates, format_estimates_with, significance_stars, FormatOptions,
    StarThresholds,
};
pub use runner::{fit_outcomes, run_iv_regressions, run_iv_regressions_with, IvSpec, OutcomeFit};
pub use table::{df_to_table, display_table, ResultTable, TableSink};
pub use types::*;
