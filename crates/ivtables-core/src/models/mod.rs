//! Regression model implementations

mod iv;

pub use iv::fit_iv2sls;
