//! One IV regression per outcome over a shared specification

use serde::Serialize;
use tracing::{debug, info};

use crate::data::DataFrame;
use crate::errors::StatsResult;
use crate::format::{format_estimates_with, FormatOptions};
use crate::models::fit_iv2sls;
use crate::types::{IvFitResult, IvOptions, Regressor};

/// Columns that make up a set of per-outcome IV regressions
#[derive(Debug, Clone, Default)]
pub struct IvSpec {
    pub outcomes: Vec<String>,
    /// Exogenous regressors, constant included if wanted
    pub covariates: Vec<String>,
    /// The endogenous regressor whose coefficient is reported
    pub instrumented: String,
    /// Excluded instruments for `instrumented`
    pub instruments: Vec<String>,
}

impl IvSpec {
    pub fn new<S: AsRef<str>>(
        outcomes: &[S],
        covariates: &[S],
        instrumented: &str,
        instruments: &[S],
    ) -> Self {
        let owned =
            |v: &[S]| -> Vec<String> { v.iter().map(|s| s.as_ref().to_string()).collect() };
        Self {
            outcomes: owned(outcomes),
            covariates: owned(covariates),
            instrumented: instrumented.to_string(),
            instruments: owned(instruments),
        }
    }
}

/// Full fit for a single outcome
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeFit {
    pub outcome: String,
    pub result: IvFitResult,
}

/// Fit `outcome` on the rows complete in every column the regression touches
fn fit_outcome(
    data: &DataFrame,
    outcome: &str,
    spec: &IvSpec,
    options: &IvOptions,
) -> StatsResult<IvFitResult> {
    let mut wanted: Vec<&str> = vec![outcome];
    wanted.extend(spec.covariates.iter().map(String::as_str));
    wanted.push(&spec.instrumented);
    wanted.extend(spec.instruments.iter().map(String::as_str));

    // fit_iv2sls does the listwise deletion so it can report what it dropped
    let selected = data.select(&wanted)?;
    let exog = regressors(&selected, &spec.covariates)?;
    let endog = regressors(&selected, std::slice::from_ref(&spec.instrumented))?;
    let instruments = regressors(&selected, &spec.instruments)?;

    let result = fit_iv2sls(selected.column(outcome)?, &exog, &endog, &instruments, options)?;
    if result.n_dropped > 0 {
        debug!(
            outcome,
            dropped = result.n_dropped,
            kept = result.n_observations,
            "dropped incomplete rows"
        );
    }
    Ok(result)
}

fn regressors<'a>(frame: &'a DataFrame, names: &'a [String]) -> StatsResult<Vec<Regressor<'a>>> {
    names
        .iter()
        .map(|name| Ok(Regressor::new(name, frame.column(name)?)))
        .collect()
}

/// Fit every outcome of `spec`, in order
pub fn fit_outcomes(
    data: &DataFrame,
    spec: &IvSpec,
    options: &IvOptions,
) -> StatsResult<Vec<OutcomeFit>> {
    spec.outcomes
        .iter()
        .map(|outcome| -> StatsResult<OutcomeFit> {
            let result = fit_outcome(data, outcome, spec, options)?;
            info!(
                outcome = outcome.as_str(),
                n_observations = result.n_observations,
                "fitted outcome"
            );
            Ok(OutcomeFit {
                outcome: outcome.clone(),
                result,
            })
        })
        .collect()
}

/// Run one 2SLS regression per outcome and format the instrumented coefficient of each
///
/// Uses robust covariance, large-sample inference and two-decimal cells.
pub fn run_iv_regressions<S: AsRef<str>>(
    data: &DataFrame,
    outcomes: &[S],
    covariates: &[S],
    instrumented: &str,
    instrument: &[S],
) -> StatsResult<Vec<String>> {
    let spec = IvSpec::new(outcomes, covariates, instrumented, instrument);
    run_iv_regressions_with(data, &spec, &IvOptions::default(), &FormatOptions::default())
}

pub fn run_iv_regressions_with(
    data: &DataFrame,
    spec: &IvSpec,
    options: &IvOptions,
    format: &FormatOptions,
) -> StatsResult<Vec<String>> {
    fit_outcomes(data, spec, options)?
        .iter()
        .map(|fit| format_estimates_with(&fit.result, &spec.instrumented, format))
        .collect()
}
