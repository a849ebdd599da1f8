//! Instrumental variables / two-stage least squares (2SLS)
//!
//! No intercept is added implicitly: include a constant column among the
//! exogenous regressors to fit one.

use crate::errors::{StatsError, StatsResult};
use crate::types::{CovarianceType, FirstStageDiagnostics, IvFitResult, IvOptions, Regressor};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal, StudentsT};
use tracing::{debug, warn};

/// Relative pivot below which a Gram matrix is treated as rank deficient
const RANK_TOLERANCE: f64 = 1e-12;

/// Rule-of-thumb threshold for a weak first stage
const WEAK_INSTRUMENT_F: f64 = 10.0;

/// Reference distribution for coefficient inference
enum Reference {
    Normal(Normal),
    StudentsT(StudentsT),
}

impl Reference {
    fn new(debiased: bool, df: usize) -> StatsResult<Self> {
        if debiased {
            StudentsT::new(0.0, 1.0, df as f64)
                .map(Reference::StudentsT)
                .map_err(|e| StatsError::Distribution(e.to_string()))
        } else {
            Normal::new(0.0, 1.0)
                .map(Reference::Normal)
                .map_err(|e| StatsError::Distribution(e.to_string()))
        }
    }

    fn two_sided_pvalue(&self, statistic: f64) -> f64 {
        if statistic.is_nan() {
            return f64::NAN;
        }
        let tail = match self {
            Reference::Normal(d) => d.sf(statistic.abs()),
            Reference::StudentsT(d) => d.sf(statistic.abs()),
        };
        (2.0 * tail).min(1.0)
    }

    fn critical_value(&self, confidence_level: f64) -> f64 {
        let q = 1.0 - (1.0 - confidence_level) / 2.0;
        match self {
            Reference::Normal(d) => d.inverse_cdf(q),
            Reference::StudentsT(d) => d.inverse_cdf(q),
        }
    }
}

/// Fit a 2SLS regression of `y` on `exog` and `endog`, instrumenting `endog` with `instruments`
///
/// # Arguments
/// * `y` - Dependent variable (n observations)
/// * `exog` - Exogenous regressors, which serve as their own instruments
/// * `endog` - Endogenous (instrumented) regressors
/// * `instruments` - Excluded instruments, at least as many as `endog`
/// * `options` - Covariance and inference options
///
/// Rows with a NaN or infinite value in `y` or any regressor are dropped.
pub fn fit_iv2sls(
    y: &[f64],
    exog: &[Regressor<'_>],
    endog: &[Regressor<'_>],
    instruments: &[Regressor<'_>],
    options: &IvOptions,
) -> StatsResult<IvFitResult> {
    options.validate()?;

    if y.is_empty() {
        return Err(StatsError::EmptyInput { field: "y" });
    }
    if endog.is_empty() {
        return Err(StatsError::EmptyInput { field: "endog" });
    }
    if instruments.len() < endog.len() {
        return Err(StatsError::UnderIdentified {
            instruments: instruments.len(),
            endogenous: endog.len(),
        });
    }

    let n_obs = y.len();
    let all: Vec<&Regressor<'_>> = exog.iter().chain(endog).chain(instruments).collect();
    for col in &all {
        if col.values.len() != n_obs {
            return Err(StatsError::DimensionMismatch {
                y_len: n_obs,
                x_rows: col.values.len(),
            });
        }
    }

    let valid: Vec<usize> = (0..n_obs)
        .filter(|&i| y[i].is_finite() && all.iter().all(|col| col.values[i].is_finite()))
        .collect();
    if valid.is_empty() {
        return Err(StatsError::NoValidData);
    }

    let n = valid.len();
    let k = exog.len() + endog.len();
    if n <= k {
        return Err(StatsError::InsufficientData { rows: n, cols: k });
    }

    let x_cols: Vec<&Regressor<'_>> = exog.iter().chain(endog).collect();
    let z_cols: Vec<&Regressor<'_>> = exog.iter().chain(instruments).collect();

    let y_vec = DVector::from_fn(n, |i, _| y[valid[i]]);
    let x = design(&x_cols, &valid);
    let z = design(&z_cols, &valid);

    // First stage: X̂ = Z (Z'Z)^-1 Z'X
    let ztz_inv = gram_inverse(z.transpose() * &z, "Z'Z")?;
    let xhat = &z * (&ztz_inv * (z.transpose() * &x));

    // Second stage
    let xhx_inv = gram_inverse(xhat.transpose() * &xhat, "X̂'X̂")?;
    let beta = &xhx_inv * (xhat.transpose() * &y_vec);

    // Residuals use the original regressors, not the fitted ones
    let resid = &y_vec - &x * &beta;
    let rss = resid.norm_squared();

    let n_f = n as f64;
    let scale = if options.debiased {
        n_f / (n - k) as f64
    } else {
        1.0
    };

    let cov = match options.covariance {
        CovarianceType::Unadjusted => &xhx_inv * (rss / n_f * scale),
        CovarianceType::Robust => {
            let mut weighted = xhat.clone();
            for (i, e) in resid.iter().enumerate() {
                weighted.row_mut(i).scale_mut(e * e);
            }
            let meat = xhat.transpose() * weighted;
            &xhx_inv * meat * &xhx_inv * scale
        }
    };

    let reference = Reference::new(options.debiased, n - k)?;
    let crit = reference.critical_value(options.confidence_level);

    let params: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..k).map(|j| cov[(j, j)].max(0.0).sqrt()).collect();
    let statistics: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values: Vec<f64> = statistics
        .iter()
        .map(|&s| reference.two_sided_pvalue(s))
        .collect();
    let ci_lower: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b - crit * se)
        .collect();
    let ci_upper: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b + crit * se)
        .collect();

    let tss = if has_constant(&x) {
        let mean = y_vec.mean();
        y_vec.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
    } else {
        y_vec.norm_squared()
    };
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };

    let sigma = (rss / n_f * scale).sqrt();

    let first_stage = endog
        .iter()
        .enumerate()
        .map(|(j, reg)| {
            let column = x.column(exog.len() + j).into_owned();
            first_stage_diagnostics(reg.name, &column, &z, &ztz_inv, exog.len(), instruments.len())
        })
        .collect::<StatsResult<Vec<_>>>()?;

    debug!(
        n_observations = n,
        n_dropped = n_obs - n,
        n_params = k,
        covariance = options.covariance.as_str(),
        debiased = options.debiased,
        "fitted 2SLS"
    );

    Ok(IvFitResult {
        names: x_cols.iter().map(|c| c.name.to_string()).collect(),
        params,
        std_errors,
        statistics,
        p_values,
        ci_lower,
        ci_upper,
        confidence_level: options.confidence_level,
        n_observations: n,
        n_dropped: n_obs - n,
        df_resid: n - k,
        r_squared,
        sigma,
        covariance: options.covariance,
        debiased: options.debiased,
        first_stage,
    })
}

fn design(cols: &[&Regressor<'_>], rows: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(rows.len(), cols.len(), |i, j| cols[j].values[rows[i]])
}

/// Invert a symmetric positive definite cross-product matrix via Cholesky
fn gram_inverse(gram: DMatrix<f64>, what: &'static str) -> StatsResult<DMatrix<f64>> {
    let diag = gram.diagonal();
    let chol = gram.cholesky().ok_or(StatsError::SingularMatrix(what))?;

    let l = chol.l();
    let deficient = (0..diag.len()).any(|i| {
        let pivot = l[(i, i)] * l[(i, i)];
        pivot <= RANK_TOLERANCE * diag[i].abs().max(f64::MIN_POSITIVE)
    });
    if deficient {
        return Err(StatsError::SingularMatrix(what));
    }

    let inv = chol.inverse();
    if inv.iter().all(|v| v.is_finite()) {
        Ok(inv)
    } else {
        Err(StatsError::SingularMatrix(what))
    }
}

/// A non-zero column whose entries are all equal
fn has_constant(x: &DMatrix<f64>) -> bool {
    x.column_iter().any(|col| {
        let first = col[0];
        first != 0.0 && col.iter().all(|&v| v == first)
    })
}

fn first_stage_diagnostics(
    name: &str,
    endog: &DVector<f64>,
    z: &DMatrix<f64>,
    ztz_inv: &DMatrix<f64>,
    k_exog: usize,
    m: usize,
) -> StatsResult<FirstStageDiagnostics> {
    let n = endog.len();
    let k_z = z.ncols();

    let gamma = ztz_inv * (z.transpose() * endog);
    let rss_u = (endog - z * gamma).norm_squared();

    // Restricted model keeps only the exogenous regressors
    let rss_r = if k_exog == 0 {
        endog.norm_squared()
    } else {
        let w = z.columns(0, k_exog).into_owned();
        let wtw_inv = gram_inverse(w.transpose() * &w, "W'W")?;
        let delta = &wtw_inv * (w.transpose() * endog);
        (endog - &w * delta).norm_squared()
    };

    let mean = endog.mean();
    let tss: f64 = endog.iter().map(|v| (v - mean).powi(2)).sum();
    let r_squared = if tss > 0.0 { 1.0 - rss_u / tss } else { f64::NAN };
    let partial_r_squared = if rss_r > 0.0 {
        (rss_r - rss_u) / rss_r
    } else {
        f64::NAN
    };

    let (partial_f_stat, partial_f_pvalue) = if n > k_z {
        let df2 = (n - k_z) as f64;
        let f = ((rss_r - rss_u) / m as f64) / (rss_u / df2);
        let p = if f.is_nan() {
            f64::NAN
        } else {
            FisherSnedecor::new(m as f64, df2)
                .map_err(|e| StatsError::Distribution(e.to_string()))?
                .sf(f.max(0.0))
        };
        (f, p)
    } else {
        (f64::NAN, f64::NAN)
    };

    if partial_f_stat < WEAK_INSTRUMENT_F {
        warn!(endogenous = name, f_stat = partial_f_stat, "weak first stage");
    }

    Ok(FirstStageDiagnostics {
        endogenous: name.to_string(),
        r_squared,
        partial_r_squared,
        partial_f_stat,
        partial_f_pvalue,
    })
}
