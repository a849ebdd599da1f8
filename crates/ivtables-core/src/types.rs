use serde::{Deserialize, Serialize};

use crate::errors::{StatsError, StatsResult};

/// A named column of observations handed to a model
#[derive(Debug, Clone, Copy)]
pub struct Regressor<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
}

impl<'a> Regressor<'a> {
    pub fn new(name: &'a str, values: &'a [f64]) -> Self {
        Self { name, values }
    }
}

/// Parameter covariance estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovarianceType {
    /// Homoskedastic covariance, sigma^2 (X̂'X̂)^-1
    Unadjusted,
    /// Heteroskedasticity-robust (HC0) sandwich covariance
    #[default]
    Robust,
}

impl CovarianceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CovarianceType::Unadjusted => "unadjusted",
            CovarianceType::Robust => "robust",
        }
    }
}

/// Options for 2SLS fitting
#[derive(Debug, Clone)]
pub struct IvOptions {
    /// Covariance estimator (default: robust)
    pub covariance: CovarianceType,
    /// Apply the n/(n-k) small-sample correction and use Student-t inference
    pub debiased: bool,
    /// Confidence level for confidence intervals (default: 0.95)
    pub confidence_level: f64,
}

impl Default for IvOptions {
    fn default() -> Self {
        Self {
            covariance: CovarianceType::Robust,
            debiased: false,
            confidence_level: 0.95,
        }
    }
}

impl IvOptions {
    pub fn validate(&self) -> StatsResult<()> {
        let level = self.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(StatsError::InvalidValue {
                field: "confidence_level",
                value: level,
                reason: "must be in (0, 1)",
            });
        }
        Ok(())
    }
}

/// First-stage diagnostics for one endogenous regressor
#[derive(Debug, Clone, Serialize)]
pub struct FirstStageDiagnostics {
    /// Name of the endogenous regressor
    pub endogenous: String,
    /// R-squared of the endogenous regressor on all instruments (centered)
    pub r_squared: f64,
    /// Share of the restricted residual variance explained by the excluded instruments
    pub partial_r_squared: f64,
    /// F statistic for the joint significance of the excluded instruments
    pub partial_f_stat: f64,
    /// p-value of the partial F statistic
    pub partial_f_pvalue: f64,
}

/// All estimates for a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

/// Result of a two-stage least squares fit
#[derive(Debug, Clone, Serialize)]
pub struct IvFitResult {
    /// Parameter names: exogenous regressors first, then endogenous
    pub names: Vec<String>,
    /// Second-stage coefficient estimates
    pub params: Vec<f64>,
    /// Standard errors of the estimates
    pub std_errors: Vec<f64>,
    /// z-statistics, or t-statistics when debiased
    pub statistics: Vec<f64>,
    /// Two-sided p-values
    pub p_values: Vec<f64>,
    /// Lower bound of confidence intervals
    pub ci_lower: Vec<f64>,
    /// Upper bound of confidence intervals
    pub ci_upper: Vec<f64>,
    /// Confidence level used (e.g., 0.95)
    pub confidence_level: f64,
    /// Number of observations used after dropping incomplete rows
    pub n_observations: usize,
    /// Number of rows dropped for missing or non-finite values
    pub n_dropped: usize,
    /// Residual degrees of freedom (n - k)
    pub df_resid: usize,
    /// R-squared (centered if a constant regressor is present)
    pub r_squared: f64,
    /// Residual scale, sqrt(e'e / n) or sqrt(e'e / (n - k)) when debiased
    pub sigma: f64,
    pub covariance: CovarianceType,
    pub debiased: bool,
    pub first_stage: Vec<FirstStageDiagnostics>,
}

impl IvFitResult {
    fn index_of(&self, name: &str) -> StatsResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StatsError::UnknownParameter(name.to_string()))
    }

    pub fn param(&self, name: &str) -> StatsResult<f64> {
        Ok(self.params[self.index_of(name)?])
    }

    pub fn std_error(&self, name: &str) -> StatsResult<f64> {
        Ok(self.std_errors[self.index_of(name)?])
    }

    pub fn p_value(&self, name: &str) -> StatsResult<f64> {
        Ok(self.p_values[self.index_of(name)?])
    }

    pub fn coefficient(&self, name: &str) -> StatsResult<Coefficient> {
        let i = self.index_of(name)?;
        Ok(Coefficient {
            estimate: self.params[i],
            std_error: self.std_errors[i],
            statistic: self.statistics[i],
            p_value: self.p_values[i],
            ci_lower: self.ci_lower[i],
            ci_upper: self.ci_upper[i],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> IvFitResult {
        IvFitResult {
            names: vec!["const".into(), "d".into()],
            params: vec![1.0, 2.0],
            std_errors: vec![0.1, 0.5],
            statistics: vec![10.0, 4.0],
            p_values: vec![0.0, 0.00006],
            ci_lower: vec![0.8, 1.02],
            ci_upper: vec![1.2, 2.98],
            confidence_level: 0.95,
            n_observations: 50,
            n_dropped: 0,
            df_resid: 48,
            r_squared: 0.5,
            sigma: 1.0,
            covariance: CovarianceType::Robust,
            debiased: false,
            first_stage: Vec::new(),
        }
    }

    #[test]
    fn test_accessors_by_name() {
        let result = sample_result();
        assert_eq!(result.param("d").unwrap(), 2.0);
        assert_eq!(result.std_error("d").unwrap(), 0.5);
        assert_eq!(result.coefficient("const").unwrap().statistic, 10.0);
    }

    #[test]
    fn test_unknown_parameter() {
        let result = sample_result();
        assert!(matches!(
            result.p_value("z"),
            Err(StatsError::UnknownParameter(name)) if name == "z"
        ));
    }

    #[test]
    fn test_options_validation() {
        assert!(IvOptions::default().validate().is_ok());
        let options = IvOptions {
            confidence_level: 1.0,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(StatsError::InvalidValue { field: "confidence_level", .. })
        ));
    }
}
