//! TOML table definitions

use anyhow::{Context, Result};
use ivtables_core::{CovarianceType, FormatOptions, IvOptions, IvSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Column used for the implicit intercept
pub const CONSTANT_COLUMN: &str = "const";

fn default_decimals() -> usize {
    2
}

fn default_confidence_level() -> f64 {
    0.95
}

/// One table: outcomes become columns, specifications become rows
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    /// CSV/TSV input, relative to the config file
    pub data: PathBuf,
    pub outcomes: Vec<String>,
    pub rows: Vec<RowConfig>,
    /// Append a `const` column and use it as a covariate in every row
    #[serde(default)]
    pub add_constant: bool,
    #[serde(default)]
    pub covariance: CovarianceType,
    #[serde(default)]
    pub debiased: bool,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default = "default_decimals")]
    pub decimals: usize,
    /// HTML destination; stdout when absent
    #[serde(default)]
    pub output: Option<PathBuf>,
}

/// One regression specification
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub covariates: Vec<String>,
    pub instrumented: String,
    pub instruments: Vec<String>,
}

impl RowConfig {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.instrumented)
    }
}

impl TableConfig {
    /// Read and validate a config, resolving relative paths against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config = Self::parse(&contents)
            .with_context(|| format!("invalid table config {}", path.display()))?;

        if let Some(base) = path.parent() {
            if config.data.is_relative() {
                config.data = base.join(&config.data);
            }
            if let Some(out) = config.output.as_mut() {
                if out.is_relative() {
                    *out = base.join(&*out);
                }
            }
        }
        tracing::debug!(path = %path.display(), rows = config.rows.len(), "loaded table config");
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.outcomes.is_empty() {
            anyhow::bail!("at least one outcome is required");
        }
        if self.rows.is_empty() {
            anyhow::bail!("at least one row specification is required");
        }
        for row in &self.rows {
            if row.instruments.is_empty() {
                anyhow::bail!("row '{}' has no instruments", row.display_label());
            }
        }
        self.iv_options().validate()?;
        Ok(())
    }

    pub fn iv_options(&self) -> IvOptions {
        IvOptions {
            covariance: self.covariance,
            debiased: self.debiased,
            confidence_level: self.confidence_level,
        }
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            decimals: self.decimals,
            ..Default::default()
        }
    }

    /// The regression spec for `row`, with the constant prepended when requested
    pub fn spec(&self, row: &RowConfig) -> IvSpec {
        let mut covariates = Vec::with_capacity(row.covariates.len() + 1);
        if self.add_constant {
            covariates.push(CONSTANT_COLUMN.to_string());
        }
        covariates.extend(row.covariates.iter().cloned());
        IvSpec {
            outcomes: self.outcomes.clone(),
            covariates,
            instrumented: row.instrumented.clone(),
            instruments: row.instruments.clone(),
        }
    }

    /// A leading label column is only needed to tell several rows apart
    pub fn labels_rows(&self) -> bool {
        self.rows.len() > 1 || self.rows.iter().any(|r| r.label.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
data = "wages.csv"
outcomes = ["wage", "hours"]
add_constant = true
covariance = "unadjusted"

[[rows]]
label = "Baseline"
instrumented = "educ"
instruments = ["distance"]

[[rows]]
covariates = ["age", "female"]
instrumented = "educ"
instruments = ["distance", "siblings"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = TableConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.outcomes, vec!["wage", "hours"]);
        assert_eq!(config.covariance, CovarianceType::Unadjusted);
        assert!(!config.debiased);
        assert_eq!(config.decimals, 2);
        assert_eq!(config.rows[0].display_label(), "Baseline");
        assert_eq!(config.rows[1].display_label(), "educ");
        assert!(config.labels_rows());

        let spec = config.spec(&config.rows[1]);
        assert_eq!(spec.covariates, vec!["const", "age", "female"]);
        assert_eq!(spec.instruments, vec!["distance", "siblings"]);
    }

    #[test]
    fn test_defaults() {
        let config = TableConfig::parse(
            r#"
data = "d.csv"
outcomes = ["y"]
[[rows]]
instrumented = "d"
instruments = ["z"]
"#,
        )
        .unwrap();
        assert_eq!(config.covariance, CovarianceType::Robust);
        assert_eq!(config.confidence_level, 0.95);
        assert!(config.output.is_none());
        assert!(!config.labels_rows());
        assert!(config.spec(&config.rows[0]).covariates.is_empty());
    }

    #[test]
    fn test_rejects_unknown_keys_and_empty_lists() {
        assert!(TableConfig::parse("data = \"d.csv\"\noutcomes = [\"y\"]\nrows = []\nfoo = 1\n").is_err());
        assert!(TableConfig::parse("data = \"d.csv\"\noutcomes = []\nrows = []\n").is_err());
        assert!(TableConfig::parse(
            "data = \"d.csv\"\noutcomes = [\"y\"]\n[[rows]]\ninstrumented = \"d\"\ninstruments = []\n"
        )
        .is_err());
    }
}
