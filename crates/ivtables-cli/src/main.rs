//! ivtables CLI

mod config;
mod input;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ivtables_core::{
    display_table, fit_outcomes, run_iv_regressions_with, CovarianceType, DataFrame, ResultTable,
};
use std::path::{Path, PathBuf};

use config::{RowConfig, TableConfig, CONSTANT_COLUMN};

#[derive(Parser)]
#[command(name = "ivtables")]
#[command(about = "ivtables - IV regression tables with significance stars")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the instrumented coefficient of every outcome as an HTML table
    Table {
        #[command(flatten)]
        selection: Selection,

        /// Number of decimals in each cell [default: 2]
        #[arg(long)]
        decimals: Option<usize>,

        /// Output file for the HTML. Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fit every outcome and print the full results (pretty JSON)
    Fit {
        #[command(flatten)]
        selection: Selection,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct Selection {
    /// Table definition (TOML). Replaces the column flags below.
    #[arg(long, conflicts_with_all = ["data", "outcome", "covariate", "instrumented", "instrument"])]
    config: Option<PathBuf>,

    /// Input data (CSV or TSV)
    #[arg(short, long, required_unless_present = "config")]
    data: Option<PathBuf>,

    /// Outcome column (repeatable)
    #[arg(long = "outcome", required_unless_present = "config")]
    outcome: Vec<String>,

    /// Exogenous covariate column (repeatable)
    #[arg(long = "covariate")]
    covariate: Vec<String>,

    /// Endogenous regressor to instrument and report
    #[arg(long, required_unless_present = "config")]
    instrumented: Option<String>,

    /// Excluded instrument column (repeatable)
    #[arg(long = "instrument", required_unless_present = "config")]
    instrument: Vec<String>,

    /// Add a constant column to the covariates
    #[arg(long)]
    add_constant: bool,

    /// Parameter covariance estimator
    #[arg(long, value_enum)]
    covariance: Option<CovarianceArg>,

    /// Small-sample correction with Student-t inference
    #[arg(long)]
    debiased: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CovarianceArg {
    Robust,
    Unadjusted,
}

impl From<CovarianceArg> for CovarianceType {
    fn from(arg: CovarianceArg) -> Self {
        match arg {
            CovarianceArg::Robust => CovarianceType::Robust,
            CovarianceArg::Unadjusted => CovarianceType::Unadjusted,
        }
    }
}

impl Selection {
    /// Resolve flags or a config file into a table definition
    fn into_config(self) -> Result<TableConfig> {
        let mut config = match self.config {
            Some(path) => TableConfig::load(&path)?,
            None => {
                let config = TableConfig {
                    data: self.data.context("--data is required")?,
                    outcomes: self.outcome,
                    rows: vec![RowConfig {
                        label: None,
                        covariates: self.covariate,
                        instrumented: self.instrumented.context("--instrumented is required")?,
                        instruments: self.instrument,
                    }],
                    add_constant: false,
                    covariance: CovarianceType::default(),
                    debiased: false,
                    confidence_level: 0.95,
                    decimals: 2,
                    output: None,
                };
                config.validate()?;
                config
            }
        };

        // Flags can only switch these on
        config.add_constant |= self.add_constant;
        config.debiased |= self.debiased;
        if let Some(cov) = self.covariance {
            config.covariance = cov.into();
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the HTML/JSON output
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Table { selection, decimals, output } => {
            let mut config = selection.into_config()?;
            if let Some(decimals) = decimals {
                config.decimals = decimals;
            }
            if output.is_some() {
                config.output = output;
            }
            cmd_table(&config)
        }
        Commands::Fit { selection, output } => cmd_fit(&selection.into_config()?, output.as_ref()),
    }
}

fn load_data(config: &TableConfig) -> Result<DataFrame> {
    let mut df = input::read_table(&config.data)?;
    if config.add_constant && !df.has_column(CONSTANT_COLUMN) {
        df.add_constant(CONSTANT_COLUMN)?;
    }
    Ok(df)
}

/// Build the table: one column per outcome, one row per specification
fn build_table(config: &TableConfig, df: &DataFrame) -> Result<ResultTable> {
    let labelled = config.labels_rows();
    let mut header: Vec<String> = Vec::with_capacity(config.outcomes.len() + 1);
    if labelled {
        header.push("Specification".to_string());
    }
    header.extend(config.outcomes.iter().cloned());

    let mut table = ResultTable::new(header);
    let options = config.iv_options();
    let format = config.format_options();
    for row in &config.rows {
        let spec = config.spec(row);
        let cells = run_iv_regressions_with(df, &spec, &options, &format)
            .with_context(|| format!("regressions for '{}' failed", row.display_label()))?;

        let mut line = Vec::with_capacity(cells.len() + 1);
        if labelled {
            line.push(row.display_label().to_string());
        }
        line.extend(cells);
        table.push_row(line)?;
    }
    Ok(table)
}

fn cmd_table(config: &TableConfig) -> Result<()> {
    let df = load_data(config)?;
    let table = build_table(config, &df)?;

    match &config.output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            display_table(&table, &mut file)?;
            tracing::info!(path = %path.display(), "wrote table");
        }
        None => display_table(&table, &mut std::io::stdout().lock())?,
    }
    Ok(())
}

fn cmd_fit(config: &TableConfig, output: Option<&PathBuf>) -> Result<()> {
    let df = load_data(config)?;
    let options = config.iv_options();

    let mut rows = Vec::with_capacity(config.rows.len());
    for row in &config.rows {
        let fits = fit_outcomes(&df, &config.spec(row), &options)
            .with_context(|| format!("regressions for '{}' failed", row.display_label()))?;
        rows.push(serde_json::json!({
            "label": row.display_label(),
            "instrumented": row.instrumented,
            "fits": fits,
        }));
    }

    write_json(output.map(PathBuf::as_path), serde_json::Value::Array(rows))
}

fn write_json(output: Option<&Path>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
