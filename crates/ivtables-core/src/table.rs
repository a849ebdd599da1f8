//! HTML rendering of result tables
//!
//! Cells are written verbatim, so formatted estimates can carry markup such
//! as `<br>`. No index column is emitted.

use std::fmt::Write as _;
use std::io;

use crate::errors::{StatsError, StatsResult};

const TABLE_STYLE: &str = "<style>
    table {margin-left: auto; margin-right: auto; text-align: center; font-family: 'CMU Serif', 'Computer Modern Roman', serif;}
    th, td {text-align: center;}
</style>
<link href=\"https://cdn.jsdelivr.net/npm/cmu-serif-font@1.1.0/css/cmu-serif.min.css\" rel=\"stylesheet\">
";

/// A rectangular table of pre-formatted cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// One-row table with a column per outcome
    pub fn from_estimates<S: AsRef<str>>(outcomes: &[S], cells: Vec<String>) -> StatsResult<Self> {
        let mut table = Self::new(outcomes.iter().map(|s| s.as_ref().to_string()));
        table.push_row(cells)?;
        Ok(table)
    }

    pub fn push_row(&mut self, cells: Vec<String>) -> StatsResult<()> {
        if cells.len() != self.columns.len() {
            return Err(StatsError::RowWidthMismatch {
                cells: cells.len(),
                columns: self.columns.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Bare `<table>` markup in the layout of a pandas `DataFrame.to_html`
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table border=\"1\" class=\"dataframe\">\n");
        html.push_str("  <thead>\n    <tr style=\"text-align: right;\">\n");
        for column in &self.columns {
            let _ = writeln!(html, "      <th>{column}</th>");
        }
        html.push_str("    </tr>\n  </thead>\n  <tbody>\n");
        for row in &self.rows {
            html.push_str("    <tr>\n");
            for cell in row {
                let _ = writeln!(html, "      <td>{cell}</td>");
            }
            html.push_str("    </tr>\n");
        }
        html.push_str("  </tbody>\n</table>\n");
        html
    }
}

/// Render `table` centered and in a Computer Modern serif face
pub fn df_to_table(table: &ResultTable) -> String {
    let mut html = String::from(TABLE_STYLE);
    html.push_str(&table.to_html());
    html
}

/// Destination for rendered HTML
pub trait TableSink {
    fn show(&mut self, html: &str) -> io::Result<()>;
}

impl<W: io::Write> TableSink for W {
    fn show(&mut self, html: &str) -> io::Result<()> {
        self.write_all(html.as_bytes())?;
        self.flush()
    }
}

/// Render `table` with [`df_to_table`] and hand it to `sink`
pub fn display_table<S: TableSink + ?Sized>(table: &ResultTable, sink: &mut S) -> StatsResult<()> {
    sink.show(&df_to_table(table))?;
    Ok(())
}
