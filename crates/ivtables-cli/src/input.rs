use anyhow::{Context, Result};
use ivtables_core::DataFrame;
use std::io::Read;
use std::path::Path;

/// Tokens read as a missing value
const MISSING_TOKENS: &[&str] = &["", "na", "nan", "null", "none", "."];

/// Load a CSV (or TSV, by extension) file into a [`DataFrame`].
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    let delimiter = match ext.as_str() {
        "tsv" | "tab" => b'\t',
        "csv" | "txt" | "" => b',',
        _ => anyhow::bail!("unsupported file extension '.{ext}', expected .csv or .tsv"),
    };
    let file =
        std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_delimited(file, delimiter).with_context(|| format!("failed to read {}", path.display()))
}

/// Parse delimited text with a header row.
///
/// Every column becomes an `f64` column; missing tokens map to `NaN`. Columns
/// holding any other non-numeric text are skipped.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<DataFrame> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("failed to read CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        anyhow::bail!("CSV file has no columns");
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
    let mut numeric = vec![true; headers.len()];

    for (row, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV row {}", row + 2))?;
        for (j, field) in record.iter().enumerate().take(headers.len()) {
            if !numeric[j] {
                continue;
            }
            match parse_cell(field) {
                Some(v) => columns[j].push(v),
                None => numeric[j] = false,
            }
        }
    }

    let mut df = DataFrame::new();
    for ((name, values), is_numeric) in headers.into_iter().zip(columns).zip(numeric) {
        if !is_numeric {
            tracing::warn!(column = name.as_str(), "skipping non-numeric column");
            continue;
        }
        df.insert_column(name, values)?;
    }
    tracing::debug!(rows = df.n_rows(), columns = df.n_columns(), "loaded table");
    Ok(df)
}

fn parse_cell(field: &str) -> Option<f64> {
    if MISSING_TOKENS.iter().any(|t| field.eq_ignore_ascii_case(t)) {
        return Some(f64::NAN);
    }
    field.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens_become_nan() {
        let text = "y,x,z\n1,2,3\nNA,,nan\n4, 5 ,6\n";
        let df = read_delimited(text.as_bytes(), b',').unwrap();
        assert_eq!(df.n_rows(), 3);
        assert!(df.column("y").unwrap()[1].is_nan());
        assert!(df.column("x").unwrap()[1].is_nan());
        assert_eq!(df.column("x").unwrap()[2], 5.0);
    }

    #[test]
    fn test_non_numeric_columns_are_skipped() {
        let text = "id,name,y\n1,alice,0.5\n2,bob,1.5\n";
        let df = read_delimited(text.as_bytes(), b',').unwrap();
        assert!(!df.has_column("name"));
        assert_eq!(df.column("y").unwrap(), &[0.5, 1.5]);
        assert_eq!(df.n_columns(), 2);
    }

    #[test]
    fn test_tab_delimited() {
        let text = "a\tb\n1\t2\n";
        let df = read_delimited(text.as_bytes(), b'\t').unwrap();
        assert_eq!(df.column("b").unwrap(), &[2.0]);
    }
}
