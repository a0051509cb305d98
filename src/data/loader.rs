use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{Record, Table, Value};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular data file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` – comma-separated, header row required
/// * `.tsv` – tab-separated, header row required
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !matches!(ext.as_str(), "csv" | "tsv" | "tab") {
        bail!("Unsupported file extension: .{ext}");
    }

    let file = std::fs::File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let table = match ext.as_str() {
        "csv" => read_csv(file),
        _ => read_delimited(file, b'\t'),
    }
    .with_context(|| format!("reading {}", path.display()))?;

    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Read comma-separated text from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    read_delimited(reader, b',')
}

/// Layout: header row with column names, one record per line.
/// Every cell is type-guessed; empty cells become `Null`.
fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        bail!("header row is empty");
    }

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("row {row_no}"))?;

        let mut record = Record::new();
        for (col_idx, value) in row.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            record.set(col_name, guess_value_type(value));
        }
        records.push(record);
    }

    Ok(Table::from_records(headers, records))
}

fn guess_value_type(s: &str) -> Value {
    let s = s.trim();
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // "NaN" / "inf" parse as floats but carry no number.
        return if f.is_finite() { Value::Float(f) } else { Value::Null };
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::String(s.to_string())
}
