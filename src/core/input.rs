use crate::domain::model::InputRow;
use crate::utils::error::{Result, ScraperError};

/// Parsed input CSV: trimmed headers and rows in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<InputRow>,
}

/// Parses the whole file up front so malformed input fails before any request.
/// The identifier column is matched case-insensitively.
pub fn read_rows(data: &[u8], id_column: &str) -> Result<InputTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(ScraperError::ConfigError {
            message: "input file has no header row".to_string(),
        });
    }

    let wanted = id_column.trim();
    let id_index = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| ScraperError::MissingColumnError {
            column: wanted.to_string(),
            available: headers.clone(),
        })?;

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let id = record.get(id_index).unwrap_or_default().to_string();
        let columns = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(InputRow {
            line: index + 1,
            id,
            columns,
        });
    }

    tracing::debug!("Parsed {} rows, identifier column '{}'", rows.len(), headers[id_index]);
    Ok(InputTable { headers, rows })
}
