// 📤 Export - full expense list to a dated JSON or CSV document

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::expense::{Expense, DATE_FORMAT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV column names, written even when there are no rows.
const CSV_HEADER: [&str; 6] = ["id", "amount", "category", "description", "date", "createdAt"];

/// CSV row; amounts are written as exact decimals, not floats.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    id: &'a str,
    amount: String,
    category: &'a str,
    description: &'a str,
    date: String,
    created_at: String,
}

impl<'a> From<&'a Expense> for CsvRow<'a> {
    fn from(e: &'a Expense) -> Self {
        CsvRow {
            id: e.id().as_str(),
            amount: e.amount().to_string(),
            category: e.category(),
            description: e.description(),
            date: e.date().format(DATE_FORMAT).to_string(),
            created_at: e.created_at().to_rfc3339(),
        }
    }
}

/// Pretty-printed JSON array using the storage field names.
pub fn export_json(expenses: &[Expense]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(expenses)?)
}

pub fn export_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for expense in expenses {
        wtr.serialize(CsvRow::from(expense))?;
    }
    wtr.flush()?;
    Ok(())
}

/// `expenses-YYYY-MM-DD.<ext>`
pub fn export_file_name(format: ExportFormat, today: NaiveDate) -> String {
    format!("expenses-{}.{}", today.format(DATE_FORMAT), format.extension())
}

/// Write the export into `dir` and return the file path.
pub fn write_export(
    dir: &Path,
    format: ExportFormat,
    expenses: &[Expense],
    today: NaiveDate,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(format, today));

    match format {
        ExportFormat::Json => fs::write(&path, export_json(expenses)?)?,
        ExportFormat::Csv => export_csv(expenses, File::create(&path)?)?,
    }

    info!(path = %path.display(), count = expenses.len(), "expenses exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{validate_at, ExpenseCandidate, ExpenseId};
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<Expense> {
        let created = Utc.with_ymd_and_hms(2024, 1, 11, 8, 0, 0).unwrap();
        vec![
            validate_at(
                &ExpenseCandidate::new("7.25", "Transport", "Bus", "2024-01-11"),
                ExpenseId::from("b"),
                created,
            )
            .unwrap(),
            validate_at(
                &ExpenseCandidate::new("12.50", "Food", "Lunch, with \"friends\"", "2024-01-10"),
                ExpenseId::from("a"),
                created,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn test_file_name_uses_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(export_file_name(ExportFormat::Json, today), "expenses-2024-03-05.json");
        assert_eq!(export_file_name(ExportFormat::Csv, today), "expenses-2024-03-05.csv");
    }

    #[test]
    fn test_json_export_reads_back() {
        let expenses = sample();
        let json = export_json(&expenses).unwrap();

        assert!(json.contains("\"createdAt\""));
        let back: Vec<Expense> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expenses);
    }

    #[test]
    fn test_csv_export_header_and_quoting() {
        let mut out = Vec::new();
        export_csv(&sample(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,amount,category,description,date,createdAt"));
        assert!(lines.next().unwrap().starts_with("b,7.25,Transport,Bus,2024-01-11,"));
        assert!(lines.next().unwrap().contains("\"Lunch, with \"\"friends\"\"\""));
    }

    #[test]
    fn test_empty_csv_export_has_header_only() {
        let mut out = Vec::new();
        export_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id,amount,category,description,date,createdAt\n");

        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        let path = write_export(dir.path(), ExportFormat::Csv, &[], today).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), 6);
        assert_eq!(reader.records().count(), 0);
    }

    #[test]
    fn test_empty_json_export_is_empty_array() {
        assert_eq!(export_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_csv_keeps_amount_scale() {
        let created = Utc.with_ymd_and_hms(2024, 1, 11, 8, 0, 0).unwrap();
        let expense = validate_at(
            &ExpenseCandidate::new("0.123456789012345678", "Fees", "Rounding", "2024-01-11"),
            ExpenseId::from("c"),
            created,
        )
        .unwrap();

        let mut out = Vec::new();
        export_csv(&[expense], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("c,0.123456789012345678,Fees,"));
    }

    #[test]
    fn test_write_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();

        let path = write_export(dir.path(), ExportFormat::Json, &sample(), today).unwrap();

        assert_eq!(path, dir.path().join("expenses-2024-01-12.json"));
        let back: Vec<Expense> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.len(), 2);
    }
}
