//! Journal export formats
//!
//! - `text`: a printable document, one section per entry
//! - `csv`: `date,content` rows
//! - `json`: array of entries

use serde::Serialize;

use crate::journal::{JournalError, JournalResult};
use crate::storage::{JournalEntry, User};

const DOCUMENT_TITLE: &str = "AnsuryX Challenge - Journal Entries";
const RULE: &str = "----------------------------------------";

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Csv,
    Json,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(JournalError::Validation(format!(
                "Invalid export format: {}. Use text, csv, or json",
                other
            ))),
        }
    }
}

/// A rendered export ready to download
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

/// Replace runs of whitespace with dashes for use in filenames
pub fn filename_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Render `entries` (already in display order) in `format`
pub fn render(
    entries: &[JournalEntry],
    user: &User,
    format: ExportFormat,
) -> JournalResult<ExportDocument> {
    if entries.is_empty() {
        return Err(JournalError::Validation(
            "No journal entries to export".to_string(),
        ));
    }

    let body = match format {
        ExportFormat::Text => render_text(entries, user),
        ExportFormat::Csv => render_csv(entries)?,
        ExportFormat::Json => render_json(entries)?,
    };

    Ok(ExportDocument {
        filename: format!(
            "AnsuryX-Challenge-Journal-{}.{}",
            filename_name(user.display_name()),
            format.extension()
        ),
        content_type: format.content_type(),
        body,
    })
}

fn render_text(entries: &[JournalEntry], user: &User) -> String {
    let mut doc = String::new();
    doc.push_str(DOCUMENT_TITLE);
    doc.push('\n');
    doc.push_str(&format!("Participant: {}\n\n", user.display_name()));

    for (index, entry) in entries.iter().enumerate() {
        doc.push_str(&entry.date.format("%Y-%m-%d").to_string());
        doc.push('\n');
        doc.push_str(entry.content.trim_end());
        doc.push('\n');
        if index + 1 < entries.len() {
            doc.push('\n');
            doc.push_str(RULE);
            doc.push_str("\n\n");
        }
    }

    doc
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: String,
    content: &'a str,
}

fn render_csv(entries: &[JournalEntry]) -> JournalResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for entry in entries {
        writer
            .serialize(CsvRow {
                date: entry.date.format("%Y-%m-%d").to_string(),
                content: &entry.content,
            })
            .map_err(|e| JournalError::Export(e.to_string()))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| JournalError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| JournalError::Export(e.to_string()))
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    date: String,
    content: &'a str,
    updated_at: String,
}

fn render_json(entries: &[JournalEntry]) -> JournalResult<String> {
    let records: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|e| JsonEntry {
            date: e.date.format("%Y-%m-%d").to_string(),
            content: &e.content,
            updated_at: e.updated_at.to_rfc3339(),
        })
        .collect();
    serde_json::to_string_pretty(&records).map_err(|e| JournalError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn user(name: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            full_name: name.map(String::from),
            created_at: Utc::now(),
        }
    }

    fn entry(day: u32, content: &str) -> JournalEntry {
        JournalEntry {
            id: format!("e{}", day),
            user_id: "u1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            content: content.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("txt".parse::<ExportFormat>().unwrap(), ExportFormat::Text);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_empty_export_rejected() {
        let err = render(&[], &user(None), ExportFormat::Text).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: No journal entries to export");
    }

    #[test]
    fn test_text_document() {
        let entries = vec![entry(2, "Felt strong."), entry(1, "Day one.")];
        let doc = render(&entries, &user(Some("Amina Yusuf")), ExportFormat::Text).unwrap();

        assert_eq!(doc.filename, "AnsuryX-Challenge-Journal-Amina-Yusuf.txt");
        assert!(doc.body.starts_with(DOCUMENT_TITLE));
        assert!(doc.body.contains("Participant: Amina Yusuf"));
        assert!(doc.body.find("2024-02-02").unwrap() < doc.body.find("2024-02-01").unwrap());
        assert_eq!(doc.body.matches(RULE).count(), 1);
    }

    #[test]
    fn test_csv_quotes_content() {
        let entries = vec![entry(1, "grateful, calm\nand rested")];
        let doc = render(&entries, &user(None), ExportFormat::Csv).unwrap();

        assert_eq!(
            doc.filename,
            "AnsuryX-Challenge-Journal-Challenge-Participant.csv"
        );
        assert!(doc.body.starts_with("date,content\n"));
        assert!(doc.body.contains("2024-02-01,\"grateful, calm\nand rested\""));
    }

    #[test]
    fn test_json_export() {
        let doc = render(&[entry(3, "ok")], &user(None), ExportFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&doc.body).unwrap();
        assert_eq!(parsed[0]["date"], "2024-02-03");
        assert_eq!(parsed[0]["content"], "ok");
    }
}
