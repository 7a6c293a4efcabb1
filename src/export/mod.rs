use rocket::FromFormField;
use serde::Serialize;

use crate::models::Business;
use crate::session::state::{SessionSnapshot, SessionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromFormField)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    /// The session has not reached a terminal status yet.
    NotReady(SessionStatus),
    /// The session finished but holds no records.
    NoData,
    Encode(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::NotReady(status) => {
                write!(f, "extraction not finished yet (status: {})", status)
            }
            ExportError::NoData => write!(f, "no records to export"),
            ExportError::Encode(reason) => write!(f, "failed to encode export: {}", reason),
        }
    }
}

impl std::error::Error for ExportError {}

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata<'a>,
    results: &'a [Business],
}

#[derive(Serialize)]
struct ExportMetadata<'a> {
    keywords: &'a str,
    location: &'a str,
    total_results: usize,
    scraped_at: Option<String>,
}

/// Serializes a finished session's records. Works for any terminal status —
/// error and cancelled sessions export their partial sets — and is
/// deterministic: the same snapshot and format always produce the same
/// bytes.
pub fn encode(
    snapshot: &SessionSnapshot,
    format: ExportFormat,
    pretty_json: bool,
) -> Result<Vec<u8>, ExportError> {
    if !snapshot.status.is_terminal() {
        return Err(ExportError::NotReady(snapshot.status));
    }
    if snapshot.records.is_empty() {
        return Err(ExportError::NoData);
    }

    match format {
        ExportFormat::Csv => encode_csv(&snapshot.records),
        ExportFormat::Json => encode_json(snapshot, pretty_json),
    }
}

/// Tabular form: one column per field, categories joined, coordinates split
/// into latitude/longitude.
fn encode_csv(records: &[Business]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "name",
            "address",
            "phone",
            "website",
            "rating",
            "reviews_count",
            "categories",
            "hours",
            "latitude",
            "longitude",
        ])
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    for record in records {
        let row = [
            record.name.clone(),
            record.address.clone().unwrap_or_default(),
            record.phone.clone().unwrap_or_default(),
            record.website.clone().unwrap_or_default(),
            record.rating.map(|r| r.to_string()).unwrap_or_default(),
            record
                .reviews_count
                .map(|c| c.to_string())
                .unwrap_or_default(),
            record.categories.join(", "),
            record.hours.clone().unwrap_or_default(),
            record
                .coordinates
                .map(|c| c.lat.to_string())
                .unwrap_or_default(),
            record
                .coordinates
                .map(|c| c.lng.to_string())
                .unwrap_or_default(),
        ];
        writer
            .write_record(&row)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Encode(e.to_string()))
}

/// Structured form: metadata plus the records with categories and
/// coordinates kept nested.
fn encode_json(snapshot: &SessionSnapshot, pretty: bool) -> Result<Vec<u8>, ExportError> {
    let document = ExportDocument {
        metadata: ExportMetadata {
            keywords: &snapshot.query.keywords,
            location: &snapshot.query.location,
            total_results: snapshot.records.len(),
            scraped_at: snapshot.completed_at.map(|t| t.to_rfc3339()),
        },
        results: &snapshot.records,
    };

    let encoded = if pretty {
        serde_json::to_vec_pretty(&document)
    } else {
        serde_json::to_vec(&document)
    };
    encoded.map_err(|e| ExportError::Encode(e.to_string()))
}

/// Attachment filename derived from the query, with filesystem-hostile
/// characters replaced.
pub fn download_filename(snapshot: &SessionSnapshot, format: ExportFormat) -> String {
    format!(
        "business_listings_{}_{}.{}",
        clean_filename(&snapshot.query.keywords),
        clean_filename(&snapshot.query.location),
        format.extension()
    )
}

fn clean_filename(part: &str) -> String {
    part.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            _ => c,
        })
        .collect()
}
