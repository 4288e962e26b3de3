use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::info;

pub const APPLICANT_COLUMN: &str = "Applicant";
pub const FILING_DATE_COLUMN: &str = "Filing Date";

/// Cell values read as missing, matching the NA markers of common CSV exports.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const INFERRED_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y%m%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
];

const INFERRED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateFormat {
    /// Try a fixed list of common layouts until one parses.
    Infer,
    /// A single chrono format string.
    Pattern(String),
}

impl DateFormat {
    pub fn parse(&self, value: &str) -> Option<NaiveDate> {
        match self {
            DateFormat::Pattern(pattern) => NaiveDate::parse_from_str(value, pattern).ok(),
            DateFormat::Infer => infer_date(value),
        }
    }
}

fn infer_date(value: &str) -> Option<NaiveDate> {
    INFERRED_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            INFERRED_DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// The two patent datasets the dashboard covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    MoldedFiber,
    DryForming,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 2] = [DatasetKind::MoldedFiber, DatasetKind::DryForming];

    pub fn slug(self) -> &'static str {
        match self {
            DatasetKind::MoldedFiber => "molded_fiber",
            DatasetKind::DryForming => "dry_forming",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            DatasetKind::MoldedFiber => "Patent applications for Molded Fiber Packaging",
            DatasetKind::DryForming => "Patent applications for dry-forming and cellulose",
        }
    }

    pub fn default_csv(self) -> &'static str {
        match self {
            DatasetKind::MoldedFiber => "molded_fiber_packaging.csv",
            DatasetKind::DryForming => "dry-forming-cellulose.csv",
        }
    }

    pub fn date_format(self) -> DateFormat {
        match self {
            DatasetKind::MoldedFiber => DateFormat::Infer,
            DatasetKind::DryForming => DateFormat::Pattern("%d.%m.%Y".to_string()),
        }
    }

    /// Smallest filing count an applicant needs to get a slice of the pie.
    pub fn pie_min_count(self) -> u32 {
        match self {
            DatasetKind::MoldedFiber => 3,
            DatasetKind::DryForming => 1,
        }
    }

    /// Smallest filing count an applicant needs to get its own cumulative series.
    pub fn series_min_count(self) -> u32 {
        match self {
            DatasetKind::MoldedFiber => 3,
            DatasetKind::DryForming => 2,
        }
    }

    pub fn pie_title(self) -> &'static str {
        match self {
            DatasetKind::MoldedFiber => {
                "Proportion of patents. Applicants with greater than 3 patents"
            }
            DatasetKind::DryForming => "Proportion of patents",
        }
    }

    pub fn cumulative_title(self) -> &'static str {
        "Cumulative Number of Patents Filed Per Year"
    }

    pub fn applicant_cumulative_title(self) -> &'static str {
        match self {
            DatasetKind::MoldedFiber => {
                "Cumulative number of patents filed per year by applicant (more than 3 patents)"
            }
            DatasetKind::DryForming => {
                "Cumulative number of patents filed per year by applicant (more than 2 patents)"
            }
        }
    }
}

/// One row of a patent export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilingRecord {
    pub applicant: Option<String>,
    pub filing_date: Option<NaiveDate>,
}

impl FilingRecord {
    pub fn new(applicant: Option<&str>, filing_date: Option<NaiveDate>) -> Self {
        Self {
            applicant: applicant.map(str::to_string),
            filing_date,
        }
    }

    pub fn year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.filing_date.map(|date| date.year())
    }
}

fn is_missing(value: &str) -> bool {
    MISSING_MARKERS.contains(&value)
}

/// Finds a named column, skipping the leading row-index column.
fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, header)| *header == name)
        .map(|(idx, _)| idx)
        .ok_or_else(|| anyhow::anyhow!("Column '{}' not found in CSV", name))
}

pub fn read_filings<R: Read>(reader: R, date_format: &DateFormat) -> Result<Vec<FilingRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    let applicant_idx = column_index(&headers, APPLICANT_COLUMN)?;
    let date_idx = column_index(&headers, FILING_DATE_COLUMN)?;

    let mut records = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("Failed to read CSV row {}", row_num + 1))?;

        let applicant = row.get(applicant_idx).filter(|value| !is_missing(value));

        let filing_date = match row.get(date_idx).map(str::trim).filter(|value| !is_missing(value)) {
            Some(raw) => Some(date_format.parse(raw).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unparseable filing date '{}' at row {} ({:?})",
                    raw,
                    row_num + 1,
                    date_format
                )
            })?),
            None => None,
        };

        records.push(FilingRecord::new(applicant, filing_date));
    }

    Ok(records)
}

pub fn load_filings(path: &Path, date_format: &DateFormat) -> Result<Vec<FilingRecord>> {
    let start_time = Instant::now();
    info!(action = "start", component = "csv_load", file_path = ?path, "Loading filing records");

    if !path.exists() {
        anyhow::bail!("Dataset file not found at {:?}", path);
    }

    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let records =
        read_filings(file, date_format).with_context(|| format!("Failed to load {:?}", path))?;

    info!(
        action = "complete",
        component = "csv_load",
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Filing records loaded"
    );
    Ok(records)
}
