use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tabled::Tabled;

/// One cleaned row of the price sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub fuel_type: String,
    pub city: String,
    pub brand: String,
    pub price: f64,
}

/// Cleaned records sorted ascending by date.
///
/// The sort is stable, so records sharing a date keep the order they had in
/// the source sheet. There is no way to mutate a table once built; a reload
/// produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTable {
    records: Vec<PriceRecord>,
}

impl NormalizedTable {
    pub fn from_records(mut records: Vec<PriceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What the user picked for one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub fuel_type: String,
    pub city: Option<String>,
    pub brand_pattern: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Field used as the row dimension of a pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKeyField {
    Brand,
    City,
}

impl RowKeyField {
    pub fn label(self) -> &'static str {
        match self {
            RowKeyField::Brand => "Brand",
            RowKeyField::City => "City",
        }
    }

    pub fn value_of(self, record: &PriceRecord) -> &str {
        match self {
            RowKeyField::Brand => &record.brand,
            RowKeyField::City => &record.city,
        }
    }
}

/// How several prices landing in the same pivot cell are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Aggregation {
    /// Keep the price of the last record in input order.
    #[default]
    LastWins,
    /// Arithmetic mean of all prices in the cell.
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub key: String,
    /// One entry per date column, `None` when the row has no price that day.
    pub cells: Vec<Option<f64>>,
    pub delta: Option<f64>,
}

/// Rows keyed by brand or city, one column per date, plus a trailing delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotMatrix {
    pub row_key: RowKeyField,
    pub date_columns: Vec<NaiveDate>,
    pub rows: Vec<PivotRow>,
}

impl PivotMatrix {
    pub const DELTA_LABEL: &'static str = "Delta";
    pub const DATE_LABEL_FORMAT: &'static str = "%d.%m.%Y";

    pub fn empty(row_key: RowKeyField) -> Self {
        Self {
            row_key,
            date_columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// The delta column exists only when there are two or more dates.
    pub fn has_delta(&self) -> bool {
        self.date_columns.len() >= 2
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header labels in display order: row key, dates, then delta if present.
    pub fn column_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.date_columns.len() + 2);
        labels.push(self.row_key.label().to_string());
        labels.extend(
            self.date_columns
                .iter()
                .map(|d| d.format(Self::DATE_LABEL_FORMAT).to_string()),
        );
        if self.has_delta() {
            labels.push(Self::DELTA_LABEL.to_string());
        }
        labels
    }

    pub fn row(&self, key: &str) -> Option<&PivotRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

/// Style token for a whole row, resolved from the configured brand rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightToken {
    Primary,
    Secondary,
    None,
}

/// Style token for a delta cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeltaStyle {
    Rise,
    Fall,
    Flat,
    Absent,
}

/// Where the loaded table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    UserSupplied(PathBuf),
    SystemDefault(PathBuf),
}

impl DataSource {
    pub fn path(&self) -> &PathBuf {
        match self {
            DataSource::UserSupplied(p) | DataSource::SystemDefault(p) => p,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataSource::UserSupplied(_) => "User upload",
            DataSource::SystemDefault(_) => "System default report",
        }
    }
}

/// Per fuel type overview printed after a load.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OverviewRow {
    #[serde(rename = "FuelType")]
    #[tabled(rename = "FuelType")]
    pub fuel_type: String,
    #[serde(rename = "Records")]
    #[tabled(rename = "Records")]
    pub records: String,
    #[serde(rename = "Cities")]
    #[tabled(rename = "Cities")]
    pub cities: usize,
    #[serde(rename = "Brands")]
    #[tabled(rename = "Brands")]
    pub brands: usize,
    #[serde(rename = "FirstDate")]
    #[tabled(rename = "FirstDate")]
    pub first_date: String,
    #[serde(rename = "LastDate")]
    #[tabled(rename = "LastDate")]
    pub last_date: String,
}

/// What each generated table looked like, written to the JSON summary.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub title: String,
    pub source: String,
    pub fuel_type: String,
    pub rows: usize,
    pub date_columns: usize,
    pub rising: usize,
    pub falling: usize,
    pub export_file: String,
}

/// A pivot ready for display, with style tokens aligned to its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceReport {
    pub title: String,
    pub source_label: String,
    pub fuel_type: String,
    /// City or brand pattern the report is about.
    pub subject: String,
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub matrix: PivotMatrix,
    pub row_styles: Vec<HighlightToken>,
    pub delta_styles: Vec<DeltaStyle>,
}

impl PriceReport {
    /// Nothing matched the selection; shown as an empty state, not an error.
    pub fn is_no_data(&self) -> bool {
        self.matrix.is_empty()
    }
}
