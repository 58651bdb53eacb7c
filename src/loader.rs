use crate::config::{ColumnMapping, Config};
use crate::error::LoadError;
use crate::types::{DataSource, NormalizedTable, PriceRecord};
use crate::util::{
    excel_serial_to_date, fold_case, format_date, parse_day_first_date, parse_price, valid_price,
};
use calamine::{open_workbook_auto_from_rs, Data, Reader, Sheets};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Serialize;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

/// Row counts collected while cleaning a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub bad_dates: usize,
    pub bad_prices: usize,
    pub malformed_rows: usize,
}

impl LoadReport {
    pub fn dropped_rows(&self) -> usize {
        self.bad_dates + self.bad_prices + self.malformed_rows
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// Anything calamine opens: xlsx, xlsm, xlsb, xls, ods.
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(SourceFormat::Csv),
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => Ok(SourceFormat::Workbook),
            Some(other) => Err(LoadError::Unreadable(format!(
                "unsupported file extension: {}",
                other
            ))),
            None => Err(LoadError::Unreadable(format!(
                "{} has no file extension",
                path.display()
            ))),
        }
    }
}

/// Pick the user's file when given, else the configured default if it
/// exists. `None` means there is nothing to show yet.
pub fn resolve_source(user_file: Option<PathBuf>, config: &Config) -> Option<DataSource> {
    if let Some(path) = user_file {
        return Some(DataSource::UserSupplied(path));
    }
    if config.default_file.is_file() {
        Some(DataSource::SystemDefault(config.default_file.clone()))
    } else {
        log::warn!(
            "No file selected and default file {} not found",
            config.default_file.display()
        );
        None
    }
}

pub fn load_source(
    source: &DataSource,
    config: &Config,
) -> Result<(NormalizedTable, LoadReport), LoadError> {
    log::info!("Loading {} ({})", source.path().display(), source.label());
    load_path(source.path(), config)
}

pub fn load_path(path: &Path, config: &Config) -> Result<(NormalizedTable, LoadReport), LoadError> {
    let format = SourceFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    load_bytes(bytes, format, config)
}

/// Load from an in-memory upload.
pub fn load_bytes(
    bytes: Vec<u8>,
    format: SourceFormat,
    config: &Config,
) -> Result<(NormalizedTable, LoadReport), LoadError> {
    let sheet = match format {
        SourceFormat::Csv => read_csv(Cursor::new(bytes), config.csv_delimiter)?,
        SourceFormat::Workbook => read_workbook(open_workbook_auto_from_rs(Cursor::new(bytes))?)?,
    };
    normalize(sheet, &config.columns)
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl Cell {
    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Header plus data rows; `None` marks a row the reader could not decode.
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Option<Vec<Cell>>>,
}

fn text_cell(s: &str) -> Cell {
    let s = s.trim();
    if s.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

fn read_csv<R: Read>(input: R, delimiter: char) -> Result<RawSheet, LoadError> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| LoadError::Unreadable(format!("delimiter {:?} is not ASCII", delimiter)))?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Unreadable("no header row".to_string()));
    }

    let rows: Vec<Option<Vec<Cell>>> = rdr
        .records()
        .map(|result| result.ok().map(|rec| rec.iter().map(text_cell).collect()))
        .collect();
    Ok(RawSheet { headers, rows })
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) => text_cell(s),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::Bool(b) => Cell::Text(b.to_string()),
        _ => Cell::Empty,
    }
}

fn read_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<RawSheet, LoadError> {
    // Only the first sheet carries data.
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::Unreadable("workbook has no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| LoadError::Unreadable(format!("sheet '{}' is empty", sheet_name)))?
        .iter()
        .map(|c| match workbook_cell(c) {
            Cell::Text(s) => s,
            Cell::Number(n) => n.to_string(),
            Cell::Date(d) => format_date(d),
            Cell::Empty => String::new(),
        })
        .collect();
    let rows: Vec<Option<Vec<Cell>>> = rows
        .map(|r| Some(r.iter().map(workbook_cell).collect()))
        .collect();
    Ok(RawSheet { headers, rows })
}

struct ColumnIndex {
    date: usize,
    price: usize,
    fuel_type: usize,
    city: usize,
    brand: usize,
}

impl ColumnIndex {
    fn locate(headers: &[String], mapping: &ColumnMapping) -> Result<Self, LoadError> {
        Ok(Self {
            date: find_column(headers, &mapping.date)?,
            price: find_column(headers, &mapping.price)?,
            fuel_type: find_column(headers, &mapping.fuel_type)?,
            city: find_column(headers, &mapping.city)?,
            brand: find_column(headers, &mapping.brand)?,
        })
    }
}

fn find_column(headers: &[String], name: &str) -> Result<usize, LoadError> {
    let name = name.trim();
    headers
        .iter()
        .position(|h| h == name)
        .or_else(|| {
            let folded = fold_case(name);
            headers.iter().position(|h| fold_case(h) == folded)
        })
        .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
}

fn cell_date(cell: Option<&Cell>) -> Option<NaiveDate> {
    match cell? {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => excel_serial_to_date(*n),
        Cell::Text(s) => parse_day_first_date(s),
        Cell::Empty => None,
    }
}

fn cell_price(cell: Option<&Cell>) -> Option<f64> {
    match cell? {
        Cell::Number(n) => valid_price(*n),
        Cell::Text(s) => parse_price(s),
        Cell::Date(_) | Cell::Empty => None,
    }
}

fn cell_text(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Text(s)) => s.clone(),
        Some(Cell::Number(n)) if n.fract() == 0.0 => format!("{}", *n as i64),
        Some(Cell::Number(n)) => n.to_string(),
        Some(Cell::Date(d)) => format_date(*d),
        Some(Cell::Empty) | None => String::new(),
    }
}

fn normalize(
    sheet: RawSheet,
    mapping: &ColumnMapping,
) -> Result<(NormalizedTable, LoadReport), LoadError> {
    let idx = ColumnIndex::locate(&sheet.headers, mapping)?;
    let mut report = LoadReport::default();
    let mut records = Vec::new();

    for (i, row) in sheet.rows.into_iter().enumerate() {
        // Sheet line number, counting the header as line 1.
        let line = i + 2;
        let Some(row) = row else {
            report.total_rows += 1;
            report.malformed_rows += 1;
            log::debug!("line {}: undecodable row dropped", line);
            continue;
        };
        if row.iter().all(Cell::is_empty) {
            continue;
        }
        report.total_rows += 1;

        let Some(date) = cell_date(row.get(idx.date)) else {
            report.bad_dates += 1;
            log::debug!("line {}: unparsable date {:?}", line, row.get(idx.date));
            continue;
        };
        let Some(price) = cell_price(row.get(idx.price)) else {
            report.bad_prices += 1;
            log::debug!("line {}: unparsable price {:?}", line, row.get(idx.price));
            continue;
        };

        records.push(PriceRecord {
            date,
            fuel_type: cell_text(row.get(idx.fuel_type)),
            city: cell_text(row.get(idx.city)),
            brand: cell_text(row.get(idx.brand)),
            price,
        });
    }

    report.kept_rows = records.len();
    log::info!(
        "Loaded {} rows ({} kept, {} dropped)",
        report.total_rows,
        report.kept_rows,
        report.dropped_rows()
    );
    Ok((NormalizedTable::from_records(records), report))
}
