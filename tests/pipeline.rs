//! End-to-end checks: sheet in, pivot out.

use chrono::NaiveDate;
use fuel_report::config::Config;
use fuel_report::error::LoadError;
use fuel_report::filter::{filter_by_fuel_and_brand_pattern, filter_by_fuel_and_city};
use fuel_report::loader::{load_bytes, load_path, SourceFormat};
use fuel_report::pivot::build_pivot;
use fuel_report::types::{Aggregation, NormalizedTable, PriceRecord, RowKeyField};
use rust_xlsxwriter::Workbook;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rec(d: NaiveDate, fuel: &str, city: &str, brand: &str, price: f64) -> PriceRecord {
    PriceRecord {
        date: d,
        fuel_type: fuel.to_string(),
        city: city.to_string(),
        brand: brand.to_string(),
        price,
    }
}

fn sample_table() -> NormalizedTable {
    NormalizedTable::from_records(vec![
        rec(date(2024, 3, 1), "Diesel", "Ankara", "MOIL", 40.0),
        rec(date(2024, 3, 5), "Diesel", "Ankara", "MOIL", 42.5),
        rec(date(2024, 3, 1), "Diesel", "Ankara", "TOTAL", 41.0),
        rec(date(2024, 3, 5), "Diesel", "Ankara", "TOTAL", 43.0),
    ])
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn ankara_diesel_pivot() {
    let table = sample_table();
    let records =
        filter_by_fuel_and_city(&table, "Diesel", "Ankara", date(2024, 3, 1), date(2024, 3, 5))
            .unwrap();
    let m = build_pivot(&records, RowKeyField::Brand, Aggregation::LastWins, None);

    let keys: Vec<&str> = m.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["MOIL", "TOTAL"]);
    assert_eq!(
        m.column_labels(),
        vec!["Brand", "01.03.2024", "05.03.2024", "Delta"]
    );
    assert_eq!(m.row("MOIL").unwrap().delta, Some(2.5));
    assert_eq!(m.row("TOTAL").unwrap().delta, Some(2.0));
}

#[test]
fn absent_city_yields_empty_matrix() {
    let table = sample_table();
    let records =
        filter_by_fuel_and_city(&table, "Diesel", "Van", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
    assert!(records.is_empty());

    let m = build_pivot(&records, RowKeyField::Brand, Aggregation::LastWins, None);
    assert!(m.rows.is_empty());
    assert!(m.date_columns.is_empty());
    assert!(!m.has_delta());
}

#[test]
fn later_duplicate_wins_unless_mean_requested() {
    let csv = "Tarih,Fiyat,Yakıt Tipi,İl,Marka\n\
               01.03.2024,40,Diesel,Ankara,MOIL\n\
               05.03.2024,42,Diesel,Ankara,MOIL\n\
               01.03.2024,41,Diesel,Ankara,MOIL\n";
    let (table, _) = load_bytes(csv.as_bytes().to_vec(), SourceFormat::Csv, &Config::default())
        .unwrap();
    let records = filter_by_fuel_and_brand_pattern(&table, "Diesel", "moil");

    let last = build_pivot(&records, RowKeyField::Brand, Aggregation::LastWins, None);
    assert_eq!(last.rows[0].cells, vec![Some(41.0), Some(42.0)]);
    assert_eq!(last.rows[0].delta, Some(1.0));

    let mean = build_pivot(&records, RowKeyField::Brand, Aggregation::Mean, None);
    assert_eq!(mean.rows[0].cells, vec![Some(40.5), Some(42.0)]);
}

// ---------------------------------------------------------------------------
// Properties over a mixed sheet
// ---------------------------------------------------------------------------

fn mixed_csv() -> String {
    let mut s = String::from("Tarih,Fiyat,Yakıt Tipi,İl,Marka\n");
    let cities = ["Ankara", "İzmir", "Bursa"];
    let brands = ["MOİL", "TOTAL", "Shell", "Opet"];
    for i in 0..60u32 {
        let day = 28 - (i % 28);
        let city = cities[(i % 3) as usize];
        let brand = brands[(i % 4) as usize];
        let fuel = if i % 5 == 0 { "Benzin" } else { "Motorin" };
        let price = match i % 11 {
            0 => "yok".to_string(),
            1 => format!("\"{},{}\"", 40 + i % 7, i % 10),
            _ => format!("{}.{}", 40 + i % 7, i % 10),
        };
        let date = if i % 13 == 0 {
            "??".to_string()
        } else {
            format!("{:02}.02.2024", day)
        };
        s.push_str(&format!("{},{},{},{},{}\n", date, price, fuel, city, brand));
    }
    s
}

#[test]
fn loaded_table_is_sorted_and_clean() {
    let (table, report) =
        load_bytes(mixed_csv().into_bytes(), SourceFormat::Csv, &Config::default()).unwrap();
    assert_eq!(report.total_rows, 60);
    assert_eq!(report.kept_rows + report.dropped_rows(), 60);
    assert!(report.bad_dates > 0 && report.bad_prices > 0);
    assert_eq!(table.len(), report.kept_rows);
    assert!(table.records().windows(2).all(|w| w[0].date <= w[1].date));
    assert!(table.records().iter().all(|r| r.price >= 0.0));
}

#[test]
fn city_filter_and_pivot_shape() {
    let (table, _) =
        load_bytes(mixed_csv().into_bytes(), SourceFormat::Csv, &Config::default()).unwrap();
    let (from, to) = (date(2024, 2, 5), date(2024, 2, 20));
    let records = filter_by_fuel_and_city(&table, "Motorin", "Ankara", from, to).unwrap();
    assert!(records
        .iter()
        .all(|r| r.fuel_type == "Motorin" && r.city == "Ankara" && r.date >= from && r.date <= to));

    let m = build_pivot(&records, RowKeyField::Brand, Aggregation::LastWins, None);
    let mut keys: Vec<&str> = records.iter().map(|r| r.brand.as_str()).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(
        m.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
        keys
    );

    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.dedup();
    assert_eq!(m.date_columns, dates);
    let expected_cols = dates.len() + 1 + usize::from(dates.len() >= 2);
    assert_eq!(m.column_labels().len(), expected_cols);

    for row in &m.rows {
        let expected = match (row.cells.first(), row.cells.last()) {
            (Some(Some(a)), Some(Some(b))) if m.has_delta() => Some(b - a),
            _ => None,
        };
        assert_eq!(row.delta, expected);
    }

    assert_eq!(
        m,
        build_pivot(&records, RowKeyField::Brand, Aggregation::LastWins, None)
    );
}

// ---------------------------------------------------------------------------
// Workbooks
// ---------------------------------------------------------------------------

fn write_workbook() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, h) in ["Tarih", "Fiyat", "Yakıt Tipi", "İl", "Marka"].iter().enumerate() {
        sheet.write_string(0, c as u16, *h).unwrap();
    }
    // Row 1 uses an Excel serial date, the others day-first text.
    sheet.write_number(1, 0, 45352.0).unwrap();
    sheet.write_number(1, 1, 40.0).unwrap();
    sheet.write_string(2, 0, "05.03.2024").unwrap();
    sheet.write_string(2, 1, "42,50").unwrap();
    sheet.write_string(3, 0, "not a date").unwrap();
    sheet.write_number(3, 1, 41.0).unwrap();
    for row in 1..=3u32 {
        sheet.write_string(row, 2, "Motorin").unwrap();
        sheet.write_string(row, 3, "Ankara").unwrap();
        sheet.write_string(row, 4, "MOİL").unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn xlsx_bytes_load() {
    let (table, report) =
        load_bytes(write_workbook(), SourceFormat::Workbook, &Config::default()).unwrap();
    assert_eq!(report.kept_rows, 2);
    assert_eq!(report.bad_dates, 1);
    let got: Vec<(NaiveDate, f64)> = table.records().iter().map(|r| (r.date, r.price)).collect();
    assert_eq!(
        got,
        vec![(date(2024, 3, 1), 40.0), (date(2024, 3, 5), 42.5)]
    );
}

#[test]
fn xlsx_file_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("varsayilan_veri.xlsx");
    std::fs::write(&path, write_workbook()).unwrap();
    let (table, _) = load_path(&path, &Config::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.records()[0].brand, "MOİL");
}

#[test]
fn empty_worksheet_is_unreadable() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    let bytes = workbook.save_to_buffer().unwrap();
    let err = load_bytes(bytes, SourceFormat::Workbook, &Config::default()).unwrap_err();
    assert!(matches!(err, LoadError::Unreadable(_)));
}
