use crate::error::FilterError;
use crate::filter::{self, available_dates};
use crate::pivot::build_pivot;
use crate::style::{delta_style, HighlightRule};
use crate::types::{
    Aggregation, DeltaStyle, FilterSelection, NormalizedTable, OverviewRow, PriceReport,
    ReportSummary, RowKeyField,
};
use crate::util::{format_date, format_int};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// Selection covering every date recorded for `fuel_type` in `city`, or
/// `None` when the city has no such data.
pub fn default_city_selection(
    table: &NormalizedTable,
    fuel_type: &str,
    city: &str,
) -> Option<FilterSelection> {
    let dates = available_dates(table, fuel_type, city);
    Some(FilterSelection {
        fuel_type: fuel_type.to_string(),
        city: Some(city.to_string()),
        brand_pattern: None,
        date_from: *dates.first()?,
        date_to: *dates.last()?,
    })
}

/// Brands of one city side by side. Duplicate entries keep the last price.
pub fn generate_city_report(
    table: &NormalizedTable,
    sel: &FilterSelection,
    highlight: &HighlightRule,
    source_label: &str,
) -> Result<PriceReport, FilterError> {
    let records = filter::apply(table, sel)?;
    let matrix = build_pivot(
        &records,
        RowKeyField::Brand,
        Aggregation::LastWins,
        Some((sel.date_from, sel.date_to)),
    );
    let row_styles = highlight.per_row(&matrix);
    let subject = sel.city.clone().unwrap_or_default();
    log::info!(
        "City report {} / {}: {} brands, {} dates",
        sel.fuel_type,
        subject,
        matrix.rows.len(),
        matrix.date_columns.len()
    );
    Ok(PriceReport {
        title: format!("{} - {}", sel.fuel_type, subject),
        source_label: source_label.to_string(),
        fuel_type: sel.fuel_type.clone(),
        subject,
        period: Some((sel.date_from, sel.date_to)),
        delta_styles: matrix.rows.iter().map(|r| delta_style(r.delta)).collect(),
        row_styles,
        matrix,
    })
}

/// One brand across all cities. Several stations of the brand in a city on
/// the same day are averaged.
pub fn generate_brand_matrix(
    table: &NormalizedTable,
    fuel_type: &str,
    brand: &str,
    highlight: &HighlightRule,
    source_label: &str,
) -> PriceReport {
    let records = filter::filter_by_fuel_and_brand_pattern(table, fuel_type, brand);
    let matrix = build_pivot(&records, RowKeyField::City, Aggregation::Mean, None);
    let period = match (matrix.date_columns.first(), matrix.date_columns.last()) {
        (Some(first), Some(last)) => Some((*first, *last)),
        _ => None,
    };
    let row_styles = highlight.uniform(&matrix, brand);
    log::info!(
        "Brand matrix {} / {}: {} cities, {} dates",
        fuel_type,
        brand,
        matrix.rows.len(),
        matrix.date_columns.len()
    );
    PriceReport {
        title: format!("All cities - {} ({})", brand, fuel_type),
        source_label: source_label.to_string(),
        fuel_type: fuel_type.to_string(),
        subject: brand.to_string(),
        period,
        delta_styles: matrix.rows.iter().map(|r| delta_style(r.delta)).collect(),
        row_styles,
        matrix,
    }
}

/// Record counts and date span per fuel type, in first-seen fuel order.
pub fn generate_overview(table: &NormalizedTable) -> Vec<OverviewRow> {
    #[derive(Default)]
    struct Acc<'a> {
        records: usize,
        cities: HashSet<&'a str>,
        brands: HashSet<&'a str>,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    }

    let order = filter::fuel_types(table);
    let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
    for r in table.records() {
        let e = map.entry(r.fuel_type.as_str()).or_default();
        e.records += 1;
        e.cities.insert(&r.city);
        e.brands.insert(&r.brand);
        // Records are date-sorted, so the first one seen is the earliest.
        e.first = e.first.or(Some(r.date));
        e.last = Some(r.date);
    }

    order
        .iter()
        .filter_map(|fuel| {
            let acc = map.get(fuel.as_str())?;
            Some(OverviewRow {
                fuel_type: fuel.clone(),
                records: format_int(acc.records),
                cities: acc.cities.len(),
                brands: acc.brands.len(),
                first_date: acc.first.map(format_date).unwrap_or_default(),
                last_date: acc.last.map(format_date).unwrap_or_default(),
            })
        })
        .collect()
}

pub fn summarize(report: &PriceReport, export_file: &str) -> ReportSummary {
    let count = |style: DeltaStyle| report.delta_styles.iter().filter(|s| **s == style).count();
    ReportSummary {
        title: report.title.clone(),
        source: report.source_label.clone(),
        fuel_type: report.fuel_type.clone(),
        rows: report.matrix.rows.len(),
        date_columns: report.matrix.date_columns.len(),
        rising: count(DeltaStyle::Rise),
        falling: count(DeltaStyle::Fall),
        export_file: export_file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{HighlightToken, PriceRecord};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn rec(day: u32, fuel: &str, city: &str, brand: &str, price: f64) -> PriceRecord {
        PriceRecord {
            date: d(day),
            fuel_type: fuel.to_string(),
            city: city.to_string(),
            brand: brand.to_string(),
            price,
        }
    }

    fn table() -> NormalizedTable {
        NormalizedTable::from_records(vec![
            rec(1, "Motorin", "Ankara", "MOİL", 40.0),
            rec(5, "Motorin", "Ankara", "MOİL", 42.5),
            rec(1, "Motorin", "Ankara", "Shell", 41.0),
            rec(5, "Motorin", "Ankara", "Shell", 40.0),
            rec(1, "Motorin", "İzmir", "Moil Petrol", 40.0),
            rec(1, "Motorin", "İzmir", "MOİL", 42.0),
            rec(5, "Motorin", "İzmir", "MOİL", 43.0),
            rec(3, "Benzin", "Ankara", "TOTAL", 45.0),
        ])
    }

    fn rule() -> HighlightRule {
        HighlightRule::new(Config::default().highlights)
    }

    #[test]
    fn default_selection_spans_available_dates() {
        let sel = default_city_selection(&table(), "Motorin", "Ankara").unwrap();
        assert_eq!((sel.date_from, sel.date_to), (d(1), d(5)));
        assert!(default_city_selection(&table(), "Motorin", "Van").is_none());
    }

    #[test]
    fn city_report_styles_rows_and_deltas() {
        let t = table();
        let sel = default_city_selection(&t, "Motorin", "Ankara").unwrap();
        let report = generate_city_report(&t, &sel, &rule(), "User upload").unwrap();

        assert_eq!(report.title, "Motorin - Ankara");
        assert_eq!(report.matrix.rows.len(), 2);
        assert_eq!(
            report.row_styles,
            vec![HighlightToken::Primary, HighlightToken::None]
        );
        assert_eq!(report.delta_styles, vec![DeltaStyle::Rise, DeltaStyle::Fall]);
        assert!(!report.is_no_data());
    }

    #[test]
    fn city_report_rejects_inverted_range() {
        let t = table();
        let sel = FilterSelection {
            fuel_type: "Motorin".to_string(),
            city: Some("Ankara".to_string()),
            brand_pattern: None,
            date_from: d(5),
            date_to: d(1),
        };
        assert!(generate_city_report(&t, &sel, &rule(), "x").is_err());
    }

    #[test]
    fn brand_matrix_averages_per_city() {
        let report = generate_brand_matrix(&table(), "Motorin", "MOİL", &rule(), "x");
        let izmir = report.matrix.row("İzmir").unwrap();
        assert_eq!(izmir.cells, vec![Some(41.0), Some(43.0)]);
        assert_eq!(izmir.delta, Some(2.0));
        assert_eq!(report.period, Some((d(1), d(5))));
        assert!(report
            .row_styles
            .iter()
            .all(|s| *s == HighlightToken::Primary));
    }

    #[test]
    fn brand_matrix_without_matches_is_no_data() {
        let report = generate_brand_matrix(&table(), "Benzin", "MOİL", &rule(), "x");
        assert!(report.is_no_data());
        assert_eq!(report.period, None);
    }

    #[test]
    fn overview_follows_fuel_order() {
        let rows = generate_overview(&table());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].fuel_type, "Motorin");
        assert_eq!(rows[0].records, "7");
        assert_eq!(rows[0].cities, 2);
        assert_eq!(rows[0].brands, 3);
        assert_eq!(rows[0].first_date, "01.03.2024");
        assert_eq!(rows[0].last_date, "05.03.2024");
        assert_eq!(rows[1].fuel_type, "Benzin");
    }

    #[test]
    fn summary_counts_moves() {
        let t = table();
        let sel = default_city_selection(&t, "Motorin", "Ankara").unwrap();
        let report = generate_city_report(&t, &sel, &rule(), "User upload").unwrap();
        let s = summarize(&report, "city.csv");
        assert_eq!((s.rows, s.date_columns, s.rising, s.falling), (2, 2, 1, 1));
    }
}
