use crate::error::FilterError;
use crate::types::{FilterSelection, NormalizedTable, PriceRecord};
use crate::util::contains_folded;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), FilterError> {
    if from > to {
        Err(FilterError::InvalidRange { from, to })
    } else {
        Ok(())
    }
}

/// Records of one fuel type in one city between two dates, inclusive.
pub fn filter_by_fuel_and_city(
    table: &NormalizedTable,
    fuel_type: &str,
    city: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> Result<Vec<PriceRecord>, FilterError> {
    check_range(date_from, date_to)?;
    Ok(table
        .records()
        .iter()
        .filter(|r| r.fuel_type == fuel_type && r.city == city)
        .filter(|r| r.date >= date_from && r.date <= date_to)
        .cloned()
        .collect())
}

/// Records of one fuel type whose brand contains `brand_substring`,
/// ignoring case.
pub fn filter_by_fuel_and_brand_pattern(
    table: &NormalizedTable,
    fuel_type: &str,
    brand_substring: &str,
) -> Vec<PriceRecord> {
    table
        .records()
        .iter()
        .filter(|r| r.fuel_type == fuel_type && contains_folded(&r.brand, brand_substring))
        .cloned()
        .collect()
}

/// General form: every criterion set in `sel` must hold.
pub fn apply(
    table: &NormalizedTable,
    sel: &FilterSelection,
) -> Result<Vec<PriceRecord>, FilterError> {
    check_range(sel.date_from, sel.date_to)?;
    let records: Vec<PriceRecord> = table
        .records()
        .iter()
        .filter(|r| r.fuel_type == sel.fuel_type)
        .filter(|r| sel.city.as_deref().map_or(true, |c| r.city == c))
        .filter(|r| {
            sel.brand_pattern
                .as_deref()
                .map_or(true, |p| contains_folded(&r.brand, p))
        })
        .filter(|r| r.date >= sel.date_from && r.date <= sel.date_to)
        .cloned()
        .collect();
    log::debug!("{:?} matched {} records", sel, records.len());
    Ok(records)
}

/// Distinct fuel types in the order they first appear.
pub fn fuel_types(table: &NormalizedTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .records()
        .iter()
        .filter(|r| seen.insert(r.fuel_type.as_str()))
        .map(|r| r.fuel_type.clone())
        .collect()
}

pub fn cities(table: &NormalizedTable) -> Vec<String> {
    let set: BTreeSet<&str> = table.records().iter().map(|r| r.city.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Sorted distinct dates with data for a fuel type in a city.
pub fn available_dates(table: &NormalizedTable, fuel_type: &str, city: &str) -> Vec<NaiveDate> {
    let set: BTreeSet<NaiveDate> = table
        .records()
        .iter()
        .filter(|r| r.fuel_type == fuel_type && r.city == city)
        .map(|r| r.date)
        .collect();
    set.into_iter().collect()
}
