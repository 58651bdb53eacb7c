use crate::types::{Aggregation, PivotMatrix, PivotRow, PriceRecord, RowKeyField};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Running state of one (row, date) cell.
#[derive(Default)]
struct CellAcc {
    last: f64,
    sum: f64,
    count: usize,
}

impl CellAcc {
    fn push(&mut self, price: f64) {
        self.last = price;
        self.sum += price;
        self.count += 1;
    }

    fn value(&self, aggregation: Aggregation) -> f64 {
        match aggregation {
            Aggregation::LastWins => self.last,
            Aggregation::Mean => self.sum / self.count as f64,
        }
    }
}

/// Reshape records into a row-key × date matrix with a trailing delta.
///
/// - Rows are the distinct `row_key` values, sorted.
/// - Columns are the distinct dates (limited to `range` when given), sorted.
/// - Several records in one cell are combined per `aggregation`.
/// - Delta is last column minus first column, and only exists with two or
///   more date columns.
pub fn build_pivot(
    records: &[PriceRecord],
    row_key: RowKeyField,
    aggregation: Aggregation,
    range: Option<(NaiveDate, NaiveDate)>,
) -> PivotMatrix {
    let in_range = |d: NaiveDate| range.map_or(true, |(from, to)| d >= from && d <= to);

    let mut cells: BTreeMap<&str, BTreeMap<NaiveDate, CellAcc>> = BTreeMap::new();
    let mut dates: BTreeSet<NaiveDate> = BTreeSet::new();
    for r in records.iter().filter(|r| in_range(r.date)) {
        dates.insert(r.date);
        cells
            .entry(row_key.value_of(r))
            .or_default()
            .entry(r.date)
            .or_default()
            .push(r.price);
    }
    if cells.is_empty() {
        return PivotMatrix::empty(row_key);
    }

    let date_columns: Vec<NaiveDate> = dates.into_iter().collect();
    let with_delta = date_columns.len() >= 2;
    let rows = cells
        .into_iter()
        .map(|(key, by_date)| {
            let row_cells: Vec<Option<f64>> = date_columns
                .iter()
                .map(|d| by_date.get(d).map(|acc| acc.value(aggregation)))
                .collect();
            let delta = if with_delta {
                match (row_cells.first(), row_cells.last()) {
                    (Some(Some(first)), Some(Some(last))) => Some(last - first),
                    _ => None,
                }
            } else {
                None
            };
            PivotRow {
                key: key.to_string(),
                cells: row_cells,
                delta,
            }
        })
        .collect();

    PivotMatrix {
        row_key,
        date_columns,
        rows,
    }
}
