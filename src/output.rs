use crate::error::Result;
use crate::types::{DeltaStyle, HighlightToken, PivotMatrix, PriceReport};
use crate::util::{format_date, format_number, format_price};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Raw matrix as CSV: header row then one line per row key. Missing cells
/// are left empty.
pub fn write_pivot_csv(path: &Path, matrix: &PivotMatrix) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(matrix.column_labels())?;
    for row in &matrix.rows {
        let mut record = Vec::with_capacity(row.cells.len() + 2);
        record.push(row.key.clone());
        record.extend(
            row.cells
                .iter()
                .map(|c| c.map(|v| format!("{:.2}", v)).unwrap_or_default()),
        );
        if matrix.has_delta() {
            record.push(row.delta.map(|v| format!("{:.2}", v)).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

fn delta_text(delta: Option<f64>, style: DeltaStyle) -> String {
    match (delta, style) {
        (Some(v), DeltaStyle::Rise) => format!("+{} ▲", format_number(v, 2)),
        (Some(v), DeltaStyle::Fall) => format!("{} ▼", format_number(v, 2)),
        (Some(v), _) => format_number(v, 2),
        (None, _) => "-".to_string(),
    }
}

fn key_text(key: &str, token: HighlightToken) -> String {
    match token {
        HighlightToken::Primary => format!("**{}**", key),
        HighlightToken::Secondary => format!("_{}_", key),
        HighlightToken::None => key.to_string(),
    }
}

/// Markdown table for a report: highlighted row keys in bold or italics,
/// rising and falling deltas marked with arrows.
pub fn render_report(report: &PriceReport) -> String {
    let matrix = &report.matrix;
    let mut builder = Builder::default();
    builder.push_record(matrix.column_labels());
    for (i, row) in matrix.rows.iter().enumerate() {
        let token = report
            .row_styles
            .get(i)
            .copied()
            .unwrap_or(HighlightToken::None);
        let mut record = vec![key_text(&row.key, token)];
        record.extend(row.cells.iter().map(|c| format_price(*c)));
        if matrix.has_delta() {
            let style = report
                .delta_styles
                .get(i)
                .copied()
                .unwrap_or(DeltaStyle::Absent);
            record.push(delta_text(row.delta, style));
        }
        builder.push_record(record);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn print_report(report: &PriceReport) {
    println!("{}", report.title);
    match report.period {
        Some((from, to)) => println!(
            "{} - {} | Source: {}\n",
            format_date(from),
            format_date(to),
            report.source_label
        ),
        None => println!("Source: {}\n", report.source_label),
    }
    if report.is_no_data() {
        println!("No data for this selection.\n");
        return;
    }
    println!("{}\n", render_report(report));
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
