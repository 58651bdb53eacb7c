// Parsing and formatting helpers.
//
// Everything that has to cope with messy spreadsheet cells lives here so the
// loader and reports only ever see typed values.
use chrono::{Datelike, Duration, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Day-first layouts tried in order, followed by ISO.
const DATE_FORMATS: &[&str] = &[
    "%d.%m.%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%y", "%d/%m/%y", "%Y-%m-%d", "%Y/%m/%d",
];

/// Parse a price written with either `.` or `,` as the decimal separator.
///
/// - Trims whitespace, including non-breaking spaces.
/// - Spaces inside the number are dropped, so they act as thousands
///   separators: `1 234,5` is 1234.5.
/// - Rejects values that contain alphabetic characters.
/// - When both separators appear, the rightmost one is the decimal mark.
/// - A lone separator that repeats is treated as a thousands separator.
/// - Negative and non-finite results are rejected.
pub fn parse_price(s: &str) -> Option<f64> {
    let s: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if s.is_empty() || s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    let last_dot = s.rfind('.');
    let last_comma = s.rfind(',');
    let normalized = match (last_dot, last_comma) {
        (Some(d), Some(c)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (None, Some(_)) if s.matches(',').count() == 1 => s.replace(',', "."),
        (None, Some(_)) => s.replace(',', ""),
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s,
    };
    normalized.parse::<f64>().ok().and_then(valid_price)
}

/// Accept a numeric cell as a price.
pub fn valid_price(v: f64) -> Option<f64> {
    if v.is_finite() && v >= 0.0 {
        Some(v)
    } else {
        None
    }
}

/// Parse a date written day-first; any time component is dropped.
pub fn parse_day_first_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // "05.03.2024 00:00:00" and "2024-03-05T00:00:00" both keep only the date.
    let date_part = s.split(|c: char| c == ' ' || c == 'T').next()?;
    // `%Y` happily reads "24" as year 24, so short years must fall through
    // to the `%y` layouts.
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(date_part, fmt)
            .ok()
            .filter(|d| d.year() >= 1000)
    })
}

/// Convert an Excel serial day number (1900 date system) to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    // Serials below 1 are pure times; anything past year 9999 is garbage.
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// Upper-case for matching, with Turkish `İ`/`ı` folded onto plain `I`.
pub fn fold_case(s: &str) -> String {
    s.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'İ' { 'I' } else { c })
        .collect()
}

pub fn contains_folded(haystack: &str, needle: &str) -> bool {
    fold_case(haystack).contains(&fold_case(needle))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%d.%m.%Y").to_string()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234.50`.
    let s = format!("{:.*}", decimals, n);
    // Rounded-away values such as -0.001 print without a sign.
    let neg = s.starts_with('-') && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let s = s.trim_start_matches('-');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Price cell text; missing values render as `-`.
pub fn format_price(v: Option<f64>) -> String {
    match v {
        Some(v) => format_number(v, 2),
        None => "-".to_string(),
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
