// Entry point and interactive menu.
//
// - On start the selected sheet (or the configured default report) is loaded.
// - Option [1] reloads it and prints a per fuel type overview.
// - Option [2] picks the fuel type both reports work on.
// - Option [3] shows the brands of one city side by side over a date range.
// - Option [4] shows one brand across all cities.
// Every rendered table is also exported to CSV, and a JSON summary of the
// session's reports is rewritten after each one.
use clap::Parser;
use fuel_report::config::Config;
use fuel_report::filter;
use fuel_report::loader;
use fuel_report::output;
use fuel_report::reports;
use fuel_report::style::HighlightRule;
use fuel_report::types::{
    DataSource, FilterSelection, NormalizedTable, PriceReport, ReportSummary,
};
use fuel_report::util::{format_date, format_int};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Parser)]
#[command(version, about = "Fuel price pivot reports")]
struct Cli {
    /// Price sheet to analyse (xlsx, xls, ods or csv). Without it the
    /// configured default file is used.
    #[arg(long, short, value_name = "FILE")]
    file: Option<PathBuf>,
    /// TOML config file; defaults to ./fuel_report.toml when present.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

// The loaded table is shared read-only through an `Arc`; a reload swaps in a
// new one.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    config: Config,
    user_file: Option<PathBuf>,
    data: Option<LoadedData>,
    fuel_type: Option<String>,
    summaries: Vec<ReportSummary>,
}

impl AppState {
    /// Swap in a freshly loaded table and preselect its first fuel type.
    fn set_data(&mut self, table: NormalizedTable, source: DataSource) {
        self.fuel_type = filter::fuel_types(&table).into_iter().next();
        self.data = Some(LoadedData {
            table: Arc::new(table),
            source,
        });
    }

    /// Drop the current table and fuel selection.
    fn clear_data(&mut self) {
        self.data = None;
        self.fuel_type = None;
    }
}

#[derive(Clone)]
struct LoadedData {
    table: Arc<NormalizedTable>,
    source: DataSource,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Print `prompt` and read one trimmed line; `None` once stdin is closed.
fn read_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Numbered choice list. An empty answer takes `default`.
fn prompt_index(title: &str, options: &[String], default: usize) -> Option<usize> {
    println!("{}", title);
    for (i, opt) in options.iter().enumerate() {
        let marker = if i == default { " (default)" } else { "" };
        println!("[{}] {}{}", i + 1, opt, marker);
    }
    let answer = read_line("Enter choice: ")?;
    if answer.is_empty() {
        return Some(default);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => Some(n - 1),
        _ => {
            println!("Invalid choice.\n");
            None
        }
    }
}

fn prompt_back_to_menu() -> bool {
    loop {
        let Some(resp) = read_line("Back to menu (Y/N): ") else {
            return false;
        };
        match resp.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Load (or reload) the data source and print what was found.
///
/// A failed load, or a missing file, clears any previous table so no stale
/// data is reported.
fn handle_load() {
    let (config, user_file) = {
        let s = state();
        (s.config.clone(), s.user_file.clone())
    };
    let Some(source) = loader::resolve_source(user_file, &config) else {
        println!(
            "No data: pass --file or place '{}' in the working directory.\n",
            config.default_file.display()
        );
        state().clear_data();
        return;
    };

    match loader::load_source(&source, &config) {
        Ok((table, report)) => {
            println!(
                "Processing dataset... ({} rows read, {} kept) | Source: {}",
                format_int(report.total_rows),
                format_int(report.kept_rows),
                source.label()
            );
            if report.dropped_rows() > 0 {
                println!(
                    "Note: {} rows skipped ({} bad dates, {} bad prices, {} malformed).",
                    format_int(report.dropped_rows()),
                    format_int(report.bad_dates),
                    format_int(report.bad_prices),
                    format_int(report.malformed_rows)
                );
            }
            println!();
            output::preview_table_rows(&reports::generate_overview(&table), usize::MAX);

            state().set_data(table, source);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
            state().clear_data();
        }
    }
}

fn handle_select_fuel() {
    let Some(data) = state().data.clone() else {
        println!("Error: No data loaded.\n");
        return;
    };
    let fuels = filter::fuel_types(&data.table);
    if fuels.is_empty() {
        println!("No data.\n");
        return;
    }
    if let Some(i) = prompt_index("Select a fuel type:", &fuels, 0) {
        println!("Selected: {}\n", fuels[i]);
        state().fuel_type = Some(fuels[i].clone());
    }
}

/// Snapshot of what both reports need, or a message when nothing is loaded.
fn report_inputs() -> Option<(LoadedData, String, Config)> {
    let s = state();
    let Some(data) = s.data.clone() else {
        println!("Error: No data loaded. Load a file first (option 1).\n");
        return None;
    };
    let Some(fuel) = s.fuel_type.clone() else {
        println!("No data.\n");
        return None;
    };
    Some((data, fuel, s.config.clone()))
}

fn handle_city_report() {
    let Some((data, fuel, config)) = report_inputs() else {
        return;
    };
    let cities = filter::cities(&data.table);
    if cities.is_empty() {
        println!("No data.\n");
        return;
    }
    let Some(ci) = prompt_index("Select a city:", &cities, 0) else {
        return;
    };
    let city = &cities[ci];

    let dates = filter::available_dates(&data.table, &fuel, city);
    if dates.is_empty() {
        println!("No data for {} in {}.\n", fuel, city);
        return;
    }
    let labels: Vec<String> = dates.iter().copied().map(format_date).collect();
    let Some(from) = prompt_index("Start date:", &labels, 0) else {
        return;
    };
    let Some(to) = prompt_index("End date:", &labels, labels.len() - 1) else {
        return;
    };

    let sel = FilterSelection {
        fuel_type: fuel,
        city: Some(city.clone()),
        brand_pattern: None,
        date_from: dates[from],
        date_to: dates[to],
    };
    let highlight = HighlightRule::new(config.highlights.clone());
    match reports::generate_city_report(&data.table, &sel, &highlight, data.source.label()) {
        Ok(report) => {
            output::print_report(&report);
            export(&report, &config, "city_report.csv");
        }
        Err(e) => println!("Error: {}\n", e),
    }
}

fn handle_brand_matrix() {
    let Some((data, fuel, config)) = report_inputs() else {
        return;
    };
    let Some(bi) = prompt_index("Select a brand:", &config.matrix_brands, 0) else {
        return;
    };
    let highlight = HighlightRule::new(config.highlights.clone());
    let report = reports::generate_brand_matrix(
        &data.table,
        &fuel,
        &config.matrix_brands[bi],
        &highlight,
        data.source.label(),
    );
    output::print_report(&report);
    export(&report, &config, "brand_matrix.csv");
}

/// Write the table to CSV and refresh `summary.json`.
fn export(report: &PriceReport, config: &Config, file_name: &str) {
    if report.is_no_data() {
        return;
    }
    let path = config.output_dir.join(file_name);
    if let Err(e) = output::write_pivot_csv(&path, &report.matrix) {
        eprintln!("Write error: {}", e);
        return;
    }
    println!("(Full table exported to {})\n", path.display());

    let mut s = state();
    s.summaries
        .push(reports::summarize(report, &path.display().to_string()));
    if let Err(e) = output::write_json(&config.output_dir.join("summary.json"), &s.summaries) {
        eprintln!("Write error: {}", e);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    {
        let mut s = state();
        s.config = config;
        s.user_file = cli.file;
    }

    handle_load();
    loop {
        let fuel = state().fuel_type.clone().unwrap_or_else(|| "-".to_string());
        println!("Fuel type: {}", fuel);
        println!("[1] Reload the file");
        println!("[2] Select fuel type");
        println!("[3] City report");
        println!("[4] All cities brand matrix\n");
        let Some(choice) = read_line("Enter choice: ") else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(),
            "2" => handle_select_fuel(),
            "3" => {
                println!();
                handle_city_report();
            }
            "4" => {
                println!();
                handle_brand_matrix();
            }
            _ => {
                println!("Invalid choice. Please enter 1, 2, 3 or 4.\n");
                continue;
            }
        }
        if matches!(choice.as_str(), "3" | "4") && !prompt_back_to_menu() {
            println!("Exiting the program.");
            break;
        }
    }
    Ok(())
}
