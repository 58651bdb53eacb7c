//! Fuel price reporting: load a price sheet, filter it by fuel type and city
//! or brand, and pivot it into date-column tables with a change column.
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pivot;
pub mod reports;
pub mod style;
pub mod types;
pub mod util;

pub use error::{Error, Result};
pub use types::{FilterSelection, NormalizedTable, PivotMatrix, PriceRecord};
