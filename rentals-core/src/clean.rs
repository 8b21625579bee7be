//! Cleaning transform for raw listing tables.
//!
//! The transform is a pure function of its inputs: it filters price
//! outliers, converts `last_review` into timestamps, and drops listings
//! outside the geographic box. Retained rows keep their relative order, and
//! applying the transform to its own output changes nothing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::info;

use crate::{GeoBounds, PriceBounds, Table, TableError, Value};

/// Listing price column.
pub const PRICE_COLUMN: &str = "price";
/// Listing longitude column.
pub const LONGITUDE_COLUMN: &str = "longitude";
/// Listing latitude column.
pub const LATITUDE_COLUMN: &str = "latitude";
/// Date of the most recent review.
pub const LAST_REVIEW_COLUMN: &str = "last_review";

/// Columns parsed as numbers when a table is loaded.
pub const NUMERIC_COLUMNS: [&str; 3] = [PRICE_COLUMN, LONGITUDE_COLUMN, LATITUDE_COLUMN];
/// Columns every input table must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    PRICE_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_COLUMN,
    LAST_REVIEW_COLUMN,
];

const DATE_TIME_LAYOUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_LAYOUTS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

/// Bounds applied by [`clean_table`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningRules {
    price: PriceBounds,
    geo: GeoBounds,
}

impl CleaningRules {
    /// Combine a price range with a geographic box.
    #[must_use]
    pub const fn new(price: PriceBounds, geo: GeoBounds) -> Self {
        Self { price, geo }
    }

    /// Use `price` with the default New York City box.
    #[must_use]
    pub fn with_price(price: PriceBounds) -> Self {
        Self::new(price, GeoBounds::nyc())
    }

    /// Accepted price range.
    #[must_use]
    pub const fn price(&self) -> PriceBounds {
        self.price
    }

    /// Accepted geographic box.
    #[must_use]
    pub const fn geo(&self) -> GeoBounds {
        self.geo
    }
}

/// Row counts and observations gathered while cleaning.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleaningReport {
    /// Rows in the input table.
    pub input_rows: usize,
    /// Rows left after the price filter.
    pub after_price_filter: usize,
    /// Rows left after every filter.
    pub output_rows: usize,
    /// `last_review` values that could not be parsed and became null.
    pub unparsed_dates: usize,
    /// Lowest and highest price after the price filter, if any rows remain.
    pub retained_price_range: Option<(f64, f64)>,
}

/// Result of [`clean_table`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningOutcome {
    /// The cleaned table; it keeps the input schema.
    pub table: Table,
    /// Statistics about the run.
    pub report: CleaningReport,
}

/// Clean a listing table.
///
/// Steps run in a fixed order:
/// 1. keep rows whose `price` lies inside the price bounds;
/// 2. convert `last_review` text into timestamps, nulling unparseable values;
/// 3. keep rows whose (`longitude`, `latitude`) lies inside the geographic box.
///
/// Rows with a null or non-numeric price, longitude or latitude never satisfy
/// a bound and are dropped. An empty result is not an error.
///
/// # Examples
///
/// ```
/// use rentals_core::{CleaningRules, PriceBounds, Table, Value, clean_table};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table = Table::from_rows(
///     vec!["price".into(), "longitude".into(), "latitude".into(), "last_review".into()],
///     [
///         vec![50.0.into(), (-73.9).into(), 40.8.into(), "2019-01-01".into()],
///         vec![9999.0.into(), (-73.9).into(), 40.8.into(), "2019-01-01".into()],
///     ],
/// )?;
/// let rules = CleaningRules::with_price(PriceBounds::new(10.0, 500.0)?);
/// let outcome = clean_table(&table, &rules)?;
/// assert_eq!(outcome.table.len(), 1);
/// assert!(matches!(
///     outcome.table.value(0, "last_review"),
///     Some(Value::Timestamp(_))
/// ));
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TableError::MissingColumn`] when a required listing column is
/// absent.
pub fn clean_table(table: &Table, rules: &CleaningRules) -> Result<CleaningOutcome, TableError> {
    let price_index = table.require_column(PRICE_COLUMN)?;
    let longitude_index = table.require_column(LONGITUDE_COLUMN)?;
    let latitude_index = table.require_column(LATITUDE_COLUMN)?;
    table.require_column(LAST_REVIEW_COLUMN)?;

    let mut cleaned = table.clone();
    let input_rows = cleaned.len();

    let price = rules.price();
    cleaned.retain_rows(|row| number_at(row, price_index).is_some_and(|p| price.contains(p)));
    let after_price_filter = cleaned.len();
    let retained_price_range = price_range(&cleaned, price_index);
    match retained_price_range {
        Some((min, max)) => info!("Min price: {min}, Max price: {max}"),
        None => info!("No listings left inside the price bounds"),
    }
    info!(
        "Removed price outliers: kept {after_price_filter} of {input_rows} rows \
         ({}..={})",
        price.min(),
        price.max()
    );

    let mut unparsed_dates = 0;
    cleaned.map_column(LAST_REVIEW_COLUMN, |value| {
        let converted = to_review_timestamp(value);
        if !value.is_null() && converted.is_null() {
            unparsed_dates += 1;
        }
        converted
    })?;
    info!("Converted {LAST_REVIEW_COLUMN} to timestamps ({unparsed_dates} unparseable)");
    for column in cleaned.summary() {
        let kind = column
            .kind
            .map_or_else(|| "empty".to_owned(), |kind| kind.to_string());
        info!("  {}: {} non-null {kind}", column.name, column.non_null);
    }

    let geo = rules.geo();
    cleaned.retain_rows(|row| {
        match (
            number_at(row, longitude_index),
            number_at(row, latitude_index),
        ) {
            (Some(longitude), Some(latitude)) => geo.contains(longitude, latitude),
            _ => false,
        }
    });
    let output_rows = cleaned.len();
    info!("Applied geographic bounds: kept {output_rows} of {after_price_filter} rows");

    Ok(CleaningOutcome {
        table: cleaned,
        report: CleaningReport {
            input_rows,
            after_price_filter,
            output_rows,
            unparsed_dates,
            retained_price_range,
        },
    })
}

/// Parse a review date in any supported layout.
///
/// Accepted layouts are `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` and
/// `YYYY-MM-DDTHH:MM:SS` (both optionally with fractional seconds), RFC 3339
/// (normalised to UTC), `MM/DD/YYYY` and `YYYY/MM/DD`. Surrounding whitespace
/// is ignored. Date-only values resolve to midnight.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use rentals_core::parse_review_date;
///
/// let parsed = parse_review_date("2019-05-21").expect("ISO date");
/// assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2019, 5, 21).expect("valid date"));
/// assert!(parse_review_date("bad-date").is_none());
/// ```
#[must_use]
pub fn parse_review_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.naive_utc());
    }
    DATE_TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
        .or_else(|| trimmed.parse::<NaiveDateTime>().ok())
        .or_else(|| {
            DATE_LAYOUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(trimmed, layout).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn to_review_timestamp(value: &Value) -> Value {
    match value {
        Value::Timestamp(timestamp) => Value::Timestamp(*timestamp),
        Value::Text(raw) => parse_review_date(raw).map_or(Value::Null, Value::Timestamp),
        Value::Null | Value::Number(_) => Value::Null,
    }
}

fn number_at(row: &[Value], index: usize) -> Option<f64> {
    row.get(index).and_then(Value::as_number)
}

fn price_range(table: &Table, price_index: usize) -> Option<(f64, f64)> {
    table
        .rows()
        .filter_map(|row| number_at(row, price_index))
        .fold(None, |range, price| match range {
            None => Some((price, price)),
            Some((min, max)) => Some((f64::min(min, price), f64::max(max, price))),
        })
}
