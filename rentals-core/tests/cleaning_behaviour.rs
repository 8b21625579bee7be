//! Behavioural coverage for the listing cleaning transform.

use chrono::NaiveDate;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

use rentals_core::{
    CleaningOutcome, CleaningRules, LAST_REVIEW_COLUMN, PRICE_COLUMN, PriceBounds,
    REQUIRED_COLUMNS, Table, TableError, Value, clean_table,
};

type CleanResult = Result<CleaningOutcome, TableError>;

fn listing_table(rows: Vec<Vec<Value>>) -> Table {
    let columns = REQUIRED_COLUMNS
        .iter()
        .map(|name| (*name).to_owned())
        .collect();
    Table::from_rows(columns, rows).unwrap_or_else(|err| panic!("invalid listing table: {err}"))
}

fn listing(price: f64, longitude: f64, latitude: f64, review: &str) -> Vec<Value> {
    vec![
        Value::Number(price),
        Value::Number(longitude),
        Value::Number(latitude),
        Value::from(review),
    ]
}

#[fixture]
fn raw_table() -> RefCell<Option<Table>> {
    RefCell::new(None)
}

#[fixture]
fn price_bounds() -> RefCell<Option<PriceBounds>> {
    RefCell::new(None)
}

#[fixture]
fn clean_result() -> RefCell<Option<CleanResult>> {
    RefCell::new(None)
}

#[given("a raw listing table with one valid, one overpriced and one out-of-area row")]
fn mixed_listings(#[from(raw_table)] cell: &RefCell<Option<Table>>) {
    *cell.borrow_mut() = Some(listing_table(vec![
        listing(50.0, -73.9, 40.8, "2019-01-01"),
        listing(9999.0, -73.9, 40.8, "2019-01-01"),
        listing(60.0, -70.0, 40.8, "bad-date"),
    ]));
}

#[given("a raw listing table where every price is below the minimum")]
fn cheap_listings(#[from(raw_table)] cell: &RefCell<Option<Table>>) {
    *cell.borrow_mut() = Some(listing_table(vec![
        listing(1.0, -73.9, 40.8, "2019-01-01"),
        listing(9.99, -73.95, 40.75, "2018-07-04"),
    ]));
}

#[given("price bounds from 10 to 500")]
fn standard_bounds(#[from(price_bounds)] cell: &RefCell<Option<PriceBounds>>) {
    let bounds =
        PriceBounds::new(10.0, 500.0).unwrap_or_else(|err| panic!("invalid bounds: {err}"));
    *cell.borrow_mut() = Some(bounds);
}

#[when("I clean the table")]
fn clean(
    #[from(raw_table)] table_cell: &RefCell<Option<Table>>,
    #[from(price_bounds)] bounds_cell: &RefCell<Option<PriceBounds>>,
    #[from(clean_result)] result_cell: &RefCell<Option<CleanResult>>,
) {
    let table_borrow = table_cell.borrow();
    let table = table_borrow
        .as_ref()
        .unwrap_or_else(|| panic!("raw table must be initialised"));
    let bounds = bounds_cell
        .borrow()
        .unwrap_or_else(|| panic!("price bounds must be initialised"));
    let outcome = clean_table(table, &CleaningRules::with_price(bounds));
    *result_cell.borrow_mut() = Some(outcome);
}

fn with_outcome<F>(cell: &RefCell<Option<CleanResult>>, check: F)
where
    F: FnOnce(&CleaningOutcome),
{
    let borrow = cell.borrow();
    match borrow.as_ref() {
        Some(Ok(outcome)) => check(outcome),
        Some(Err(err)) => panic!("expected cleaning to succeed: {err}"),
        None => panic!("cleaning result must be present"),
    }
}

#[then("only the first listing remains")]
fn first_listing_remains(#[from(clean_result)] cell: &RefCell<Option<CleanResult>>) {
    with_outcome(cell, |outcome| {
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(
            outcome.table.value(0, PRICE_COLUMN),
            Some(&Value::Number(50.0))
        );
    });
}

#[then("its last review is parsed to 2019-01-01")]
fn review_parsed(#[from(clean_result)] cell: &RefCell<Option<CleanResult>>) {
    let expected = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| panic!("valid calendar date"));
    with_outcome(cell, |outcome| {
        assert_eq!(
            outcome.table.value(0, LAST_REVIEW_COLUMN),
            Some(&Value::Timestamp(expected))
        );
    });
}

#[then("the cleaned table is empty with the original columns")]
fn empty_with_schema(#[from(clean_result)] cell: &RefCell<Option<CleanResult>>) {
    with_outcome(cell, |outcome| {
        assert!(outcome.table.is_empty());
        let columns: Vec<&str> = outcome.table.columns().iter().map(String::as_str).collect();
        assert_eq!(columns, REQUIRED_COLUMNS);
    });
}

#[scenario(path = "tests/features/cleaning.feature", index = 0)]
fn keeps_listings_inside_bounds(
    raw_table: RefCell<Option<Table>>,
    price_bounds: RefCell<Option<PriceBounds>>,
    clean_result: RefCell<Option<CleanResult>>,
) {
    let _ = (raw_table, price_bounds, clean_result);
}

#[scenario(path = "tests/features/cleaning.feature", index = 1)]
fn all_listings_out_of_bounds(
    raw_table: RefCell<Option<Table>>,
    price_bounds: RefCell<Option<PriceBounds>>,
    clean_result: RefCell<Option<CleanResult>>,
) {
    let _ = (raw_table, price_bounds, clean_result);
}
