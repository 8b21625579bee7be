//! Property-based tests for the cleaning transform.
//!
//! # Invariants tested
//!
//! - **Price bounds:** every retained row has a price inside the bounds.
//! - **Geographic bounds:** every retained row lies inside the default box.
//! - **Order preservation:** output rows are an ordered sub-sequence of input.
//! - **Idempotence:** cleaning the output again changes nothing.
//! - **Date coverage:** `last_review` is always a timestamp or null.

use proptest::prelude::*;
use rentals_core::{
    CleaningRules, GeoBounds, LAST_REVIEW_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN,
    PRICE_COLUMN, PriceBounds, Table, Value, clean_table,
};

const COLUMNS: [&str; 5] = [
    "id",
    PRICE_COLUMN,
    LONGITUDE_COLUMN,
    LATITUDE_COLUMN,
    LAST_REVIEW_COLUMN,
];

fn numeric_cell(range: std::ops::Range<f64>) -> impl Strategy<Value = Value> {
    prop_oneof![
        9 => range.prop_map(Value::Number),
        1 => Just(Value::Null),
    ]
}

fn review_cell() -> impl Strategy<Value = Value> {
    prop_oneof![
        (2010_i32..2024, 1_u32..13, 1_u32..29)
            .prop_map(|(y, m, d)| Value::Text(format!("{y:04}-{m:02}-{d:02}"))),
        "[a-z]{0,8}".prop_map(Value::Text),
        Just(Value::Null),
    ]
}

fn listing_rows() -> impl Strategy<Value = Vec<Vec<Value>>> {
    prop::collection::vec(
        (
            numeric_cell(0.0..1_000.0),
            numeric_cell(-75.0..-73.0),
            numeric_cell(40.0..42.0),
            review_cell(),
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(index, (price, longitude, latitude, review))| {
                vec![
                    Value::Text(index.to_string()),
                    price,
                    longitude,
                    latitude,
                    review,
                ]
            })
            .collect()
    })
}

fn build_table(rows: Vec<Vec<Value>>) -> Table {
    let columns = COLUMNS.iter().map(|name| (*name).to_owned()).collect();
    Table::from_rows(columns, rows).expect("generated rows match the schema")
}

fn rules(min: f64, span: f64) -> CleaningRules {
    CleaningRules::with_price(PriceBounds::new(min, min + span).expect("ordered bounds"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: retained prices lie inside the bounds.
    #[test]
    fn retained_prices_respect_bounds(
        rows in listing_rows(),
        min in 0.0_f64..500.0,
        span in 0.0_f64..500.0,
    ) {
        let rules = rules(min, span);
        let outcome = clean_table(&build_table(rows), &rules).expect("clean");
        for price in outcome.table.column_values(PRICE_COLUMN).expect("price column") {
            let value = price.as_number().expect("retained prices are numbers");
            prop_assert!(rules.price().contains(value), "price {value} escaped the bounds");
        }
    }

    /// Property: retained coordinates lie inside the default box.
    #[test]
    fn retained_points_respect_geo_bounds(rows in listing_rows()) {
        let outcome = clean_table(&build_table(rows), &rules(0.0, 1_000.0)).expect("clean");
        let geo = GeoBounds::nyc();
        for row in 0..outcome.table.len() {
            let longitude = outcome.table.value(row, LONGITUDE_COLUMN).and_then(Value::as_number);
            let latitude = outcome.table.value(row, LATITUDE_COLUMN).and_then(Value::as_number);
            match (longitude, latitude) {
                (Some(lon), Some(lat)) => prop_assert!(geo.contains(lon, lat)),
                other => prop_assert!(false, "retained row without coordinates: {other:?}"),
            }
        }
    }

    /// Property: output rows appear in the same relative order as the input.
    #[test]
    fn output_preserves_input_order(rows in listing_rows(), min in 0.0_f64..300.0) {
        let outcome = clean_table(&build_table(rows), &rules(min, 400.0)).expect("clean");
        let ids: Vec<usize> = outcome
            .table
            .column_values("id")
            .expect("id column")
            .filter_map(Value::as_text)
            .map(|id| id.parse().expect("generated ids are numeric"))
            .collect();
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids out of order: {ids:?}");
    }

    /// Property: cleaning is idempotent.
    #[test]
    fn cleaning_twice_changes_nothing(rows in listing_rows(), min in 0.0_f64..300.0) {
        let rules = rules(min, 400.0);
        let once = clean_table(&build_table(rows), &rules).expect("first pass").table;
        let twice = clean_table(&once, &rules).expect("second pass").table;
        prop_assert_eq!(once, twice);
    }

    /// Property: every `last_review` cell is converted or nulled.
    #[test]
    fn review_dates_are_always_converted(rows in listing_rows()) {
        let outcome = clean_table(&build_table(rows), &rules(0.0, 1_000.0)).expect("clean");
        for value in outcome.table.column_values(LAST_REVIEW_COLUMN).expect("review column") {
            prop_assert!(
                matches!(value, Value::Timestamp(_) | Value::Null),
                "unconverted review value {value:?}"
            );
        }
    }
}
