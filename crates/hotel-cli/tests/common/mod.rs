#![allow(dead_code)]

use hotel_classifiers::config::{ForestParams, MaxFeatures, ModelConfig, ModelType};
use hotel_classifiers::data_handling::{read_bookings_csv, LEAKAGE_COLUMNS, TARGET_COLUMN};
use hotel_classifiers::TrainedPipeline;
use serde_json::{json, Value};

pub const SAMPLE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../hotel-classifiers/tests/data/hotel_bookings_sample.csv"
);

pub fn fitted_pipeline() -> TrainedPipeline {
    let mut table = read_bookings_csv(SAMPLE).unwrap();
    table.drop_columns(LEAKAGE_COLUMNS);
    let (table, labels) = table.split_target(TARGET_COLUMN).unwrap();
    let config = ModelConfig::new(
        7,
        ModelType::from_params(
            ForestParams {
                n_estimators: 11,
                max_depth: Some(6),
                min_samples_split: 2,
            },
            MaxFeatures::Sqrt,
        ),
    );
    let dropped: Vec<String> = LEAKAGE_COLUMNS.iter().map(|c| c.to_string()).collect();
    TrainedPipeline::fit(&table, &labels, &config, TARGET_COLUMN, &dropped).unwrap()
}

/// A complete City Hotel booking with zeros wherever a count is asked for.
pub fn minimal_record() -> Value {
    json!({
        "hotel": "City Hotel",
        "lead_time": 0,
        "arrival_date_year": 2015,
        "arrival_date_month": "January",
        "arrival_date_week_number": 1,
        "arrival_date_day_of_month": 1,
        "stays_in_weekend_nights": 0,
        "stays_in_week_nights": 0,
        "adults": 1,
        "children": 0,
        "babies": 0,
        "meal": "BB",
        "market_segment": "Online TA",
        "distribution_channel": "TA/TO",
        "is_repeated_guest": 0,
        "previous_cancellations": 0,
        "previous_bookings_not_canceled": 0,
        "reserved_room_type": "A",
        "assigned_room_type": "A",
        "booking_changes": 0,
        "deposit_type": "No Deposit",
        "agent": 0,
        "company": 0,
        "days_in_waiting_list": 0,
        "customer_type": "Transient",
        "adr": 0.0,
        "required_car_parking_spaces": 0,
        "total_of_special_requests": 0,
        "country": "PRT"
    })
}
