use std::collections::BTreeMap;

use hotel_classifiers::BookingRecord;
use serde_json::{json, Value};

const MONTHS: &[&str] = &[
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const ROOM_TYPES: &[&str] = &["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "L"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Widget {
    /// A fixed option list. `numeric` options are sent as JSON numbers.
    Select {
        options: &'static [&'static str],
        numeric: bool,
    },
    Integer {
        min: i64,
        max: Option<i64>,
    },
    Float {
        min: f64,
    },
    Text {
        default: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWidget {
    pub name: &'static str,
    pub label: &'static str,
    pub help: &'static str,
    pub section: &'static str,
    pub widget: Widget,
}

const fn select(
    name: &'static str,
    label: &'static str,
    help: &'static str,
    section: &'static str,
    options: &'static [&'static str],
) -> FieldWidget {
    FieldWidget {
        name,
        label,
        help,
        section,
        widget: Widget::Select {
            options,
            numeric: false,
        },
    }
}

const fn integer(
    name: &'static str,
    label: &'static str,
    help: &'static str,
    section: &'static str,
    min: i64,
    max: Option<i64>,
) -> FieldWidget {
    FieldWidget {
        name,
        label,
        help,
        section,
        widget: Widget::Integer { min, max },
    }
}

const BOOKING: &str = "Booking Details";
const STAY: &str = "Stay Duration";
const GUEST: &str = "Guest Information";
const CHANNEL: &str = "Booking Information";
const AGENT: &str = "Agent & Company Details";

/// Every input field of a booking record, in display order.
pub const FIELDS: &[FieldWidget] = &[
    select(
        "hotel",
        "Hotel Type",
        "Type of hotel for the booking.",
        BOOKING,
        &["City Hotel", "Resort Hotel"],
    ),
    integer("lead_time", "Lead Time (days)", "Days between booking and arrival.", BOOKING, 0, None),
    FieldWidget {
        name: "arrival_date_year",
        label: "Arrival Year",
        help: "Year the guest is expected to arrive.",
        section: BOOKING,
        widget: Widget::Select {
            options: &["2015", "2016", "2017"],
            numeric: true,
        },
    },
    select("arrival_date_month", "Arrival Month", "Month of arrival.", BOOKING, MONTHS),
    integer(
        "arrival_date_week_number",
        "Week Number",
        "Week of the year of arrival.",
        BOOKING,
        1,
        Some(53),
    ),
    integer(
        "arrival_date_day_of_month",
        "Day of Month",
        "Day of the month of arrival.",
        BOOKING,
        1,
        Some(31),
    ),
    integer(
        "stays_in_weekend_nights",
        "Weekend Nights",
        "Friday or Saturday nights booked.",
        STAY,
        0,
        None,
    ),
    integer(
        "stays_in_week_nights",
        "Week Nights",
        "Sunday to Thursday nights booked.",
        STAY,
        0,
        None,
    ),
    integer("adults", "Number of Adults", "Adult guests.", GUEST, 1, None),
    integer("children", "Number of Children", "Children included in the booking.", GUEST, 0, None),
    integer("babies", "Number of Babies", "Babies included in the booking.", GUEST, 0, None),
    select(
        "meal",
        "Meal Type",
        "Meal plan chosen by the guest.",
        GUEST,
        &["BB", "FB", "HB", "SC", "Undefined"],
    ),
    select(
        "market_segment",
        "Market Segment",
        "How the booking was made.",
        CHANNEL,
        &[
            "Online TA",
            "Offline TA/TO",
            "Groups",
            "Direct",
            "Corporate",
            "Complementary",
            "Aviation",
        ],
    ),
    select(
        "distribution_channel",
        "Distribution Channel",
        "Channel the booking came through.",
        CHANNEL,
        &["TA/TO", "Direct", "Corporate", "GDS", "Undefined"],
    ),
    FieldWidget {
        name: "is_repeated_guest",
        label: "Repeated Guest?",
        help: "1 if the guest has stayed at the hotel before.",
        section: CHANNEL,
        widget: Widget::Select {
            options: &["0", "1"],
            numeric: true,
        },
    },
    integer(
        "previous_cancellations",
        "Previous Cancellations",
        "Earlier bookings the guest canceled.",
        CHANNEL,
        0,
        None,
    ),
    integer(
        "previous_bookings_not_canceled",
        "Previous Non-Canceled Bookings",
        "Earlier bookings the guest kept.",
        CHANNEL,
        0,
        None,
    ),
    select("reserved_room_type", "Reserved Room Type", "Room type reserved.", CHANNEL, ROOM_TYPES),
    select("assigned_room_type", "Assigned Room Type", "Room type assigned.", CHANNEL, ROOM_TYPES),
    integer("booking_changes", "Booking Changes", "Changes made to the booking.", CHANNEL, 0, None),
    select(
        "deposit_type",
        "Deposit Type",
        "Deposit made at booking time.",
        CHANNEL,
        &["No Deposit", "Non Refund", "Refundable"],
    ),
    integer("agent", "Agent ID", "Travel agency that handled the booking.", AGENT, 0, None),
    integer("company", "Company ID", "Company that made the booking.", AGENT, 0, None),
    integer(
        "days_in_waiting_list",
        "Days in Waiting List",
        "Days before the booking was confirmed.",
        AGENT,
        0,
        None,
    ),
    select(
        "customer_type",
        "Customer Type",
        "Category of the customer.",
        AGENT,
        &["Transient", "Contract", "Transient-Party", "Group"],
    ),
    FieldWidget {
        name: "adr",
        label: "Average Daily Rate (ADR)",
        help: "Revenue per occupied room per night.",
        section: AGENT,
        widget: Widget::Float { min: 0.0 },
    },
    integer(
        "required_car_parking_spaces",
        "Required Car Parking Spaces",
        "Parking spaces requested.",
        AGENT,
        0,
        None,
    ),
    integer(
        "total_of_special_requests",
        "Total Special Requests",
        "Special requests such as extra pillows.",
        AGENT,
        0,
        None,
    ),
    FieldWidget {
        name: "country",
        label: "Country",
        help: "ISO 3166 code of the guest's country.",
        section: AGENT,
        widget: Widget::Text { default: "PRT" },
    },
];

impl FieldWidget {
    pub fn default_value(&self) -> String {
        match self.widget {
            Widget::Select { options, .. } => {
                options.first().copied().unwrap_or_default().to_string()
            }
            Widget::Integer { min, .. } => min.to_string(),
            Widget::Float { min } => format!("{:.1}", min),
            Widget::Text { default } => default.to_string(),
        }
    }

    /// Convert the submitted text into the JSON value the service expects.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        match self.widget {
            Widget::Select { options, numeric } => {
                if !options.contains(&raw) {
                    return Err(format!("{}: '{}' is not one of the options", self.label, raw));
                }
                if numeric {
                    raw.parse::<i64>()
                        .map(|v| json!(v))
                        .map_err(|_| format!("{}: '{}' is not a number", self.label, raw))
                } else {
                    Ok(json!(raw))
                }
            }
            Widget::Integer { min, max } => {
                let v: i64 = raw
                    .parse()
                    .map_err(|_| format!("{}: '{}' is not a whole number", self.label, raw))?;
                if v < min || max.map_or(false, |m| v > m) {
                    let upper = max.map(|m| format!(" and {}", m)).unwrap_or_default();
                    let bound = if max.is_some() { "between" } else { "at least" };
                    return Err(format!("{}: must be {} {}{}", self.label, bound, min, upper));
                }
                Ok(json!(v))
            }
            Widget::Float { min } => {
                let v: f64 = raw
                    .parse()
                    .map_err(|_| format!("{}: '{}' is not a number", self.label, raw))?;
                if !v.is_finite() || v < min {
                    return Err(format!("{}: must be at least {}", self.label, min));
                }
                Ok(json!(v))
            }
            Widget::Text { .. } => {
                if raw.is_empty() {
                    Ok(Value::Null)
                } else {
                    Ok(json!(raw))
                }
            }
        }
    }
}

pub fn default_values() -> BTreeMap<String, String> {
    FIELDS
        .iter()
        .map(|f| (f.name.to_string(), f.default_value()))
        .collect()
}

/// Assemble a booking record from submitted form values. Absent fields take
/// their default.
pub fn build_record(form: &BTreeMap<String, String>) -> Result<BookingRecord, Vec<String>> {
    let mut record = BookingRecord::new();
    let mut errors = Vec::new();
    for field in FIELDS {
        let raw = form
            .get(field.name)
            .cloned()
            .unwrap_or_else(|| field.default_value());
        match field.parse(&raw) {
            Ok(value) => {
                record.insert(field.name.to_string(), value);
            }
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        Ok(record)
    } else {
        Err(errors)
    }
}
