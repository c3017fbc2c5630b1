use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use hotel_classifiers::BookingRecord;
use maud::{html, Markup, DOCTYPE};
use serde_json::Value;

use crate::server::PredictResponse;
use crate::ui::fields::{build_record, default_values, FieldWidget, Widget, FIELDS};

#[derive(Clone)]
pub struct UiState {
    pub api_url: Arc<str>,
}

impl UiState {
    pub fn new(api_url: &str) -> Self {
        UiState {
            api_url: Arc::from(api_url.trim_end_matches('/')),
        }
    }
}

/// What the inference service said about a submitted booking.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Canceled { probability: f64 },
    Confirmed { probability: f64 },
    /// Form validation failures, or the API's error text.
    Error(String),
}

impl From<PredictResponse> for Outcome {
    fn from(r: PredictResponse) -> Self {
        if r.prediction == 1 {
            Outcome::Canceled {
                probability: r.probability,
            }
        } else {
            Outcome::Confirmed {
                probability: r.probability,
            }
        }
    }
}

/// One blocking `POST <api_url>/predict`. Call from a blocking thread.
pub fn request_prediction(api_url: &str, record: &BookingRecord) -> Outcome {
    let url = format!("{}/predict", api_url.trim_end_matches('/'));
    match ureq::post(&url).send_json(Value::Object(record.clone())) {
        Ok(response) => match response.into_json::<PredictResponse>() {
            Ok(parsed) => parsed.into(),
            Err(e) => Outcome::Error(format!("API Error: unreadable response: {}", e)),
        },
        Err(ureq::Error::Status(code, response)) => {
            let text = response.into_string().unwrap_or_default();
            Outcome::Error(format!("API Error ({}): {}", code, text))
        }
        Err(e) => Outcome::Error(format!("API Error: {}", e)),
    }
}

fn page(body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Hotel Booking Cancellation Predictor" }
                style {
                    "body { font-family: sans-serif; max-width: 48em; margin: 2em auto; } \
                     label { display: block; margin-top: 0.6em; } \
                     small { color: #666; display: block; } \
                     .canceled { color: #b00020; } .confirmed { color: #1b5e20; } \
                     .error { color: #b00020; white-space: pre-wrap; }"
                }
            }
            body { (body) }
        }
    }
}

fn field_input(field: &FieldWidget, value: &str) -> Markup {
    html! {
        @match field.widget {
            Widget::Select { options, .. } => {
                select id=(field.name) name=(field.name) {
                    @for option in options {
                        option value=(option) selected[*option == value] { (option) }
                    }
                }
            }
            Widget::Integer { min, max } => {
                input type="number" id=(field.name) name=(field.name) step="1"
                    min=(min) max=[max] value=(value);
            }
            Widget::Float { min } => {
                input type="number" id=(field.name) name=(field.name) step="0.01"
                    min=(min) value=(value);
            }
            Widget::Text { .. } => {
                input type="text" id=(field.name) name=(field.name) value=(value);
            }
        }
    }
}

fn outcome_panel(outcome: &Outcome) -> Markup {
    html! {
        @match outcome {
            Outcome::Canceled { probability } => {
                p.canceled { strong { "Booking is likely to be CANCELED!" } " (p = " (format!("{:.2}", probability)) ")" }
            }
            Outcome::Confirmed { probability } => {
                p.confirmed { strong { "Booking is likely to be CONFIRMED!" } " (p = " (format!("{:.2}", probability)) ")" }
            }
            Outcome::Error(text) => {
                p.error { (text) }
            }
        }
    }
}

/// The booking form, pre-filled with `values`, plus the last outcome.
pub fn render_form(values: &BTreeMap<String, String>, outcome: Option<&Outcome>) -> Markup {
    let mut sections: Vec<(&str, Vec<&FieldWidget>)> = Vec::new();
    for field in FIELDS {
        match sections.iter().position(|(name, _)| *name == field.section) {
            Some(pos) => sections[pos].1.push(field),
            None => sections.push((field.section, vec![field])),
        }
    }

    page(html! {
        h1 { "Hotel Booking Cancellation Predictor" }
        p {
            "Predicts whether a hotel booking is likely to be " strong { "canceled" }
            " or " strong { "confirmed" } ". Fill in the booking details and press "
            strong { "Predict Cancellation" } "."
        }
        @if let Some(outcome) = outcome {
            (outcome_panel(outcome))
        }
        form method="post" action="/" {
            @for (section, fields) in &sections {
                h2 { (section) }
                @for field in fields {
                    label for=(field.name) { (field.label) }
                    (field_input(field, values.get(field.name).map(String::as_str).unwrap_or_default()))
                    small { (field.help) }
                }
            }
            p { button type="submit" { "Predict Cancellation" } }
        }
    })
}

async fn show_form() -> Html<String> {
    Html(render_form(&default_values(), None).into_string())
}

async fn submit_form(
    State(state): State<UiState>,
    Form(values): Form<BTreeMap<String, String>>,
) -> Html<String> {
    let outcome = match build_record(&values) {
        Ok(record) => {
            let api_url = state.api_url.clone();
            tokio::task::spawn_blocking(move || request_prediction(&api_url, &record))
                .await
                .unwrap_or_else(|e| Outcome::Error(format!("request task failed: {}", e)))
        }
        Err(errors) => Outcome::Error(errors.join("\n")),
    };
    log::debug!("Form outcome: {:?}", outcome);
    Html(render_form(&values, Some(&outcome)).into_string())
}

pub fn create_router(state: UiState) -> Router {
    Router::new()
        .route("/", get(show_form).post(submit_form))
        .with_state(state)
}

pub async fn serve(api_url: &str, port: u16) -> Result<()> {
    let app = create_router(UiState::new(api_url));
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("Form UI on http://{} (API at {})", addr, api_url);

    axum::serve(listener, app).await?;
    Ok(())
}
