pub mod app;
pub mod error;
pub mod handler;

pub use app::{create_router, resolve_port, serve, AppState, DEFAULT_PORT};
pub use error::ApiError;
pub use handler::PredictResponse;
