pub mod server;
pub mod training;
pub mod ui;
pub mod util;
