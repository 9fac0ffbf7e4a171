//! ptree command-line tool library

mod config;
mod fields;
mod input;
mod local_logger;
mod output;
mod prelude;
mod time;

pub mod app;

pub use fields::{Event, FieldMapping};
pub use input::InputFormat;
pub use local_logger::init_local_logger;
pub use output::OutputFormat;
