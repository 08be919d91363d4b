mod api;
mod config;
mod error;

mod data_objects;

pub use api::PayrailApi;
pub use config::PayrailConfig;
pub use data_objects::{NewPayrailOrder, NewPayrailPayout, PayrailOrder, PayrailPayout};
pub use error::PayrailApiError;
