pub mod rest;
pub mod types;

pub use rest::{history_windows, NseRestClient};
