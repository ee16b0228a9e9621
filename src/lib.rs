pub mod analysis;
pub mod config;
pub mod error;
pub mod estimate;
pub mod expiry;
pub mod history;
pub mod model;
pub mod monthly;
pub mod nse;
pub mod report;
pub mod trim;
pub mod volatility;
