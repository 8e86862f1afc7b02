pub mod classification;
pub mod config;
pub mod error;
pub mod pagination;
pub mod records;
pub mod telemetry;
