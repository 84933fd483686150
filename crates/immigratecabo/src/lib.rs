pub mod config;
pub mod error;
pub mod forms;
pub mod mail;
pub mod telemetry;
