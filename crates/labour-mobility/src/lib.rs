pub mod config;
pub mod error;
pub mod telemetry;
pub mod tenancy;
pub mod workflows;
