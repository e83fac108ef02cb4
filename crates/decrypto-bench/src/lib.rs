pub mod analytics;
pub mod config;
pub mod logging;
pub mod simulation;
pub mod telemetry;
