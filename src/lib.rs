pub mod config;
pub mod domain;
pub mod scenario;
pub mod simulation;
pub mod telemetry;
