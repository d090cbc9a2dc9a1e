pub mod activities;
pub mod client;
pub mod config;
pub mod telemetry;
pub mod worker;

// Re-export main types
pub use activities::{build_activities, execute_activity};
pub use client::TemporalWorkerCore;
pub use config::WorkerConfig;
pub use telemetry::{init_telemetry, TelemetryConfig};
pub use worker::ActivityWorker;
