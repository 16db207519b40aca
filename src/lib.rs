// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Domain layer (rendering and preview)
pub mod template;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
