pub mod alerts;
pub mod orchestrator;
pub mod resolver;
pub mod store;
pub mod timeseries;
