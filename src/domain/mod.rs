// Audit log entries
pub mod audit;

// Domain-specific error types
pub mod errors;

// Engineered feature tables
pub mod features;

// Assets, price bars and lookback windows
pub mod market;

// Port interfaces
pub mod ports;

// Prediction payloads
pub mod prediction;
