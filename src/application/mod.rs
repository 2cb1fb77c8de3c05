// Best-effort audit trail
pub mod audit;

// Technical-indicator battery
pub mod features;

// Model retrieval and inference
pub mod ml;

// Prediction pipelines
pub mod pipelines;
