//! Model retrieval and inference.

pub mod repository;
pub mod runtime;
pub mod sarima;
pub mod tabular;
pub mod trend_seasonal;

pub use repository::{ArtifactLocation, LocalArtifact, ModelRepository};
pub use runtime::{LoadedModel, ModelFamily, ModelInput, ModelOutput};
