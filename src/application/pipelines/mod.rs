pub mod context;
pub mod regression;
pub mod time_series;

pub use context::{ModelCatalog, PipelineContext};
pub use regression::RegressionPipeline;
pub use time_series::TimeSeriesPipeline;
