pub mod core;
pub mod factory;
pub mod market_data;
pub mod mock;
pub mod observability;
pub mod persistence;
pub mod storage;
pub mod supabase_logs;

pub use factory::ServiceFactory;
