pub mod local_dir;
pub mod supabase;

pub use local_dir::LocalDirObjectStorage;
pub use supabase::{SupabaseClient, SupabaseObjectStorage};
