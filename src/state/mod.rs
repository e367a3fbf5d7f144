pub mod app_state;
pub mod device_cache;
pub mod session_authority;

pub use app_state::AppState;
pub use device_cache::{CacheKey, CachePartition, DeviceCacheStore};
pub use session_authority::{SessionAuthority, SessionPhase};
