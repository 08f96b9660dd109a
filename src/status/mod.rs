//! 安装状态检查：已安装列表缓存、单条判定、并行检查

pub mod cache;
pub mod classifier;
pub mod sweep;

pub use cache::{InstalledSet, InstalledSetCache};
pub use classifier::{needs_update, StatusClassifier};
pub use sweep::{sweep, SweepSummary, STATUS_CONCURRENCY};
