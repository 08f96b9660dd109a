//! 批量软件安装引擎：驱动 winget 风格的包管理命令行工具

pub mod catalog;
pub mod config;
pub mod error;
pub mod package_manager;
pub mod status;

pub use catalog::{InstallStatus, PackageRecord};
pub use config::Config;
pub use error::{EngineError, Result};
pub use package_manager::{InstallOutcome, PackageManager, ProgressSample, Scope};
pub use status::{StatusClassifier, SweepSummary};
