//! Configuration for opende
//!
//! - **app**: the tool's own optional JSON settings file
//! - **store**: file access seam used for every backend config file
//! - **locator**: where each backend's config lives and how it is provisioned

pub mod app;
pub mod locator;
pub mod store;

// Re-export commonly used types
pub use app::AppConfig;
pub use locator::{Access, ConfigLocator};
pub use store::{ConfigStore, FsStore};
