pub mod config;
pub mod content;
pub mod error;
pub mod types;

pub use config::Config;
pub use content::ContentFilter;
pub use error::NotifyError;
pub use types::*;
