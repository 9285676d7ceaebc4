//! Utility modules for error handling and configuration

pub mod config;
pub mod error;

pub use config::AppSettings;
pub use error::{Diagnostic, TubescriptError};
