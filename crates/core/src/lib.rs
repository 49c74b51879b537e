//! ragpack core library
//!
//! Foundational utilities shared by every ragpack crate:
//! - Error handling (`PackError`, `PackResult`)
//! - Logging infrastructure
//! - Configuration management and provider specs

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, ProviderSpec};
pub use error::{PackError, PackResult};
