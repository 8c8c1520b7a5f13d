//! admitrank-signals: admission-likelihood signal providers.
//!
//! Implements the `SignalProvider` trait for a remote HTTP model and a
//! fixed value, and owns the `admitrank.toml` configuration.

pub mod config;
pub mod error;
pub mod http;
pub mod mock;

pub use config::{create_signal, load_config, AdmitrankConfig, SignalConfig};
pub use error::SignalError;
