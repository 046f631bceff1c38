//! Environment-driven configuration

pub mod loader;

pub use loader::{load_antifraud_config, load_payment_config};
