//! # LoadLab Domain
//!
//! Shared domain types for the LoadLab traffic generator.
//!
//! This crate contains:
//! - Payload types exchanged between the two services (payment requests,
//!   responses, published events, fraud verdicts)
//! - Service configuration structures
//! - Domain error types and Result definitions
//! - Domain constants (defaults and environment variable names)
//!
//! ## Architecture
//! - No dependencies on other LoadLab crates
//! - Only external dependencies allowed
//! - Pure data structures, no behavior beyond constructors

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
