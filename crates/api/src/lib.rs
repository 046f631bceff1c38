//! # LoadLab Services
//!
//! HTTP surfaces of the traffic generator: the payment service (the load
//! target, with its chaos admin endpoints) and the antifraud service that
//! scores the events the payment service emits.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod antifraud;
pub mod correlation;
pub mod payment;

pub use antifraud::{antifraud_router, AntifraudState};
pub use payment::{payment_router, PaymentState};
