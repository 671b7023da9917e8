//! # Utility Modules
//!
//! Supporting utilities for logging and timing.
//!
//! ## Components
//! - **Logging**: Structured logging configuration (tracing-subscriber)
//! - **Time**: Timestamp utilities for request expiry checks
//!
//! ## Security
//! - Timestamps fail loudly when the system clock is before the epoch
//!   instead of silently wrapping

pub mod logging;
pub mod time;
