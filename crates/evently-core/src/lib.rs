//! # Evently Core
//!
//! Core types shared by every Evently crate that sits on the HTTP boundary.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use evently_core::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Event not found"));
//! ```

pub mod errors;

pub use errors::AppError;
