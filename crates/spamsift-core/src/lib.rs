//! spamsift Core
//!
//! Core types, traits, and utilities shared across spamsift components.
//!
//! This crate provides:
//! - The error taxonomy for artifact loading and per-request inference
//! - The prediction result and the stable serving response contract
//! - Result type alias used throughout the workspace

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Label, PredictionResponse, PredictionResult};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{Label, PredictionResponse, PredictionResult};
}
