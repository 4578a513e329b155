//! OpenGate Common - Shared types for the request authorization core
//!
//! This crate provides the primitives every other OpenGate crate builds on:
//! - Error taxonomy and boundary status mapping
//! - Request correlation identifiers
//! - Client fingerprints for abuse tracking

#![warn(missing_docs)]

pub mod error;
pub mod request;

pub use error::{GateError, GateResult};
pub use request::{ClientKey, RequestCorrelationId};
