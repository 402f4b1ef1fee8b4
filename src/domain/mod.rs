//! Domain layer for the conversation export pipeline
//!
//! This module contains the core models, error taxonomy and the port traits
//! that infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DeliveryError, ExportError, ExportResult, HostError, RenderError};
