//! Infrastructure layer module
//!
//! Adapters that satisfy the domain ports plus the ambient plumbing:
//! - Host documents (saved page snapshots with simulated pagination)
//! - Markup rendering (htmd)
//! - Delivery sinks (output directory, system clipboard)
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod delivery;
pub mod host;
pub mod logging;
pub mod render;
