//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod di;
pub mod enviro;
pub mod error;
pub mod session;
pub mod traits;
pub mod ui;

pub use error::{InfraError, InfraResult};
