//! Application layer: parsing, negotiation and dispatch
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod error;
pub mod error_ext;
pub mod parser;
pub mod services;

pub use error::{ApplicationError, ApplicationResult, UsageError};
pub use error_ext::IoResultExt;
pub use parser::{OptionParser, ParseOutcome, ParsedCommand, PositionalRule};
