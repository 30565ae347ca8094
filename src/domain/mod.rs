//! Domain layer: option catalog, parsed options and run bookkeeping
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod batch;
pub mod charset;
pub mod diagnostics;
pub mod error;
pub mod grammar;
pub mod options;
pub mod parsed;

pub use batch::{effective_batch_size, ExecutionBatch, RetryBudget, DEFAULT_BATCH_SIZE};
pub use charset::CharSet;
pub use diagnostics::{ErrorRecord, ErrorSet, Severity, Subsystem};
pub use error::{CharsetError, ParseError, SessionError};
pub use grammar::Grammar;
pub use options::{descriptor, descriptor_by_name, OptionCode, OptionDescriptor, ValueArity, OPTION_TABLE};
pub use parsed::{OptionKey, ParsedOption, ParsedOptionSet, MAX_OPTIONS};
