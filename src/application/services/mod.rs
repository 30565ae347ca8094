//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (RemoteSession, UiSink,
//! ConfigProvider) but are themselves concrete structs, not traits.

mod dispatcher;
mod interface;
mod negotiator;

pub use dispatcher::{
    BatchInput, CommandDispatcher, DispatchReport, DispatchState, WordSplitter, DEFAULT_COMMAND,
    RUN_KEYWORD,
};
pub use interface::{select_interface, Interface, StructuredFormat};
pub use negotiator::{
    DebugLevels, EnvironmentNegotiator, SessionConfig, DEFAULT_PORT, DEFAULT_PROGRAM,
};
