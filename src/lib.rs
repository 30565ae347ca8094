//! depot: command-line client option parsing and command dispatch
//!
//! Layers, innermost first:
//! - `domain`: option catalog, parsed option sets, charsets, batch and retry bookkeeping
//! - `application`: the option parser, environment negotiation and the dispatcher
//! - `infrastructure`: configuration provider, process-backed session, console output
//! - `cli`: client grammar, usage texts and the entry point used by `main`

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
