//! Error conversion helpers for input I/O
//!
//! Provides an extension trait for attaching the input path to I/O errors.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Attach the path of the input being read.
    ///
    /// # Example
    /// ```ignore
    /// source.read_line(&mut line).with_input_path(&path)?;
    /// ```
    fn with_input_path(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_input_path(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Input {
            path: path.to_path_buf(),
            source,
        })
    }
}
