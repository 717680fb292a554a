//! Transpiler errors
//!
//! Every error is turned into a failed [`crate::TranspilationResult`] at the
//! facade. Nothing here escapes to callers of
//! [`crate::ShaderTranspiler::transpile`].

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::toolchain::Tool;

/// Error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any conversion
    Input,
    /// External tool failed, timed out or produced unusable output
    Toolchain,
    /// Unexpected fault during conversion
    Internal,
}

/// Transpiler error
#[derive(Debug, Error)]
pub enum TranspileError {
    /// Source text is empty
    #[error("Input shader source is empty")]
    EmptySource,

    /// Source has no `{` or no `}`
    #[error("ERROR: Missing curly braces in shader source. Please fix the problem.")]
    MissingBraces,

    /// Tool exited with a non-zero status
    #[error("{tool} exited with {}{}", describe_status(.status), describe_output(.diagnostics))]
    Toolchain {
        /// Tool that failed
        tool: Tool,
        /// Exit code, `None` when killed by a signal
        status: Option<i32>,
        /// Tool diagnostics (stderr, or stdout when stderr is empty)
        diagnostics: String,
    },

    /// Tool was killed after exceeding the configured timeout
    #[error("{tool} timed out after {after:?}")]
    Timeout {
        /// Tool that hung
        tool: Tool,
        /// Configured limit
        after: Duration,
    },

    /// Tool could not be started or waited on
    #[error("failed to run {tool}: {source}")]
    Process {
        /// Tool involved
        tool: Tool,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Scratch file could not be read or written
    #[error("{}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Assembler output is not a SPIR-V module
    #[error("invalid SPIR-V output: {0}")]
    InvalidSpirv(String),

    /// Unexpected fault
    #[error("Transpilation exception: {0}")]
    Internal(String),
}

impl TranspileError {
    /// Wraps an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySource | Self::MissingBraces => ErrorKind::Input,
            Self::Toolchain { .. }
            | Self::Timeout { .. }
            | Self::Process { .. }
            | Self::Io { .. }
            | Self::InvalidSpirv(_) => ErrorKind::Toolchain,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no exit status".to_string(),
    }
}

fn describe_output(output: &str) -> String {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// Result type for transpiler operations
pub type TranspileResult<T> = Result<T, TranspileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_messages() {
        assert_eq!(TranspileError::EmptySource.to_string(), "Input shader source is empty");
        assert_eq!(
            TranspileError::MissingBraces.to_string(),
            "ERROR: Missing curly braces in shader source. Please fix the problem."
        );
        assert_eq!(TranspileError::MissingBraces.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_toolchain_message_includes_diagnostics() {
        let err = TranspileError::Toolchain {
            tool: Tool::Dxc,
            status: Some(1),
            diagnostics: "error: undeclared identifier 'foo'\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "dxc exited with status 1: error: undeclared identifier 'foo'"
        );
        assert_eq!(err.kind(), ErrorKind::Toolchain);
    }

    #[test]
    fn test_signal_status() {
        let err = TranspileError::Toolchain {
            tool: Tool::Glslang,
            status: None,
            diagnostics: String::new(),
        };
        assert_eq!(err.to_string(), "glslang exited with no exit status");
    }
}
