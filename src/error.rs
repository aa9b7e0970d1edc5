use std::fmt;
use std::io;
use std::path::PathBuf;

/// Specialized Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a conversion a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Input,
    Output,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Input => f.write_str("input"),
            Role::Output => f.write_str("output"),
        }
    }
}

/// General errors for this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad, missing or conflicting sample format selection.
    #[error("Invalid arguments: {0}")]
    Argument(String),
    /// Identical input/output paths, or a path naming stdin/stdout.
    #[error("Invalid path: {0}")]
    Path(&'static str),
    #[error("Could not open {role} file {}: {source}", .path.display())]
    Open {
        role: Role,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Missing RIFF/WAVE/fmt signature or an unmapped sample type.
    #[error("Invalid WAV header: {0}")]
    ContainerDecode(String),
    #[error("Unsupported combination: {0}")]
    UnsupportedCombination(&'static str),
    /// No `data` tag inside the scan budget. The RIFF scanner falls back to a
    /// data start of 0, so conversions never return it.
    #[error("No 'data' chunk found within {0} bytes")]
    ScanExhausted(u64),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn argument<S: Into<String>>(msg: S) -> Self {
        Error::Argument(msg.into())
    }

    pub(crate) fn container<S: Into<String>>(msg: S) -> Self {
        Error::ContainerDecode(msg.into())
    }
}
