//! Input/output path checks and file opening for the command-line tools.

use std::fs::{self, File};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result, Role};

/// Path that conventionally names stdin or stdout.
const INTERACTIVE_PATH: &str = "-";

/// Rejects path pairs the converter cannot work with.
///
/// Runs before any file is opened.
///
/// # Errors
/// `Error::Path` when either path is `-` or both name the same file.
pub fn validate_paths(input: &Path, output: &Path) -> Result<()> {
    if input == Path::new(INTERACTIVE_PATH) || output == Path::new(INTERACTIVE_PATH) {
        return Err(Error::Path("stdin and stdout streaming is not supported"));
    }
    if input == output {
        return Err(Error::Path("input and output are the same file"));
    }
    // Different spellings of an existing file.
    if let (Ok(a), Ok(b)) = (fs::canonicalize(input), fs::canonicalize(output)) {
        if a == b {
            return Err(Error::Path("input and output are the same file"));
        }
    }
    Ok(())
}

pub fn open_input(path: &Path) -> Result<File> {
    debug!(path = %path.display(), "Opening input");
    File::open(path).map_err(|source| Error::Open {
        role: Role::Input,
        path: path.to_path_buf(),
        source,
    })
}

/// Creates or truncates the output file.
///
/// The handle is opened for reading too, so the header can be rewritten
/// after the data pass.
pub fn create_output(path: &Path) -> Result<File> {
    debug!(path = %path.display(), "Creating output");
    File::options()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| Error::Open {
            role: Role::Output,
            path: path.to_path_buf(),
            source,
        })
}
