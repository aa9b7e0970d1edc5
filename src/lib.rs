//! Sample-format conversion for raw IQ and audio streams, with RIFF/WAVE
//! wrapping and unwrapping.
//!
//! Samples are converted through a normalized `f32` intermediate, so any of
//! the four supported encodings can be turned into any other. WAVE inputs are
//! detected automatically; WAVE outputs get a header whose sizes are patched
//! once the data pass has finished.
//!
//! ```no_run
//! use std::fs::File;
//! use iqtools::{convert, ConvertOptions, ConvertRequest, SampleFormat};
//!
//! # fn main() -> iqtools::Result<()> {
//! let mut input = File::open("capture.wav")?;
//! let mut output = File::create("capture.f32")?;
//! let request = ConvertRequest::new(None, SampleFormat::Float32);
//! let report = convert(&request, &ConvertOptions::default(), &mut input, &mut output)?;
//! println!("{} samples", report.samples_written);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod format;
pub mod header;
pub mod paths;
pub mod pipeline;
pub mod riff;

pub use codec::{Codec, SampleCodec};
pub use error::{Error, Result, Role};
pub use format::SampleFormat;
pub use header::{WaveHeader, WaveInfo, HEADER_LEN};
pub use paths::{create_output, open_input, validate_paths};
pub use pipeline::{
    convert, wrap_raw, ConversionPlan, ConversionReport, ConversionSession, ConvertOptions,
    ConvertRequest, ConvertedBlocks, RawLayout, Stage, DEFAULT_BUFFER_SAMPLES,
};
pub use riff::{RiffLayout, RiffScanner, SCAN_BUDGET};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logging setup for the command-line tools.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Log conversion summaries.
    pub verbose: bool,
    /// Log scanner and stage details.
    pub debug: bool,
}

/// Installs the global `tracing` subscriber described by `config`.
///
/// Without either flag only warnings are shown. Calling this twice is a no-op.
pub fn init(config: &Config) {
    let level = if config.debug {
        "debug"
    } else if config.verbose {
        "info"
    } else {
        "warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .try_init();
}
