use std::fmt;
use std::str::FromStr;

use crate::codec::{Codec, Float32Le, Signed16Le, Signed8, Unsigned8};
use crate::error::{Error, Result};

/// WAVE `fmt ` sample-type code for integer PCM.
pub const SAMPLE_TYPE_PCM: u16 = 1;
/// WAVE `fmt ` sample-type code for IEEE float.
pub const SAMPLE_TYPE_FLOAT: u16 = 3;

/// Fixed-width sample encodings understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit integer samples, centered on 127.5.
    Uint8,
    /// Signed 8-bit integer samples.
    Int8,
    /// Signed 16-bit integer samples (little-endian).
    Int16,
    /// 32-bit IEEE float samples (little-endian).
    Float32,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 4] = [
        SampleFormat::Uint8,
        SampleFormat::Int8,
        SampleFormat::Int16,
        SampleFormat::Float32,
    ];

    /// Returns the number of bytes per sample for this format.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::Uint8 | SampleFormat::Int8 => 1,
            SampleFormat::Int16 => 2,
            SampleFormat::Float32 => 4,
        }
    }

    /// The token used on the command line (`u8`, `s8`, `s16`, `f32`).
    pub fn token(&self) -> &'static str {
        match self {
            SampleFormat::Uint8 => "u8",
            SampleFormat::Int8 => "s8",
            SampleFormat::Int16 => "s16",
            SampleFormat::Float32 => "f32",
        }
    }

    /// The `(sample type code, bit depth)` pair this format uses inside a WAVE
    /// container. Signed 8-bit has no WAVE representation.
    pub fn wave_type(&self) -> Option<(u16, u16)> {
        match self {
            SampleFormat::Uint8 => Some((SAMPLE_TYPE_PCM, 8)),
            SampleFormat::Int8 => None,
            SampleFormat::Int16 => Some((SAMPLE_TYPE_PCM, 16)),
            SampleFormat::Float32 => Some((SAMPLE_TYPE_FLOAT, 32)),
        }
    }

    /// Maps a WAVE `(sample type code, bit depth)` pair back to a format.
    pub fn from_wave_type(sample_type: u16, bit_depth: u16) -> Result<Self> {
        match (sample_type, bit_depth) {
            (SAMPLE_TYPE_PCM, 8) => Ok(SampleFormat::Uint8),
            (SAMPLE_TYPE_PCM, 16) => Ok(SampleFormat::Int16),
            (SAMPLE_TYPE_FLOAT, 32) => Ok(SampleFormat::Float32),
            (SAMPLE_TYPE_FLOAT, bits) => Err(Error::container(format!(
                "unsupported WAV format float, {bits} bits"
            ))),
            (SAMPLE_TYPE_PCM, bits) => Err(Error::container(format!(
                "unsupported WAV format PCM, {bits} bits"
            ))),
            (code, _) => Err(Error::container(format!(
                "unsupported WAV sample type code {code}"
            ))),
        }
    }

    /// Returns the codec that converts this format to and from `f32`.
    #[inline]
    pub fn codec(&self) -> Codec {
        match self {
            SampleFormat::Uint8 => Codec::Unsigned8(Unsigned8),
            SampleFormat::Int8 => Codec::Signed8(Signed8),
            SampleFormat::Int16 => Codec::Signed16(Signed16Le),
            SampleFormat::Float32 => Codec::Float32(Float32Le),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for SampleFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SampleFormat::ALL
            .into_iter()
            .find(|format| format.token() == s)
            .ok_or_else(|| {
                Error::argument(format!(
                    "unknown sample format '{s}', possible values are: u8, s8, s16, f32"
                ))
            })
    }
}
