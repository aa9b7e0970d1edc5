//! The canonical 44-byte WAVE header: building, decoding and size patch-back.

use std::io::{Read, Seek, SeekFrom, Write};

use bytemuck::{Pod, Zeroable};
use tracing::warn;

use crate::error::{Error, Result};
use crate::format::{SampleFormat, SAMPLE_TYPE_FLOAT, SAMPLE_TYPE_PCM};

/// Size in bytes of the fixed RIFF/WAVE header written by this crate.
pub const HEADER_LEN: usize = 44;

const RIFF_ID: [u8; 4] = *b"RIFF";
const WAVE_ID: [u8; 4] = *b"WAVE";
const FMT_ID: [u8; 4] = *b"fmt ";
const DATA_ID: [u8; 4] = *b"data";
const FMT_CHUNK_LEN: u32 = 16;

/// The fixed-layout WAVE header: a RIFF preamble, a 16-byte `fmt ` chunk and
/// the `data` chunk header.
///
/// Fields hold native-endian values; [`WaveHeader::to_bytes`] and
/// [`WaveHeader::parse`] do the little-endian conversion.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct WaveHeader {
    pub riff_id: [u8; 4],
    /// Total file size minus 8.
    pub file_size: u32,
    pub wave_id: [u8; 4],
    pub fmt_id: [u8; 4],
    pub fmt_len: u32,
    /// 1 for PCM, 3 for IEEE float.
    pub sample_type: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    /// Bytes per multi-channel sample frame.
    pub block_align: u16,
    pub bit_depth: u16,
    pub data_id: [u8; 4],
    pub data_size: u32,
}

const _: () = assert!(
    std::mem::size_of::<WaveHeader>() == HEADER_LEN,
    "WaveHeader must match the 44-byte on-disk layout"
);

impl WaveHeader {
    /// Builds a header for `format` with every derived field filled in.
    ///
    /// # Errors
    /// Returns `Error::UnsupportedCombination` for formats without a WAVE
    /// representation (signed 8-bit), or when the block alignment or byte rate
    /// does not fit its header field.
    pub fn build(
        format: SampleFormat,
        channels: u16,
        sample_rate: u32,
        data_size: u64,
    ) -> Result<Self> {
        let (sample_type, bit_depth) = format
            .wave_type()
            .ok_or(Error::UnsupportedCombination("WAV does not support s8"))?;
        let block_align = (bit_depth / 8)
            .checked_mul(channels)
            .ok_or(Error::UnsupportedCombination(
                "channel count too large for the WAV block alignment field",
            ))?;
        let byte_rate = (block_align as u32)
            .checked_mul(sample_rate)
            .ok_or(Error::UnsupportedCombination(
                "sample rate too large for the WAV byte rate field",
            ))?;

        let header = WaveHeader {
            riff_id: RIFF_ID,
            file_size: 0,
            wave_id: WAVE_ID,
            fmt_id: FMT_ID,
            fmt_len: FMT_CHUNK_LEN,
            sample_type,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bit_depth,
            data_id: DATA_ID,
            data_size: 0,
        };
        Ok(header.patch_sizes(data_size))
    }

    /// Returns a copy with `data_size` and `file_size` describing `data_size`
    /// bytes of sample data.
    ///
    /// Sizes that do not fit the 32-bit fields saturate.
    pub fn patch_sizes(mut self, data_size: u64) -> Self {
        const MAX_DATA: u64 = u32::MAX as u64 - (HEADER_LEN as u64 - 8);
        if data_size > MAX_DATA {
            warn!(
                data_size,
                "Data size exceeds what a WAV header can describe; size fields saturated"
            );
        }
        let data_size = data_size.min(MAX_DATA);
        self.data_size = data_size as u32;
        self.file_size = (data_size + HEADER_LEN as u64 - 8) as u32;
        self
    }

    /// Parses the 44-byte header, validating only the three signatures.
    ///
    /// # Errors
    /// Returns `Error::ContainerDecode` if `bytes` is too short or a signature
    /// does not match.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::container("header shorter than 44 bytes"));
        }
        let header = bytemuck::pod_read_unaligned::<WaveHeader>(&bytes[..HEADER_LEN]).swap_le();

        if header.riff_id != RIFF_ID {
            return Err(Error::container("RIFF signature not found"));
        }
        if header.wave_id != WAVE_ID {
            return Err(Error::container("WAVE signature not found"));
        }
        if header.fmt_id != FMT_ID {
            return Err(Error::container("format marker not found"));
        }
        Ok(header)
    }

    /// Parses the header and maps its sample type to a [`SampleFormat`].
    ///
    /// # Errors
    /// Returns `Error::ContainerDecode` for bad signatures or any
    /// `(sample type, bit depth)` pair without a supported format.
    pub fn decode(bytes: &[u8]) -> Result<(Self, SampleFormat)> {
        let header = Self::parse(bytes)?;
        let format = header.sample_format()?;
        Ok((header, format))
    }

    /// Reads and parses a header from the current position of `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = [0u8; HEADER_LEN];
        reader.read_exact(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Maps `(sample_type, bit_depth)` to the matching [`SampleFormat`].
    pub fn sample_format(&self) -> Result<SampleFormat> {
        SampleFormat::from_wave_type(self.sample_type, self.bit_depth)
    }

    /// Serializes the header in its little-endian on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes.copy_from_slice(bytemuck::bytes_of(&self.swap_le()));
        bytes
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Human-readable name of the sample type code.
    pub fn sample_type_name(&self) -> &'static str {
        match self.sample_type {
            SAMPLE_TYPE_PCM => "PCM",
            SAMPLE_TYPE_FLOAT => "IEEE Float",
            _ => "unknown",
        }
    }

    /// Converts every integer field between native and little-endian order.
    /// A no-op on little-endian targets; applying it twice is the identity.
    fn swap_le(self) -> Self {
        WaveHeader {
            file_size: self.file_size.to_le(),
            fmt_len: self.fmt_len.to_le(),
            sample_type: self.sample_type.to_le(),
            channels: self.channels.to_le(),
            sample_rate: self.sample_rate.to_le(),
            byte_rate: self.byte_rate.to_le(),
            block_align: self.block_align.to_le(),
            bit_depth: self.bit_depth.to_le(),
            data_size: self.data_size.to_le(),
            ..self
        }
    }
}

/// Read-only summary of a WAVE header, as shown by the info query.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveInfo {
    pub sample_type: &'static str,
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: u16,
    /// Estimated from the file size, ignoring any trailing chunks.
    pub duration_seconds: f64,
}

impl WaveInfo {
    /// Summarizes `header` for a file of `file_len` bytes.
    pub fn from_header(header: &WaveHeader, file_len: u64) -> Self {
        let duration_seconds = if header.byte_rate > 0 {
            file_len.saturating_sub(HEADER_LEN as u64) as f64 / header.byte_rate as f64
        } else {
            0.0
        };

        WaveInfo {
            sample_type: header.sample_type_name(),
            channels: header.channels,
            sample_rate: header.sample_rate,
            bit_depth: header.bit_depth,
            duration_seconds,
        }
    }

    /// Reads the header at the start of `input` and summarizes it.
    pub fn read<R: Read + Seek>(input: &mut R) -> Result<Self> {
        let file_len = input.seek(SeekFrom::End(0))?;
        input.rewind()?;
        let header = WaveHeader::read_from(input)?;
        Ok(Self::from_header(&header, file_len))
    }
}
