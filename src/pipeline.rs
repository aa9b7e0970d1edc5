//! Streaming sample conversion with optional WAVE wrapping.
//!
//! A conversion runs in two steps. [`ConversionPlan::resolve`] inspects the
//! input and settles every format decision without touching the output.
//! [`ConversionPlan::execute`] then writes the provisional header, streams the
//! samples through the float intermediate and patches the header sizes once the
//! real data length is known.

use std::fmt::Debug;
use std::io::{self, Read, Seek, SeekFrom, Write};

use aligned_vec::{avec_rt, AVec, RuntimeAlign};
use fallible_streaming_iterator::FallibleStreamingIterator;
use tracing::{debug, info, warn};

use crate::codec::{Codec, SampleCodec};
use crate::error::{Error, Result};
use crate::format::SampleFormat;
use crate::header::WaveHeader;
use crate::riff::{RiffLayout, RiffScanner};

/// Number of samples converted per block unless configured otherwise.
pub const DEFAULT_BUFFER_SAMPLES: usize = 1 << 20;

/// Alignment of the conversion buffers (one cache line).
const BUFFER_ALIGN: usize = 64;

/// Sample rate and channel count of a raw stream, needed to synthesize a
/// WAVE header when the input has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    pub sample_rate: u32,
    pub channels: u16,
}

/// What the caller asks the converter to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertRequest {
    /// Explicit input format, or `None` to take it from the input's WAVE header.
    pub input_format: Option<SampleFormat>,
    pub output_format: SampleFormat,
    /// Wrap the output in a WAVE container.
    pub wav_output: bool,
    /// Layout used to build a header for raw input with WAVE output.
    pub raw_layout: Option<RawLayout>,
}

impl ConvertRequest {
    pub fn new(input_format: Option<SampleFormat>, output_format: SampleFormat) -> Self {
        Self {
            input_format,
            output_format,
            wav_output: false,
            raw_layout: None,
        }
    }

    pub fn wav_output(mut self, wav_output: bool) -> Self {
        self.wav_output = wav_output;
        self
    }

    pub fn raw_layout(mut self, layout: RawLayout) -> Self {
        self.raw_layout = Some(layout);
        self
    }
}

/// Tuning knobs for the streaming loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Samples converted per read. Every conversion path uses this one size.
    pub buffer_samples: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            buffer_samples: DEFAULT_BUFFER_SAMPLES,
        }
    }
}

/// Lifecycle of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    HeaderResolved,
    Streaming,
    Finalized,
    Failed,
}

/// Runtime state of one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSession {
    pub input_format: SampleFormat,
    pub output_format: SampleFormat,
    pub wav_output: bool,
    /// Byte offset of the first input sample.
    pub data_start: u64,
    pub samples_written: u64,
    pub stage: Stage,
}

impl ConversionSession {
    fn enter(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "Conversion stage change");
        self.stage = stage;
    }
}

/// Summary of a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionReport {
    pub input_format: SampleFormat,
    pub output_format: SampleFormat,
    pub wav_output: bool,
    pub data_start: u64,
    pub samples_written: u64,
    /// Bytes of sample data written, excluding any header.
    pub data_bytes: u64,
}

/// A validated conversion, ready to run.
#[derive(Debug)]
pub struct ConversionPlan {
    session: ConversionSession,
    /// Provisional header, present when producing a WAVE container.
    header: Option<WaveHeader>,
}

impl ConversionPlan {
    /// Resolves the effective formats and data offset of `input`.
    ///
    /// Nothing is written anywhere; `input` is left at its start.
    ///
    /// # Errors
    /// - `Error::UnsupportedCombination` for signed 8-bit WAVE output, or WAVE
    ///   output from raw input without a [`RawLayout`].
    /// - `Error::Argument` when an input format is given for WAVE input, or
    ///   missing for raw input.
    /// - `Error::ContainerDecode` when the input header names an unsupported
    ///   sample type.
    pub fn resolve<R: Read + Seek>(request: &ConvertRequest, input: &mut R) -> Result<Self> {
        if request.wav_output && request.output_format.wave_type().is_none() {
            return Err(Error::UnsupportedCombination("WAV does not support s8"));
        }

        let scanner = RiffScanner::new(input)?;
        let file_len = scanner.file_len();
        let layout = scanner.scan()?;

        let (input_format, data_start) = match (&layout, request.input_format) {
            (RiffLayout::Container { .. }, Some(_)) => {
                return Err(Error::argument(
                    "you may not specify an input sample format for WAV files",
                ))
            }
            (RiffLayout::Container { header, data_start }, None) => {
                (header.sample_format()?, *data_start)
            }
            (RiffLayout::Headerless, Some(format)) => (format, 0),
            (RiffLayout::Headerless, None) => {
                return Err(Error::argument(
                    "an input sample format is required for raw input",
                ))
            }
        };

        let header = if request.wav_output {
            let (channels, sample_rate) = match (layout.header(), request.raw_layout) {
                (Some(input_header), _) => (input_header.channels, input_header.sample_rate),
                (None, Some(raw)) => (raw.channels, raw.sample_rate),
                (None, None) => {
                    return Err(Error::UnsupportedCombination(
                        "WAV output requires WAV input or an explicit sample rate and channel count",
                    ))
                }
            };
            let projected = file_len.saturating_sub(data_start)
                / input_format.bytes_per_sample() as u64
                * request.output_format.bytes_per_sample() as u64;
            Some(WaveHeader::build(
                request.output_format,
                channels,
                sample_rate,
                projected,
            )?)
        } else {
            None
        };

        let mut session = ConversionSession {
            input_format,
            output_format: request.output_format,
            wav_output: request.wav_output,
            data_start,
            samples_written: 0,
            stage: Stage::Idle,
        };
        session.enter(Stage::HeaderResolved);

        Ok(Self { session, header })
    }

    pub fn session(&self) -> &ConversionSession {
        &self.session
    }

    /// The provisional header that will be written first, if any.
    pub fn header(&self) -> Option<&WaveHeader> {
        self.header.as_ref()
    }

    /// Streams `input` into `output` and finalizes the WAVE header.
    ///
    /// On error the output is left in an unspecified, possibly truncated state.
    pub fn execute<R, W>(
        mut self,
        input: &mut R,
        output: &mut W,
        options: &ConvertOptions,
    ) -> Result<ConversionReport>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        match self.run(input, output, options) {
            Ok(report) => {
                self.session.enter(Stage::Finalized);
                info!(
                    input_format = %report.input_format,
                    output_format = %report.output_format,
                    samples = report.samples_written,
                    wav = report.wav_output,
                    "Conversion finished"
                );
                Ok(report)
            }
            Err(e) => {
                self.session.enter(Stage::Failed);
                Err(e)
            }
        }
    }

    fn run<R, W>(
        &mut self,
        input: &mut R,
        output: &mut W,
        options: &ConvertOptions,
    ) -> Result<ConversionReport>
    where
        R: Read + Seek,
        W: Write + Seek,
    {
        if let Some(header) = &self.header {
            header.write_to(output)?;
        }
        input.seek(SeekFrom::Start(self.session.data_start))?;

        self.session.enter(Stage::Streaming);
        let mut blocks = ConvertedBlocks::new(
            input,
            self.session.input_format,
            self.session.output_format,
            options.buffer_samples,
        );
        while let Some(block) = blocks.next()? {
            output.write_all(block)?;
        }
        self.session.samples_written = blocks.samples_converted();

        let data_bytes =
            self.session.samples_written * self.session.output_format.bytes_per_sample() as u64;

        if let Some(header) = self.header {
            let end = output.stream_position()?;
            output.seek(SeekFrom::Start(0))?;
            header.patch_sizes(data_bytes).write_to(output)?;
            output.seek(SeekFrom::Start(end))?;
        }
        output.flush()?;

        Ok(ConversionReport {
            input_format: self.session.input_format,
            output_format: self.session.output_format,
            wav_output: self.session.wav_output,
            data_start: self.session.data_start,
            samples_written: self.session.samples_written,
            data_bytes,
        })
    }
}

/// Resolves and executes a conversion in one call.
pub fn convert<R, W>(
    request: &ConvertRequest,
    options: &ConvertOptions,
    input: &mut R,
    output: &mut W,
) -> Result<ConversionReport>
where
    R: Read + Seek,
    W: Write + Seek,
{
    ConversionPlan::resolve(request, input)?.execute(input, output, options)
}

/// Prepends a synthesized WAVE header to the raw samples in `input` and copies
/// them to `output` unchanged. Returns the number of data bytes copied.
///
/// # Errors
/// Returns `Error::UnsupportedCombination` for signed 8-bit samples, before
/// anything is written.
pub fn wrap_raw<R, W>(
    input: &mut R,
    output: &mut W,
    format: SampleFormat,
    layout: RawLayout,
) -> Result<u64>
where
    R: Read + Seek,
    W: Write,
{
    let data_len = input.seek(SeekFrom::End(0))?;
    input.rewind()?;

    let header = WaveHeader::build(format, layout.channels, layout.sample_rate, data_len)?;
    header.write_to(output)?;
    let copied = io::copy(input, output)?;
    if copied != data_len {
        warn!(copied, expected = data_len, "Input changed size while copying");
    }
    output.flush()?;

    info!(%format, data_bytes = copied, "Wrapped raw samples in a WAV header");
    Ok(copied)
}

// --- Streaming ---

/// Reads input-format samples block by block and yields each block converted
/// to the output format.
///
/// The three buffers are allocated once and reused for every block. Iteration
/// ends after the first block shorter than the buffer capacity.
pub struct ConvertedBlocks<'a, R: Read> {
    reader: &'a mut R,
    decoder: Codec,
    encoder: Codec,
    in_width: usize,
    out_width: usize,
    capacity: usize,
    // Raw input bytes
    rbuffer: AVec<u8, RuntimeAlign>,
    // Normalized intermediate
    fbuffer: AVec<f32, RuntimeAlign>,
    // Encoded output bytes
    wbuffer: AVec<u8, RuntimeAlign>,
    samples_in_block: usize,
    samples_converted: u64,
    is_data_available: bool,
}

impl<'a, R: Read> ConvertedBlocks<'a, R> {
    pub fn new(
        reader: &'a mut R,
        input_format: SampleFormat,
        output_format: SampleFormat,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let in_width = input_format.bytes_per_sample();
        let out_width = output_format.bytes_per_sample();

        Self {
            reader,
            decoder: input_format.codec(),
            encoder: output_format.codec(),
            in_width,
            out_width,
            capacity,
            rbuffer: avec_rt!([BUFFER_ALIGN] | 0u8; capacity * in_width),
            fbuffer: avec_rt!([BUFFER_ALIGN] | 0f32; capacity),
            wbuffer: avec_rt!([BUFFER_ALIGN] | 0u8; capacity * out_width),
            samples_in_block: 0,
            samples_converted: 0,
            is_data_available: true,
        }
    }

    /// Total samples converted so far.
    pub fn samples_converted(&self) -> u64 {
        self.samples_converted
    }

    /// Reads until `rbuffer` is full or the input is exhausted.
    fn fill(&mut self) -> Result<usize> {
        let mut filled = 0;
        while filled < self.rbuffer.len() {
            match self.reader.read(&mut self.rbuffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> FallibleStreamingIterator for ConvertedBlocks<'_, R> {
    type Item = [u8];
    type Error = Error;

    fn advance(&mut self) -> Result<()> {
        if !self.is_data_available {
            self.samples_in_block = 0;
            return Ok(());
        }

        let filled = self.fill()?;
        let samples = filled / self.in_width;
        let leftover = filled % self.in_width;
        if leftover != 0 {
            warn!(
                bytes = leftover,
                "Input ends with a partial sample, dropping it"
            );
        }

        // A short block means the input is exhausted.
        self.is_data_available = samples == self.capacity;
        self.samples_in_block = samples;

        let fbuffer = &mut self.fbuffer[..samples];
        self.decoder
            .decode(&self.rbuffer[..samples * self.in_width], fbuffer);
        self.encoder
            .encode(fbuffer, &mut self.wbuffer[..samples * self.out_width]);
        self.samples_converted += samples as u64;

        Ok(())
    }

    fn get(&self) -> Option<&[u8]> {
        if self.samples_in_block > 0 {
            Some(&self.wbuffer[..self.samples_in_block * self.out_width])
        } else {
            None
        }
    }
}

impl<R: Read> Debug for ConvertedBlocks<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConvertedBlocks")
            .field("decoder", &self.decoder)
            .field("encoder", &self.encoder)
            .field("capacity", &self.capacity)
            .field("samples_converted", &self.samples_converted)
            .finish_non_exhaustive()
    }
}
