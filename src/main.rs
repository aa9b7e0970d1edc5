//! iqtools CLI
//!
//! Converts raw IQ/audio sample streams between encodings and wraps them in
//! WAV containers.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use iqtools::{
    create_output, init, open_input, validate_paths, wrap_raw, Config, ConversionPlan,
    ConvertOptions, ConvertRequest, Error, RawLayout, SampleFormat, WaveInfo,
    DEFAULT_BUFFER_SAMPLES,
};

#[derive(Parser)]
#[command(name = "iqtools")]
#[command(about = "Sample format conversion for raw IQ and WAV files", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert samples between formats, reading and writing raw or WAV files
    Convert {
        /// Input file (raw samples or WAV)
        #[arg(short, long)]
        input: PathBuf,

        /// Input sample format, required for raw input [u8, s8, s16, f32]
        #[arg(long)]
        input_format: Option<SampleFormat>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output sample format [u8, s8, s16, f32]
        #[arg(short, long)]
        format: SampleFormat,

        /// Write a WAV header
        #[arg(short, long)]
        wav: bool,

        /// Sample rate for the WAV header of raw input
        #[arg(short = 'r', long, requires = "channels")]
        sample_rate: Option<u32>,

        /// Channel count for the WAV header of raw input
        #[arg(short, long, requires = "sample_rate")]
        channels: Option<u16>,

        /// Samples converted per block
        #[arg(long, default_value_t = DEFAULT_BUFFER_SAMPLES)]
        buffer_samples: usize,
    },

    /// Prepend a WAV header to a raw sample file
    Wrap {
        /// Raw input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Sample format of the input [u8, s16, f32]
        #[arg(short, long)]
        format: SampleFormat,

        /// Sample rate in Hz
        #[arg(short = 'r', long)]
        sample_rate: u32,

        /// Number of channels (2 for IQ)
        #[arg(short, long, default_value_t = 2)]
        channels: u16,
    },

    /// Print the header fields of a WAV file
    Info {
        /// WAV file
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init(&Config {
        verbose: cli.verbose,
        debug: cli.debug,
    });

    match cli.command {
        Commands::Convert {
            input,
            input_format,
            output,
            format,
            wav,
            sample_rate,
            channels,
            buffer_samples,
        } => {
            let mut request = ConvertRequest::new(input_format, format).wav_output(wav);
            if let (Some(sample_rate), Some(channels)) = (sample_rate, channels) {
                request = request.raw_layout(RawLayout {
                    sample_rate,
                    channels,
                });
            }
            info!("Converting {} -> {}", input.display(), output.display());
            cmd_convert(&input, &output, &request, &ConvertOptions { buffer_samples })?;
        }
        Commands::Wrap {
            input,
            output,
            format,
            sample_rate,
            channels,
        } => {
            info!("Wrapping {} -> {}", input.display(), output.display());
            cmd_wrap(
                &input,
                &output,
                format,
                RawLayout {
                    sample_rate,
                    channels,
                },
            )?;
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
    }

    Ok(())
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    request: &ConvertRequest,
    options: &ConvertOptions,
) -> anyhow::Result<()> {
    validate_paths(input, output)?;
    let mut reader = open_input(input)?;

    // Refuse the request before the output file exists.
    let plan = ConversionPlan::resolve(request, &mut reader)
        .with_context(|| format!("Cannot convert {}", input.display()))?;

    let mut writer = create_output(output)?;
    let report = plan.execute(&mut reader, &mut writer, options)?;

    println!(
        "{} -> {}: {} samples, {} bytes{}",
        report.input_format,
        report.output_format,
        report.samples_written,
        report.data_bytes,
        if report.wav_output { " (WAV)" } else { "" }
    );
    Ok(())
}

fn cmd_wrap(
    input: &Path,
    output: &Path,
    format: SampleFormat,
    layout: RawLayout,
) -> anyhow::Result<()> {
    validate_paths(input, output)?;
    if format.wave_type().is_none() {
        return Err(Error::UnsupportedCombination("WAV does not support s8").into());
    }

    let mut reader = open_input(input)?;
    let mut writer = create_output(output)?;
    let copied = wrap_raw(&mut reader, &mut writer, format, layout)?;

    println!("{}: {} data bytes wrapped", output.display(), copied);
    Ok(())
}

fn cmd_info(input: &Path) -> anyhow::Result<()> {
    let mut reader = BufReader::new(open_input(input)?);
    let info = WaveInfo::read(&mut reader)
        .with_context(|| format!("Cannot read WAV header of {}", input.display()))?;

    println!("File: {}", input.display());
    println!("  Sample type: {}", info.sample_type);
    println!("  Channels: {}", info.channels);
    println!("  Sample rate: {} Hz", info.sample_rate);
    println!("  Bit depth: {}", info.bit_depth);
    println!(
        "  Length (based on file size): {} minutes ({:.3} s)",
        (info.duration_seconds / 60.0) as u64,
        info.duration_seconds
    );
    Ok(())
}
