//! File-level tests: the library against real files, and the iqtools binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use iqtools::{
    convert, create_output, open_input, ConvertOptions, ConvertRequest, Error, RawLayout,
    SampleFormat, WaveHeader, HEADER_LEN,
};
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

fn run_iqtools(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_iqtools"))
        .args(args)
        .output()
        .expect("Failed to execute iqtools")
}

fn stdout_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("Temp path is not UTF-8")
}

/// Interleaved stereo s16 ramp.
fn s16_ramp(frames: usize) -> Vec<u8> {
    (0..frames * 2)
        .flat_map(|i| ((i as i32 * 37 % 65536 - 32768) as i16).to_le_bytes())
        .collect()
}

fn write_wav(path: &Path, format: SampleFormat, rate: u32, samples: &[u8]) {
    let mut bytes = WaveHeader::build(format, 2, rate, samples.len() as u64)
        .unwrap()
        .to_bytes()
        .to_vec();
    bytes.extend_from_slice(samples);
    fs::write(path, bytes).unwrap();
}

// ============================================================================
// Library
// ============================================================================

#[test]
fn convert_wav_file_to_raw_file() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.f32");
    let samples = s16_ramp(5000);
    write_wav(&input_path, SampleFormat::Int16, 48000, &samples);

    let mut input = open_input(&input_path).unwrap();
    let mut output = create_output(&output_path).unwrap();
    let request = ConvertRequest::new(None, SampleFormat::Float32);
    let options = ConvertOptions {
        buffer_samples: 1000,
    };
    let report = convert(&request, &options, &mut input, &mut output).unwrap();
    drop(output);

    assert_eq!(report.samples_written, 10_000);
    let written = fs::read(&output_path).unwrap();
    assert_eq!(written.len(), 40_000);

    let first = f32::from_le_bytes([written[0], written[1], written[2], written[3]]);
    assert_eq!(first, -1.0);
}

#[test]
fn raw_file_to_wav_file_has_patched_header() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.u8");
    let output_path = dir.path().join("out.wav");
    fs::write(&input_path, vec![0x80u8; 3001]).unwrap();

    let mut input = open_input(&input_path).unwrap();
    let mut output = create_output(&output_path).unwrap();
    let request = ConvertRequest::new(Some(SampleFormat::Uint8), SampleFormat::Int16)
        .wav_output(true)
        .raw_layout(RawLayout {
            sample_rate: 250_000,
            channels: 1,
        });
    convert(&request, &ConvertOptions::default(), &mut input, &mut output).unwrap();
    drop(output);

    let written = fs::read(&output_path).unwrap();
    assert_eq!(written.len(), HEADER_LEN + 6002);
    let (header, format) = WaveHeader::decode(&written).unwrap();
    assert_eq!(format, SampleFormat::Int16);
    assert_eq!(header.data_size, 6002);
    assert_eq!(header.file_size, 6002 + 36);
    assert_eq!(header.sample_rate, 250_000);
}

#[test]
fn missing_input_file_reports_input_role() {
    let dir = TempDir::new().unwrap();
    match open_input(&dir.path().join("missing.raw")) {
        Err(Error::Open { role, .. }) => assert_eq!(role.to_string(), "input"),
        other => panic!("Expected Open error, got {:?}", other),
    }
}

// ============================================================================
// Binary
// ============================================================================

#[test]
fn cli_convert_raw_to_raw() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.u8");
    let output_path = dir.path().join("out.s16");
    fs::write(&input_path, [0u8, 255, 0, 255]).unwrap();

    let output = run_iqtools(&[
        "convert",
        "-i",
        path_str(&input_path),
        "--input-format",
        "u8",
        "-o",
        path_str(&output_path),
        "-f",
        "s16",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let written = fs::read(&output_path).unwrap();
    let samples: Vec<i16> = written
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(samples, vec![-32767, 32767, -32767, 32767]);
}

#[test]
fn cli_s8_wav_output_creates_no_file() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.wav");
    let output_path = dir.path().join("out.wav");
    write_wav(&input_path, SampleFormat::Int16, 8000, &s16_ramp(16));

    let output = run_iqtools(&[
        "convert",
        "-i",
        path_str(&input_path),
        "-o",
        path_str(&output_path),
        "-f",
        "s8",
        "-w",
    ]);
    assert!(!output.status.success());
    assert!(!output_path.exists());
}

#[test]
fn cli_rejects_identical_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("same.raw");
    fs::write(&path, [0u8; 8]).unwrap();

    let output = run_iqtools(&[
        "convert",
        "-i",
        path_str(&path),
        "--input-format",
        "u8",
        "-o",
        path_str(&path),
        "-f",
        "f32",
    ]);
    assert!(!output.status.success());
    assert_eq!(fs::read(&path).unwrap(), vec![0u8; 8]);
}

#[test]
fn cli_rejects_unknown_format_token() {
    let output = run_iqtools(&["convert", "-i", "a", "-o", "b", "-f", "s24"]);
    assert!(!output.status.success());
}

#[test]
fn cli_wrap_then_info() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("in.s16");
    let output_path = dir.path().join("out.wav");
    // One second of stereo s16 at 8 kHz.
    fs::write(&input_path, s16_ramp(8000)).unwrap();

    let output = run_iqtools(&[
        "wrap",
        "-i",
        path_str(&input_path),
        "-o",
        path_str(&output_path),
        "-f",
        "s16",
        "-r",
        "8000",
        "-c",
        "2",
    ]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(fs::metadata(&output_path).unwrap().len(), 32_000 + 44);

    let output = run_iqtools(&["info", path_str(&output_path)]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = stdout_string(&output);
    assert!(stdout.contains("Sample type: PCM"), "{stdout}");
    assert!(stdout.contains("Channels: 2"));
    assert!(stdout.contains("Sample rate: 8000 Hz"));
    assert!(stdout.contains("Bit depth: 16"));
    assert!(stdout.contains("Length (based on file size): 0 minutes (1.000 s)"));
}

#[test]
fn cli_info_on_raw_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.bin");
    fs::write(&path, [0x42u8; 100]).unwrap();

    let output = run_iqtools(&["info", path_str(&path)]);
    assert!(!output.status.success());
}

#[test]
fn cli_convert_wav_without_data_tag() {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("broken.wav");
    let output_path = dir.path().join("out.f32");
    write_wav(&input_path, SampleFormat::Int16, 8000, &s16_ramp(4));
    let mut bytes = fs::read(&input_path).unwrap();
    bytes[36..40].copy_from_slice(b"junk");
    fs::write(&input_path, &bytes).unwrap();

    // The format comes from the header even though the data chunk is missing.
    let output = run_iqtools(&[
        "convert",
        "-i",
        path_str(&input_path),
        "-o",
        path_str(&output_path),
        "-f",
        "f32",
    ]);
    assert!(output.status.success(), "{:?}", output);
    // Samples are read from byte 0: (44 + 16) / 2 s16 samples.
    assert_eq!(fs::metadata(&output_path).unwrap().len(), 30 * 4);

    // An explicit input format conflicts with the detected container.
    let output = run_iqtools(&[
        "convert",
        "-i",
        path_str(&input_path),
        "--input-format",
        "s16",
        "-o",
        path_str(&output_path),
        "-f",
        "f32",
    ]);
    assert!(!output.status.success());
}
