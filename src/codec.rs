//! Per-sample conversion between the raw encodings and the normalized `f32`
//! intermediate.
//!
//! Every codec works over caller-supplied slices with matching element counts
//! (`src.len() == dst.len() * width` on decode, the mirror on encode) and never
//! allocates, so the same buffers can be reused for the whole stream.

use enum_dispatch::enum_dispatch;

/// Converts one raw sample encoding to and from normalized `f32` samples.
#[enum_dispatch]
pub trait SampleCodec {
    /// Decodes little-endian raw bytes into normalized samples.
    fn decode(&self, src: &[u8], dst: &mut [f32]);

    /// Encodes normalized samples into little-endian raw bytes.
    fn encode(&self, src: &[f32], dst: &mut [u8]);
}

/// Static dispatch over the codec of every [`SampleFormat`](crate::SampleFormat).
#[enum_dispatch(SampleCodec)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Unsigned8(Unsigned8),
    Signed8(Signed8),
    Signed16(Signed16Le),
    Float32(Float32Le),
}

// --- Codec Implementations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unsigned8;

impl SampleCodec for Unsigned8 {
    #[inline]
    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        debug_assert_eq!(src.len(), dst.len());
        for (d, &byte) in dst.iter_mut().zip(src) {
            *d = u8_to_f32(byte);
        }
    }

    #[inline]
    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        debug_assert_eq!(src.len(), dst.len());
        for (d, &value) in dst.iter_mut().zip(src) {
            *d = f32_to_u8(value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signed8;

impl SampleCodec for Signed8 {
    #[inline]
    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        debug_assert_eq!(src.len(), dst.len());
        for (d, &byte) in dst.iter_mut().zip(src) {
            *d = i8_to_f32(byte as i8);
        }
    }

    #[inline]
    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        debug_assert_eq!(src.len(), dst.len());
        for (d, &value) in dst.iter_mut().zip(src) {
            *d = f32_to_i8(value) as u8;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signed16Le;

impl SampleCodec for Signed16Le {
    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        debug_assert_eq!(src.len(), dst.len() * 2);
        if cfg!(target_endian = "little") {
            if let Ok(samples) = bytemuck::try_cast_slice::<u8, i16>(src) {
                for (d, &sample) in dst.iter_mut().zip(samples) {
                    *d = i16_to_f32(sample);
                }
                return;
            }
        }
        for (d, bytes) in dst.iter_mut().zip(src.chunks_exact(2)) {
            *d = i16_to_f32(i16::from_le_bytes([bytes[0], bytes[1]]));
        }
    }

    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        debug_assert_eq!(src.len() * 2, dst.len());
        if cfg!(target_endian = "little") {
            if let Ok(samples) = bytemuck::try_cast_slice_mut::<u8, i16>(dst) {
                for (d, &value) in samples.iter_mut().zip(src) {
                    *d = f32_to_i16(value);
                }
                return;
            }
        }
        for (bytes, &value) in dst.chunks_exact_mut(2).zip(src) {
            bytes.copy_from_slice(&f32_to_i16(value).to_le_bytes());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Float32Le;

impl SampleCodec for Float32Le {
    fn decode(&self, src: &[u8], dst: &mut [f32]) {
        debug_assert_eq!(src.len(), dst.len() * 4);
        if cfg!(target_endian = "little") {
            if let Ok(samples) = bytemuck::try_cast_slice::<u8, f32>(src) {
                dst.copy_from_slice(samples);
                return;
            }
        }
        for (d, bytes) in dst.iter_mut().zip(src.chunks_exact(4)) {
            *d = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
    }

    fn encode(&self, src: &[f32], dst: &mut [u8]) {
        debug_assert_eq!(src.len() * 4, dst.len());
        if cfg!(target_endian = "little") {
            if let Ok(samples) = bytemuck::try_cast_slice_mut::<u8, f32>(dst) {
                samples.copy_from_slice(src);
                return;
            }
        }
        for (bytes, &value) in dst.chunks_exact_mut(4).zip(src) {
            bytes.copy_from_slice(&value.to_le_bytes());
        }
    }
}

// --- Scalar Sample Conversion Helpers ---

/// Converts an unsigned 8-bit sample to `f32`.
/// Uses a half-scale divisor, so 0 maps to -1.0 and 255 to 1.0 with 127.5 as
/// the (unrepresentable) center.
#[inline(always)]
pub fn u8_to_f32(byte: u8) -> f32 {
    (byte as f64 / 127.5 - 1.0) as f32
}

/// Converts an `f32` sample to unsigned 8-bit, truncating toward zero.
/// Out-of-range input saturates at 0 or 255.
#[inline(always)]
pub fn f32_to_u8(value: f32) -> u8 {
    ((value + 1.0) * (255.0 / 2.0)) as u8
}

#[inline(always)]
pub fn i8_to_f32(sample: i8) -> f32 {
    sample as f32 / 128.0
}

/// Scales by 127 and rounds to nearest (ties to even), saturating.
#[inline(always)]
pub fn f32_to_i8(value: f32) -> i8 {
    (value * 127.0).round_ties_even() as i8
}

#[inline(always)]
pub fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Scales by 32767 and rounds to nearest (ties to even), saturating.
#[inline(always)]
pub fn f32_to_i16(value: f32) -> i16 {
    (value * 32767.0).round_ties_even() as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SampleFormat;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_normalized(num_samples: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..num_samples)
            .map(|_| rng.random_range(-1.0f32..=1.0))
            .collect()
    }

    #[test]
    fn test_uint8_conversions() {
        assert_eq!(u8_to_f32(0), -1.0);
        assert_eq!(u8_to_f32(255), 1.0);
        assert!((u8_to_f32(128) - 0.003_921_569).abs() < 1e-7);
        assert!((u8_to_f32(64) + 0.498_039_2).abs() < 1e-6);

        assert_eq!(f32_to_u8(-1.0), 0);
        assert_eq!(f32_to_u8(0.0), 127); // 127.5 truncates
        assert_eq!(f32_to_u8(1.0), 255);
        // No clamping before conversion; the cast saturates.
        assert_eq!(f32_to_u8(2.0), 255);
        assert_eq!(f32_to_u8(-3.0), 0);
        assert_eq!(f32_to_u8(f32::NAN), 0);
    }

    #[test]
    fn test_int8_conversions() {
        assert_eq!(i8_to_f32(i8::MIN), -1.0);
        assert_eq!(i8_to_f32(0), 0.0);
        assert_eq!(i8_to_f32(64), 0.5);

        assert_eq!(f32_to_i8(1.0), 127);
        assert_eq!(f32_to_i8(-1.0), -127);
        assert_eq!(f32_to_i8(0.5), 64); // 63.5 rounds to even
        assert_eq!(f32_to_i8(4.0), i8::MAX);
        assert_eq!(f32_to_i8(-4.0), i8::MIN);
    }

    #[test]
    fn test_int16_conversions() {
        assert_eq!(i16_to_f32(i16::MIN), -1.0);
        assert_eq!(i16_to_f32(16384), 0.5);
        assert_eq!(f32_to_i16(1.0), 32767);
        assert_eq!(f32_to_i16(-1.0), -32767);
        assert_eq!(f32_to_i16(0.5), 16384); // 16383.5 rounds to even
        assert_eq!(f32_to_i16(1.5), i16::MAX);
        assert_eq!(f32_to_i16(-1.5), i16::MIN);
    }

    #[test]
    fn codec_decodes_little_endian_bytes() {
        let mut out = [0f32; 2];
        SampleFormat::Int16
            .codec()
            .decode(&[0x00, 0x40, 0x00, 0x80], &mut out);
        assert_eq!(out, [0.5, -1.0]);

        let mut out = [0f32; 2];
        let bytes = [0.25f32.to_le_bytes(), (-0.75f32).to_le_bytes()].concat();
        SampleFormat::Float32.codec().decode(&bytes, &mut out);
        assert_eq!(out, [0.25, -0.75]);

        let mut out = [0f32; 3];
        SampleFormat::Int8.codec().decode(&[0x80, 0x00, 0x40], &mut out);
        assert_eq!(out, [-1.0, 0.0, 0.5]);
    }

    #[test]
    fn round_trip_within_quantization_bound() {
        let samples = random_normalized(4096, 7);
        let bounds = [
            (SampleFormat::Uint8, 1.0 / 127.5),
            (SampleFormat::Int8, 2.0 / 127.0),
            (SampleFormat::Int16, 2.0 / 32767.0),
            (SampleFormat::Float32, 0.0),
        ];

        for (format, bound) in bounds {
            let codec = format.codec();
            let mut raw = vec![0u8; samples.len() * format.bytes_per_sample()];
            let mut back = vec![0f32; samples.len()];
            codec.encode(&samples, &mut raw);
            codec.decode(&raw, &mut back);

            for (i, (&a, &b)) in samples.iter().zip(&back).enumerate() {
                assert!(
                    (a - b).abs() <= bound,
                    "{format}: sample {i} {a} came back as {b} (bound {bound})"
                );
            }
        }
    }

    /// The aligned fast path and the byte-wise path must agree.
    fn compare_aligned_and_unaligned(format: SampleFormat, seed: u64) {
        let num_samples = 1031;
        let width = format.bytes_per_sample();
        let samples = random_normalized(num_samples, seed);
        let codec = format.codec();

        // u32 storage guarantees alignment for the first slice; the second one
        // starts one byte in, which defeats the reinterpreting cast.
        let mut aligned_store = vec![0u32; num_samples + 1];
        let mut unaligned_store = vec![0u32; num_samples + 1];
        let aligned = &mut bytemuck::cast_slice_mut::<u32, u8>(&mut aligned_store)
            [..num_samples * width];
        let unaligned = &mut bytemuck::cast_slice_mut::<u32, u8>(&mut unaligned_store)
            [1..1 + num_samples * width];

        codec.encode(&samples, aligned);
        codec.encode(&samples, unaligned);
        assert_eq!(&aligned[..], &unaligned[..], "{format}: encode mismatch");

        let mut from_aligned = vec![0f32; num_samples];
        let mut from_unaligned = vec![0f32; num_samples];
        codec.decode(aligned, &mut from_aligned);
        codec.decode(unaligned, &mut from_unaligned);
        assert_eq!(from_aligned, from_unaligned, "{format}: decode mismatch");
    }

    #[test]
    fn test_int16_aligned_vs_unaligned() {
        compare_aligned_and_unaligned(SampleFormat::Int16, 101);
    }

    #[test]
    fn test_float32_aligned_vs_unaligned() {
        compare_aligned_and_unaligned(SampleFormat::Float32, 102);
    }
}
