//! WAV decoding for the conversion pipeline.
//!
//! Everything the quantizer needs is "this file, as mono f32 at the table's
//! playback rate". Multi-channel input is downmixed by averaging and rate
//! conversion is plain linear interpolation; at the 8-bit/10kHz fidelity of
//! the target hardware a nicer resampler buys nothing audible.

use std::path::Path;

use crate::error::{Error, Result};

/// Decode `path` to a mono waveform at `target_rate`.
///
/// Returns the samples and the rate actually used (always `target_rate`).
pub fn decode(path: &Path, target_rate: usize) -> Result<(Vec<f32>, usize)> {
    let wav_err = |source| Error::Wav {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(wav_err)?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(wav_err)?
        }
    };

    let mono = downmix(&interleaved, spec.channels as usize);
    let out = if spec.sample_rate as usize == target_rate {
        mono
    } else {
        resample_linear(&mono, spec.sample_rate as usize, target_rate)
    };
    Ok((out, target_rate))
}

/// Average interleaved frames down to one channel.
fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn resample_linear(input: &[f32], from_rate: usize, to_rate: usize) -> Vec<f32> {
    if input.is_empty() {
        return Vec::new();
    }
    let out_len = (input.len() * to_rate + from_rate / 2) / from_rate;
    let step = from_rate as f64 / to_rate as f64;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = pos as usize;
            if idx + 1 >= input.len() {
                input[input.len() - 1]
            } else {
                let frac = (pos - idx as f64) as f32;
                input[idx] * (1.0 - frac) + input[idx + 1] * frac
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_mono_is_identity() {
        let mono = [0.25, -0.75];
        assert_eq!(downmix(&mono, 1), mono.to_vec());
    }

    #[test]
    fn resample_halves_length_on_2_to_1() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample_linear(&input, 44100, 22050);
        assert_eq!(out.len(), 50);
        // a straight ramp stays a straight ramp
        assert!((out[25] - input[50]).abs() < 1e-4);
    }

    #[test]
    fn resample_same_rate_roundtrips_through_decode_path() {
        let input = [0.1f32, 0.2, 0.3];
        let out = resample_linear(&input, 8000, 16000);
        assert_eq!(out.len(), 6);
        assert!((out[0] - 0.1).abs() < 1e-6);
        // interpolated midpoint between the first two samples
        assert!((out[1] - 0.15).abs() < 1e-6);
    }

    #[test]
    fn decode_reads_mono_16bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 19626,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..64i32 {
            writer.write_sample((i * 256) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, rate) = decode(&path, 19626).unwrap();
        assert_eq!(rate, 19626);
        assert_eq!(samples.len(), 64);
        assert!((samples[1] - 256.0 / 32768.0).abs() < 1e-6);
    }

    #[test]
    fn decode_missing_file_is_a_wav_error() {
        let err = decode(Path::new("/nonexistent/nope.wav"), 19626).unwrap_err();
        assert!(matches!(err, Error::Wav { .. }));
    }
}
