//! Float waveform to 8-bit table values.
//!
//! The firmware reads tables as unsigned bytes and subtracts 127 at playback,
//! so the signed result of quantization is shifted up by 127 here. Scaling
//! truncates toward zero rather than rounding; that is what the original
//! tables were generated with and what the hardware was tuned against.

use crate::config::SampleSpec;
use crate::error::{Error, Result};

/// Signed full-scale value; also the unsigned offset.
const SCALE: i32 = 127;

/// One converted sample, ready for table emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedSample {
    /// Source filename, carried into the table header's report block.
    pub file: String,
    pub data: Vec<u8>,
}

impl QuantizedSample {
    /// Table size in flash. One byte per sample.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Quantize a mono waveform in roughly [-1, 1] per `spec`.
///
/// Steps, in order: normalize to peak, scale to [-127, 127] with truncation,
/// strip leading/trailing silence, drop `spec.trim` samples off the tail,
/// offset into the unsigned domain.
pub fn quantize(waveform: &[f32], spec: &SampleSpec) -> Result<QuantizedSample> {
    let gain = if spec.normalize {
        let peak = waveform.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        if waveform.is_empty() || peak == 0.0 {
            return Err(Error::EmptyOrSilentInput {
                file: spec.file.clone(),
            });
        }
        1.0 / peak
    } else {
        1.0
    };

    let scaled: Vec<i32> = waveform
        .iter()
        .map(|s| ((s * gain * SCALE as f32) as i32).clamp(-SCALE, SCALE))
        .collect();

    let trimmed = trim_zeros(&scaled);

    let kept = if spec.trim > 0 {
        if spec.trim >= trimmed.len() {
            return Err(Error::InvalidTrim {
                file: spec.file.clone(),
                trim: spec.trim,
                len: trimmed.len(),
            });
        }
        &trimmed[..trimmed.len() - spec.trim]
    } else {
        trimmed
    };

    Ok(QuantizedSample {
        file: spec.file.clone(),
        data: kept.iter().map(|&v| (v + SCALE) as u8).collect(),
    })
}

/// Strip leading and trailing zero values (silence after truncation).
fn trim_zeros(values: &[i32]) -> &[i32] {
    let start = match values.iter().position(|&v| v != 0) {
        Some(i) => i,
        None => return &[],
    };
    let end = values.iter().rposition(|&v| v != 0).unwrap() + 1;
    &values[start..end]
}
