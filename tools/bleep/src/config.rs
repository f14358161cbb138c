//! Conversion config loading.
//!
//! The config is a TOML mapping of environment name to sample set. Sample
//! entries come in two shapes, a bare filename or a table overriding any of
//! the per-sample knobs, and both are normalized into [`SampleSpec`] at parse
//! time so nothing downstream branches on shape.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Bleep Drum playback rate (2x the timer interrupt rate).
pub const DEFAULT_SAMPLE_RATE: usize = 9813 * 2;

/// Flash left over for an ATmega328 after the Arduino bootloader.
pub const DEFAULT_FLASH_SIZE: usize = 32256;

/// One audio source and how to squeeze it into the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSpec {
    /// Path relative to the sample set's input directory.
    pub file: String,
    /// Extra samples to drop from the tail, after silence trimming.
    pub trim: usize,
    pub sample_rate: usize,
    pub normalize: bool,
}

/// A named group of samples converted into one table header.
///
/// Order is significant: it assigns `table0`, `table1`, ... and the firmware
/// hard-wires which voice reads which index.
#[derive(Debug, Clone)]
pub struct SampleSetConfig {
    /// Overrides the run-wide input directory for this set only.
    pub input_path: Option<PathBuf>,
    pub samples: Option<Vec<SampleSpec>>,
}

impl SampleSetConfig {
    /// The specs, or `MissingSamplesField` for a set declared without any.
    pub fn specs(&self, env: &str) -> Result<&[SampleSpec]> {
        self.samples
            .as_deref()
            .ok_or_else(|| Error::MissingSamplesField(env.to_string()))
    }
}

#[derive(Debug)]
pub struct GlobalConfig {
    pub sample_rate: usize,
    pub firmware_size: usize,
    pub flash_size: usize,
    pub samples: IndexMap<String, SampleSetConfig>,
}

impl GlobalConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        Ok(Self::from_raw(raw))
    }

    /// Flash bytes left for sample tables. Computed once; every
    /// environment checks against the same number.
    pub fn available(&self) -> usize {
        self.flash_size.saturating_sub(self.firmware_size)
    }

    fn from_raw(raw: RawConfig) -> Self {
        let sample_rate = raw.sr.unwrap_or(DEFAULT_SAMPLE_RATE);
        let samples = raw
            .samples
            .into_iter()
            .map(|(name, set)| (name, set.normalize(sample_rate)))
            .collect();
        GlobalConfig {
            sample_rate,
            firmware_size: raw.firmware_size.unwrap_or(0),
            flash_size: raw.flash_size.unwrap_or(DEFAULT_FLASH_SIZE),
            samples,
        }
    }
}

#[derive(Deserialize)]
struct RawConfig {
    firmware_size: Option<usize>,
    flash_size: Option<usize>,
    sr: Option<usize>,
    #[serde(default)]
    samples: IndexMap<String, RawSampleSet>,
}

/// An environment's value: either a bare entry list or a table with
/// `input_path` and `samples`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSampleSet {
    Bare(Vec<RawEntry>),
    Detailed {
        input_path: Option<PathBuf>,
        samples: Option<Vec<RawEntry>>,
    },
}

impl RawSampleSet {
    fn normalize(self, default_rate: usize) -> SampleSetConfig {
        let (input_path, entries) = match self {
            RawSampleSet::Bare(entries) => (None, Some(entries)),
            RawSampleSet::Detailed { input_path, samples } => (input_path, samples),
        };
        SampleSetConfig {
            input_path,
            samples: entries
                .map(|e| e.into_iter().map(|e| e.normalize(default_rate)).collect()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Bare(String),
    Detailed {
        file: String,
        trim: Option<usize>,
        sr: Option<usize>,
        normalize: Option<bool>,
    },
}

impl RawEntry {
    fn normalize(self, default_rate: usize) -> SampleSpec {
        match self {
            RawEntry::Bare(file) => SampleSpec {
                file,
                trim: 0,
                sample_rate: default_rate,
                normalize: true,
            },
            RawEntry::Detailed { file, trim, sr, normalize } => SampleSpec {
                file,
                trim: trim.unwrap_or(0),
                sample_rate: sr.unwrap_or(default_rate),
                normalize: normalize.unwrap_or(true),
            },
        }
    }
}
