use std::path::PathBuf;

/// Everything that can go wrong between a config file and a flashed table.
///
/// Only `Config` and `Io` abort a whole run; the per-sample and per-environment
/// kinds are caught by the orchestrator, reported, and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("environment '{0}' has no samples list")]
    MissingSamplesField(String),

    #[error("{file}: input is empty or pure silence, nothing to quantize")]
    EmptyOrSilentInput { file: String },

    #[error("{file}: trim {trim} >= {len} remaining samples, table would be empty")]
    InvalidTrim { file: String, trim: usize, len: usize },

    #[error("unknown environment '{0}'")]
    UnknownEnvironment(String),

    #[error("{path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("{tool} exited with {status}")]
    ToolFailed {
        tool: String,
        status: std::process::ExitStatus,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
