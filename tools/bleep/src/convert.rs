//! The conversion run: config in, table headers + registry + dispatch out.
//!
//! Environments are independent failure domains. A sample that will not
//! quantize kills table generation for its own environment only; the
//! environment is still registered in platformio.ini (its build just keeps
//! whatever header was generated last) and every sibling environment is
//! processed. Only config and output I/O failures abort the run.

use std::path::{Path, PathBuf};

use crate::budget::{self, OverBudget};
use crate::config::{GlobalConfig, SampleSetConfig};
use crate::error::Result;
use crate::quantize::{self, QuantizedSample};
use crate::registry::Registry;
use crate::{dispatch, table, wav};

/// The hardware mixes exactly four sample voices.
pub const VOICE_SLOTS: usize = 4;

/// What happened to one environment.
#[derive(Debug)]
pub struct EnvReport {
    pub env: String,
    pub warnings: Vec<String>,
    /// `Err` means table generation was aborted for this environment.
    pub outcome: Result<TableOutcome>,
}

#[derive(Debug)]
pub struct TableOutcome {
    pub path: PathBuf,
    pub total_size: usize,
    pub over_budget: Option<OverBudget>,
}

#[derive(Debug)]
pub struct RunReport {
    pub envs: Vec<EnvReport>,
}

impl RunReport {
    pub fn failed_envs(&self) -> impl Iterator<Item = &EnvReport> {
        self.envs.iter().filter(|e| e.outcome.is_err())
    }
}

/// Convert every sample set in `config`, then bring the registry and the
/// dispatch header in line with what exists.
pub fn run(
    config: &GlobalConfig,
    input_dir: &Path,
    output_dir: &Path,
    registry_path: &Path,
) -> Result<RunReport> {
    let available = config.available();
    let mut registry = Registry::load(registry_path)?;
    std::fs::create_dir_all(output_dir)?;

    let mut envs = Vec::with_capacity(config.samples.len());
    for (name, set) in &config.samples {
        println!("Converting {name}...");
        let report = convert_env(name, set, input_dir, output_dir, available)?;
        for warning in &report.warnings {
            eprintln!("  warning: {warning}");
        }
        match &report.outcome {
            Ok(outcome) => {
                println!("  wrote {} ({} bytes)", outcome.path.display(), outcome.total_size);
                if let Some(over) = &outcome.over_budget {
                    eprintln!(
                        "  warning: {} does not fit, reduce by {} bytes (trims or a lower sample rate)",
                        over.set_name, over.over_by
                    );
                }
            }
            Err(e) => eprintln!("  skipped table generation for {name}: {e}"),
        }

        // Registration is independent of conversion outcome: a failed set
        // still gets a build environment pointing at its table header.
        registry.upsert(name, &[]);
        envs.push(report);
    }

    registry.save()?;

    let header = dispatch::generate(&registry.user_environments());
    let header_path = output_dir.join("samples.h");
    std::fs::write(&header_path, header)?;
    println!("Wrote {}", header_path.display());

    Ok(RunReport { envs })
}

fn convert_env(
    name: &str,
    set: &SampleSetConfig,
    input_dir: &Path,
    output_dir: &Path,
    available: usize,
) -> Result<EnvReport> {
    let mut warnings = Vec::new();
    let input_dir = set.input_path.as_deref().unwrap_or(input_dir);

    let outcome: Result<TableOutcome> = (|| {
        let specs = set.specs(name)?;
        if specs.len() != VOICE_SLOTS {
            warnings.push(format!(
                "{name} has {} samples, the hardware plays {VOICE_SLOTS}",
                specs.len()
            ));
        }

        let mut samples: Vec<QuantizedSample> = Vec::with_capacity(specs.len());
        for spec in specs {
            let (waveform, _rate) = wav::decode(&input_dir.join(&spec.file), spec.sample_rate)?;
            samples.push(quantize::quantize(&waveform, spec)?);
        }

        let (source, total_size) = table::encode(&samples);
        let path = output_dir.join(format!("samples_{}.h", name.to_lowercase()));
        std::fs::write(&path, source)?;

        Ok(TableOutcome {
            path,
            total_size,
            over_budget: budget::check(total_size, available, name),
        })
    })();

    Ok(EnvReport {
        env: name.to_string(),
        warnings,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 19626,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn ramp(len: usize) -> Vec<i16> {
        (0..len).map(|i| ((i % 256) as i16 + 1) * 64).collect()
    }

    #[test]
    fn a_bad_sample_does_not_stop_sibling_environments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        write_wav(&input.join("good.wav"), &ramp(32));
        write_wav(&input.join("silent.wav"), &[0; 32]);

        let config = GlobalConfig::parse(
            r#"
            samples.broken = ["silent.wav"]
            samples.fine = ["good.wav"]
            "#,
        )
        .unwrap();

        let report = run(
            &config,
            &input,
            &output,
            &dir.path().join("platformio.ini"),
        )
        .unwrap();

        assert_eq!(report.envs.len(), 2);
        assert!(matches!(
            report.envs[0].outcome,
            Err(Error::EmptyOrSilentInput { .. })
        ));
        assert!(report.envs[1].outcome.is_ok());
        assert!(!output.join("samples_broken.h").exists());
        assert!(output.join("samples_fine.h").exists());

        // both environments registered regardless of outcome
        let reg = Registry::load(&dir.path().join("platformio.ini")).unwrap();
        assert_eq!(reg.environments(), ["broken", "fine"]);
    }

    #[test]
    fn missing_samples_field_skips_only_that_environment() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        write_wav(&input.join("kick.wav"), &ramp(16));

        let config = GlobalConfig::parse(
            r#"
            [samples.empty]
            input_path = "wherever"

            [samples.kit]
            samples = ["kick.wav"]
            "#,
        )
        .unwrap();

        let report = run(
            &config,
            &input,
            &dir.path().join("out"),
            &dir.path().join("platformio.ini"),
        )
        .unwrap();

        assert!(matches!(
            report.envs[0].outcome,
            Err(Error::MissingSamplesField(_))
        ));
        assert!(report.envs[1].outcome.is_ok());
    }

    #[test]
    fn slot_count_mismatch_is_a_warning_not_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        write_wav(&input.join("kick.wav"), &ramp(16));

        let config = GlobalConfig::parse("samples.kit = [\"kick.wav\"]").unwrap();
        let report = run(
            &config,
            &input,
            &dir.path().join("out"),
            &dir.path().join("platformio.ini"),
        )
        .unwrap();

        assert_eq!(report.envs[0].warnings.len(), 1);
        assert!(report.envs[0].outcome.is_ok());
    }

    #[test]
    fn over_budget_is_reported_but_the_table_is_still_written() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        write_wav(&input.join("long.wav"), &ramp(512));

        let config = GlobalConfig::parse(
            r#"
            flash_size = 300
            firmware_size = 200
            samples.big = ["long.wav"]
            "#,
        )
        .unwrap();

        let report = run(
            &config,
            &input,
            &output,
            &dir.path().join("platformio.ini"),
        )
        .unwrap();

        let outcome = report.envs[0].outcome.as_ref().unwrap();
        let over = outcome.over_budget.as_ref().unwrap();
        assert_eq!(over.over_by, outcome.total_size - 100);
        assert!(outcome.path.exists());
    }

    #[test]
    fn dispatch_header_lists_user_environments_in_registry_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        let output = dir.path().join("out");
        std::fs::create_dir_all(&input).unwrap();
        write_wav(&input.join("kick.wav"), &ramp(16));

        // a factory env already present in the registry stays out of samples.h
        std::fs::write(
            dir.path().join("platformio.ini"),
            "[env:bleep]\nplatform = atmelavr\n",
        )
        .unwrap();

        let config = GlobalConfig::parse(
            r#"
            samples.tr909 = ["kick.wav"]
            samples.dx = ["kick.wav"]
            "#,
        )
        .unwrap();

        run(
            &config,
            &input,
            &output,
            &dir.path().join("platformio.ini"),
        )
        .unwrap();

        let header = std::fs::read_to_string(output.join("samples.h")).unwrap();
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(
            lines,
            [
                "#ifdef TR909",
                "#include \"samples_tr909.h\"",
                "#elif defined(DX)",
                "#include \"samples_dx.h\"",
                "#endif",
            ]
        );
    }
}
