//! The build-environment registry, persisted as `platformio.ini`.
//!
//! The ini file is the source of truth for which sample-table build variants
//! exist. Sections are kept in an `IndexMap` so file order survives a
//! load/mutate/save cycle; platformio treats order as meaningful for
//! `default_envs` fallback and so do we for dispatch-header generation.
//!
//! Mutations rewrite the whole file. Concurrent external edits between a load
//! and a save are lost (last writer wins); this tool runs as a single
//! short-lived batch process, so that trade-off is documented rather than
//! fixed.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Environments compiled into the stock firmware. They already have table
/// headers in the source tree and must never show up in the generated
/// dispatch header.
pub const FACTORY_ENVS: [&str; 4] = ["dam", "dam2", "dam3", "bleep"];

const ENV_PREFIX: &str = "env:";
const PLATFORMIO_SECTION: &str = "platformio";
const DEFAULT_ENVS_KEY: &str = "default_envs";
const BUILD_FLAGS_KEY: &str = "build_flags";

type Section = IndexMap<String, String>;

/// In-memory view of the registry file.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    sections: IndexMap<String, Section>,
}

impl Registry {
    /// Load the registry, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        let sections = match std::fs::read_to_string(path) {
            Ok(text) => parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };
        Ok(Registry {
            path: path.to_path_buf(),
            sections,
        })
    }

    /// Write the whole registry back out.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, serialize(&self.sections))?;
        Ok(())
    }

    /// Every `env:` section, prefix stripped, in file order.
    pub fn environments(&self) -> Vec<String> {
        self.sections
            .keys()
            .filter_map(|name| name.strip_prefix(ENV_PREFIX))
            .map(str::to_string)
            .collect()
    }

    /// Environments minus the factory set: the ones whose table headers this
    /// tool generates.
    pub fn user_environments(&self) -> Vec<String> {
        self.environments()
            .into_iter()
            .filter(|name| !FACTORY_ENVS.contains(&name.as_str()))
            .collect()
    }

    /// Create or replace the section for `name`.
    ///
    /// The section gets a single `build_flags` value: the inherit marker
    /// (so base-project flags keep applying across re-runs), the symbol
    /// selecting this environment's table header, the custom-samples marker,
    /// then any extra flags in order. An existing section keeps its position.
    pub fn upsert(&mut self, name: &str, extra_flags: &[String]) {
        let mut flags = vec![
            "${env.build_flags}".to_string(),
            format!("-D {}", name.to_uppercase()),
            "-D CUSTOM_SAMPLES".to_string(),
        ];
        flags.extend(extra_flags.iter().cloned());

        let mut section = Section::new();
        section.insert(BUILD_FLAGS_KEY.to_string(), flags.join("\n"));
        self.sections
            .insert(format!("{ENV_PREFIX}{}", name.to_lowercase()), section);
    }

    /// The `build_flags` lines for an environment, if registered.
    pub fn build_flags(&self, name: &str) -> Option<Vec<String>> {
        let section = self.sections.get(&format!("{ENV_PREFIX}{name}"))?;
        Some(
            section
                .get(BUILD_FLAGS_KEY)?
                .lines()
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn default_env(&self) -> Option<&str> {
        self.sections
            .get(PLATFORMIO_SECTION)?
            .get(DEFAULT_ENVS_KEY)
            .map(String::as_str)
    }

    /// Point `default_envs` at `name`. Fails for names with no `env:` section.
    pub fn set_default_env(&mut self, name: &str) -> Result<()> {
        if !self.environments().iter().any(|e| e == name) {
            return Err(Error::UnknownEnvironment(name.to_string()));
        }
        self.sections
            .entry(PLATFORMIO_SECTION.to_string())
            .or_default()
            .insert(DEFAULT_ENVS_KEY.to_string(), name.to_string());
        Ok(())
    }
}

/// Parse the ini dialect platformio (and Python's configparser) writes:
/// `[section]` headers, `key = value` pairs, and indented continuation lines
/// that extend the previous key one line at a time.
fn parse(text: &str) -> IndexMap<String, Section> {
    let mut sections: IndexMap<String, Section> = IndexMap::new();
    let mut current_section: Option<String> = None;
    let mut current_key: Option<String> = None;

    for raw in text.lines() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed == line {
            let name = trimmed[1..trimmed.len() - 1].trim().to_string();
            sections.entry(name.clone()).or_default();
            current_section = Some(name);
            current_key = None;
            continue;
        }

        let Some(section) = current_section.as_ref() else {
            continue;
        };

        if line.starts_with(' ') || line.starts_with('\t') {
            // continuation of the previous key's value
            if let Some(key) = current_key.as_ref() {
                let value = sections[section].get_mut(key).unwrap();
                if !value.is_empty() {
                    value.push('\n');
                }
                value.push_str(trimmed);
            }
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_string();
            sections[section].insert(key.clone(), value.trim().to_string());
            current_key = Some(key);
        }
    }

    sections
}

fn serialize(sections: &IndexMap<String, Section>) -> String {
    let mut out = String::new();
    for (name, section) in sections {
        out.push_str(&format!("[{name}]\n"));
        for (key, value) in section {
            if value.contains('\n') {
                out.push_str(&format!("{key} =\n"));
                for line in value.lines() {
                    out.push_str(&format!("\t{line}\n"));
                }
            } else {
                out.push_str(&format!("{key} = {value}\n"));
            }
        }
        out.push('\n');
    }
    out
}
