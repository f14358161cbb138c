use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use bleep::config::GlobalConfig;
use bleep::registry::{Registry, FACTORY_ENVS};
use bleep::{convert, pio};

#[derive(Parser)]
#[command(name = "bleep")]
#[command(version, about = "Bleep Drum sample table build tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every sample set in a config file into table headers
    Convert {
        /// Path to the conversion config (TOML)
        config: PathBuf,

        /// Directory the sample files are read from
        #[arg(short, long, default_value = "tools/samples")]
        input: PathBuf,

        /// Directory the generated headers are written to
        #[arg(short, long, default_value = "BLEEP_DRUM_15/samples")]
        output: PathBuf,

        /// The platformio.ini registering build environments
        #[arg(short, long, default_value = "platformio.ini")]
        registry: PathBuf,
    },

    /// Build an environment and upload it to the device via platformio
    Upload {
        /// Environment to upload
        env: String,

        #[arg(short, long, default_value = "platformio.ini")]
        registry: PathBuf,
    },

    /// List registered environments
    Envs {
        #[arg(short, long, default_value = "platformio.ini")]
        registry: PathBuf,
    },

    /// Show or set the default environment
    Default {
        /// Environment to make the default; prints the current one if omitted
        name: Option<String>,

        #[arg(short, long, default_value = "platformio.ini")]
        registry: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            config,
            input,
            output,
            registry,
        } => {
            let cfg = GlobalConfig::load(&config)
                .with_context(|| format!("failed to load {}", config.display()))?;
            let report = convert::run(&cfg, &input, &output, &registry)?;

            let failed: Vec<&convert::EnvReport> = report.failed_envs().collect();
            if failed.is_empty() {
                println!("Done.");
            } else {
                // warnings only; conversion problems never fail the run
                println!("Done, {} environment(s) had problems:", failed.len());
                for env in failed {
                    if let Err(e) = &env.outcome {
                        println!("  {}: {}", env.env, e);
                    }
                }
            }
        }

        Commands::Upload { env, registry } => {
            let reg = Registry::load(&registry)?;
            if !reg.environments().iter().any(|e| *e == env) {
                return Err(bleep::Error::UnknownEnvironment(env).into());
            }
            pio::upload(&env)?;
        }

        Commands::Envs { registry } => {
            let reg = Registry::load(&registry)?;
            let default = reg.default_env().map(str::to_string);
            for env in reg.environments() {
                let mut tags = Vec::new();
                if FACTORY_ENVS.contains(&env.as_str()) {
                    tags.push("factory");
                }
                if default.as_deref() == Some(env.as_str()) {
                    tags.push("default");
                }
                if tags.is_empty() {
                    println!("{env}");
                } else {
                    println!("{env} ({})", tags.join(", "));
                }
            }
        }

        Commands::Default { name, registry } => {
            let mut reg = Registry::load(&registry)?;
            match name {
                Some(name) => {
                    reg.set_default_env(&name)?;
                    reg.save()?;
                    println!("Default environment set to {name}");
                }
                None => match reg.default_env() {
                    Some(default) => println!("{default}"),
                    None => println!("No default environment set"),
                },
            }
        }
    }

    Ok(())
}
