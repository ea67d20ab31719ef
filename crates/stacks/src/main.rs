//! `stacks`: compiles the mTLS demo units into engine programs.
//!
//! Startup sequence:
//! 1. Parse the command line and load [`Config`] from the optional file and
//!    the environment.
//! 2. Initialise logging on stderr.
//! 3. Run the subcommand: compile a unit (gathering ACM validation options and
//!    the trust-store hash first for `mtls-infra`), print its creation order,
//!    or verify / upload the trust-store bundle.

mod aws;
mod config;
mod render;
mod resource;
mod telemetry;
mod truststore;
mod units;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::StackError;
use tracing::info;

use aws::{
    collect_validation_options, AcmLookup, AwsClients, CertificateLookup, FileLookup, S3Store,
};
use config::{Config, ConfigKey};
use render::Format;
use truststore::TruststoreBundle;
use units::mtls_infra::TRUSTSTORE_OBJECT_KEY;
use units::{Compiled, Inputs, Unit};

#[derive(Debug, Parser)]
#[command(name = "stacks", version, about = "Compile the mTLS demo stacks")]
struct Cli {
    /// YAML configuration file; environment variables override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a unit and print its program.
    Plan {
        #[arg(value_enum)]
        unit: Unit,

        #[arg(long, value_enum, default_value_t)]
        format: Format,

        /// Write the program here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// JSON file of certificate validation options; skips the ACM lookup.
        #[arg(long)]
        validation_options: Option<PathBuf>,
    },

    /// Print the order resources of a unit are created in.
    Order {
        #[arg(value_enum)]
        unit: Unit,

        /// JSON file of certificate validation options; skips the ACM lookup.
        #[arg(long)]
        validation_options: Option<PathBuf>,
    },

    /// Trust-store bundle operations.
    Truststore {
        #[command(subcommand)]
        action: TruststoreCommand,
    },
}

#[derive(Debug, Subcommand)]
enum TruststoreCommand {
    /// Check a PEM bundle and print its certificate count and hash.
    Verify {
        /// Defaults to `TRUSTSTORE_PEM_PATH`.
        path: Option<PathBuf>,
    },

    /// Upload a verified PEM bundle to S3.
    Upload {
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value = TRUSTSTORE_OBJECT_KEY)]
        key: String,

        /// Defaults to `TRUSTSTORE_PEM_PATH`.
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cli = Cli::parse();
    let cfg = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging is not yet up; write to stderr directly.
            eprintln!("ERROR: configuration invalid: {e:#}");
            return ExitCode::from(2);
        }
    };

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    if let Err(e) = telemetry::init(&cfg.log_level, cfg.log_json) {
        eprintln!("ERROR: {e:#}");
        return ExitCode::FAILURE;
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        organization = %cfg.organization,
        stack = %cfg.stack,
        "stacks starting"
    );

    // -----------------------------------------------------------------------
    // 3. Command
    // -----------------------------------------------------------------------
    match run(cli.command, &cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Exit code for `err`: the [`StackError`] code when there is one, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<StackError>().map_or(1, StackError::exit_code)
}

async fn run(command: Command, cfg: &Config) -> Result<()> {
    match command {
        Command::Plan {
            unit,
            format,
            out,
            validation_options,
        } => {
            let compiled = compile(unit, cfg, validation_options.as_deref()).await?;
            let document = render::render(&compiled.program, format)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, document)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(unit = %unit, path = %path.display(), "program written");
                }
                None => print!("{document}"),
            }
        }
        Command::Order {
            unit,
            validation_options,
        } => {
            let compiled = compile(unit, cfg, validation_options.as_deref()).await?;
            for (i, id) in compiled.order.iter().enumerate() {
                let kind = compiled
                    .program
                    .resource(id)
                    .map_or("", |r| r.kind.type_token());
                let deps: Vec<&str> = compiled
                    .graph
                    .dependencies(id)
                    .into_iter()
                    .flatten()
                    .map(String::as_str)
                    .collect();
                if deps.is_empty() {
                    println!("{:>3}  {id}  {kind}", i + 1);
                } else {
                    println!("{:>3}  {id}  {kind}  after {}", i + 1, deps.join(", "));
                }
            }
        }
        Command::Truststore { action } => match action {
            TruststoreCommand::Verify { path } => {
                let path = path.unwrap_or_else(|| cfg.truststore_pem_path.clone());
                let bundle = TruststoreBundle::load(&path)?;
                println!(
                    "{}: {} certificate(s), sha256 {}",
                    path.display(),
                    bundle.certificates,
                    bundle.sha256_hex()
                );
            }
            TruststoreCommand::Upload { bucket, key, path } => {
                let path = path.unwrap_or_else(|| cfg.truststore_pem_path.clone());
                let bundle = TruststoreBundle::load(&path)?;
                let aws = AwsClients::init().await;
                truststore::upload(&S3Store::new(aws.s3), &bucket, &key, &bundle).await?;
            }
        },
    }
    Ok(())
}

/// Gather the unit's inputs and compile it.
async fn compile(unit: Unit, cfg: &Config, validation_options: Option<&Path>) -> Result<Compiled> {
    units::ensure_required(unit, cfg)?;
    let inputs = gather_inputs(unit, cfg, validation_options).await?;
    Ok(units::compile(unit, cfg, &inputs)?)
}

/// Values only `mtls-infra` needs: certificate validation options and the
/// trust-store hash.
async fn gather_inputs(unit: Unit, cfg: &Config, validation_options: Option<&Path>) -> Result<Inputs> {
    if unit != Unit::MtlsInfra {
        return Ok(Inputs::default());
    }

    let lookup: Box<dyn CertificateLookup> = match validation_options {
        Some(path) => Box::new(FileLookup::load(path)?),
        None => Box::new(AcmLookup::new(AwsClients::init().await.acm)),
    };
    let domains = [
        cfg.require(ConfigKey::ApiDomain)?,
        cfg.require(ConfigKey::ApiDomainMtls)?,
    ];
    let validation_options = collect_validation_options(lookup.as_ref(), &domains).await?;

    let bundle = TruststoreBundle::load(&cfg.truststore_pem_path)?;
    info!(
        certificates = bundle.certificates,
        sha256 = %bundle.sha256_hex(),
        "truststore verified"
    );

    Ok(Inputs {
        validation_options,
        truststore_sha256: Some(bundle.sha256_hex()),
    })
}
