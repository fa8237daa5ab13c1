//! rowcast-gen - generate value types from a table manifest
//!
//! Usage: rowcast-gen <manifest.toml> [--out-dir DIR]
//!
//! Log verbosity follows RUST_LOG (default `rowcast_codegen=info,warn`).

use rowcast_codegen::{write_report, GenerationManifest, RustEmitter};
use rowcast_core::{ConfigError, RowcastError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct Args {
    manifest: PathBuf,
    out_dir: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, ConfigError> {
    let mut manifest = None;
    let mut out_dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out-dir" => {
                let dir = args.next().ok_or_else(|| ConfigError::InvalidValue {
                    field: "--out-dir".to_string(),
                    reason: "expects a directory".to_string(),
                })?;
                out_dir = Some(PathBuf::from(dir));
            }
            other if other.starts_with("--") => {
                return Err(ConfigError::InvalidValue {
                    field: other.to_string(),
                    reason: "unknown option".to_string(),
                });
            }
            _ if manifest.is_none() => manifest = Some(PathBuf::from(arg)),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: arg,
                    reason: "unexpected argument".to_string(),
                });
            }
        }
    }

    Ok(Args {
        manifest: manifest.ok_or(ConfigError::MissingManifestPath)?,
        out_dir,
    })
}

fn run(args: Args) -> Result<bool, RowcastError> {
    let manifest = GenerationManifest::from_path(&args.manifest)?;
    let registry = manifest.registry()?;
    let out_dir = args.out_dir.unwrap_or_else(|| manifest.output.dir.clone());

    tracing::info!(
        manifest = %args.manifest.display(),
        tables = registry.len(),
        out_dir = %out_dir.display(),
        "Starting generation"
    );

    let report = registry.generate_all(&RustEmitter::new());
    write_report(&report, &out_dir, manifest.output.descriptors_json)?;

    for failure in &report.failures {
        eprintln!("{}: {}", failure.class_name, failure.error);
    }
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rowcast_codegen=info,warn"));
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: rowcast-gen <manifest.toml> [--out-dir DIR]");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Generation aborted");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
