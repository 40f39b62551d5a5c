// SPDX-License-Identifier: Apache-2.0
// Copyright Birdgen Authors

mod args;
mod external;

use crate::args::{CmdArgs, Parser};
use crate::external::ExternalData;
use config::{ConfigError, StateMap};
use proto::{Builder, NetworkPlan};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum Error {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid plan: {0}")]
    Plan(#[from] serde_yaml_ng::Error),
    #[error("invalid state file: {0}")]
    State(#[from] serde_json::Error),
    #[error("invalid external data: {0}")]
    ExternalData(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Write via a sibling temp file and rename, so a crashed run never
/// leaves a truncated config or state file behind.
fn write_atomic(path: &Path, contents: &str) -> Result<(), Error> {
    let tmp = path.with_extension("tmp");
    let wrap = |source| Error::Write {
        path: path.display().to_string(),
        source,
    };
    fs::write(&tmp, contents).map_err(wrap)?;
    fs::rename(&tmp, path).map_err(wrap)
}

fn run(args: &CmdArgs) -> Result<(), Error> {
    let globals = args.globals();

    let plan: NetworkPlan = serde_yaml_ng::from_str(&read(&args.plan)?)?;
    let previous: StateMap = if args.state.exists() {
        serde_json::from_str(&read(&args.state)?)?
    } else {
        info!("no previous state at {}, starting fresh", args.state.display());
        StateMap::new()
    };
    let external = match &args.external_data {
        Some(path) => serde_json::from_str::<ExternalData>(&read(path)?)
            .map_err(|e| Error::ExternalData(e.to_string()))?,
        None => ExternalData::default(),
    };
    let (irr, limits) = external.into_sources().map_err(Error::ExternalData)?;

    let output = Builder::new(&globals, &previous, &irr, &limits).build(plan)?;

    write_atomic(&args.output, &output.text())?;
    let state_json =
        serde_json::to_string_pretty(&output.state).map_err(Error::State)?;
    write_atomic(&args.state, &state_json)?;
    info!(
        "wrote {} ({} lines) and {}",
        args.output.display(),
        output.lines.len(),
        args.state.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = CmdArgs::parse();
    let default_level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
