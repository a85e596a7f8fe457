//! Loading whole run directories.
//!
//! Every file is read completely and released before the next one is opened.

use std::fs;
use std::path::{Path, PathBuf};

use logaudit_trace::{BroadcastLog, LatticeLog};
use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use crate::discovery::{discover_outputs, paired_config, DiscoveryError};
use crate::parse::{parse_broadcast_log, parse_lattice_config, parse_lattice_output, ParseError};

#[derive(Debug, Error, Diagnostic)]
pub enum ReadError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to read '{}': {source}", path.display())]
    #[diagnostic(code(logaudit::read::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest entry '{name}' cannot be audited: {message}")]
    #[diagnostic(code(logaudit::audit::invalid_entry))]
    InvalidEntry { name: String, message: String },
}

impl ReadError {
    /// True when a directory or paired file is missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            ReadError::Discovery(
                DiscoveryError::DirectoryNotFound { .. } | DiscoveryError::ConfigNotFound { .. },
            ) => true,
            ReadError::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

fn read_file(path: &Path) -> Result<String, ReadError> {
    fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Discover and parse every `.output` file of a broadcast run.
pub fn read_broadcast_run(dir: &Path) -> Result<Vec<BroadcastLog>, ReadError> {
    let mut logs = Vec::new();
    for file in discover_outputs(dir)? {
        info!(process = %file.process, file = %file.path.display(), "reading broadcast log");
        let raw = read_file(&file.path)?;
        logs.push(parse_broadcast_log(file.process, &file.path, &raw)?);
    }
    Ok(logs)
}

/// Discover every `.output` file of a lattice run and parse it with its config.
pub fn read_lattice_run(dir: &Path) -> Result<Vec<LatticeLog>, ReadError> {
    let mut logs = Vec::new();
    for file in discover_outputs(dir)? {
        let config_path = paired_config(&file.path)?;
        info!(
            process = %file.process,
            output = %file.path.display(),
            config = %config_path.display(),
            "reading lattice log"
        );
        let decisions = parse_lattice_output(&read_file(&file.path)?);
        let config = parse_lattice_config(&config_path, &read_file(&config_path)?)?;
        logs.push(LatticeLog {
            process: file.process,
            output_source: file.path,
            config_source: config_path,
            config,
            decisions,
        });
    }
    Ok(logs)
}
