//! Discovery of per-process output files in a run directory.
//!
//! Process identity is positional: the i-th discovered `.output` file belongs
//! to process index i. The order is derived from the filename, never from the
//! directory listing, so it is stable across platforms and filesystems.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use logaudit_trace::ProcessIndex;
use miette::Diagnostic;
use thiserror::Error;

pub const OUTPUT_EXTENSION: &str = "output";
pub const CONFIG_EXTENSION: &str = "config";

#[derive(Debug, Error, Diagnostic)]
pub enum DiscoveryError {
    #[error("run directory '{}' not found", path.display())]
    #[diagnostic(
        code(logaudit::discovery::not_found),
        help("pass the directory that holds the per-process .output files")
    )]
    DirectoryNotFound { path: PathBuf },

    #[error("'{}' is not a directory", path.display())]
    #[diagnostic(code(logaudit::discovery::not_a_directory))]
    NotADirectory { path: PathBuf },

    #[error("config file '{}' paired with '{}' not found", config.display(), output.display())]
    #[diagnostic(
        code(logaudit::discovery::missing_config),
        help("every <stem>.output of a lattice run needs a <stem>.config next to it")
    )]
    ConfigNotFound { output: PathBuf, config: PathBuf },

    #[error("failed to list '{}': {source}", path.display())]
    #[diagnostic(code(logaudit::discovery::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// An output file and the process index assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub process: ProcessIndex,
    pub path: PathBuf,
}

/// Sort key derived from a file name: the first run of ASCII digits in the
/// stem, if any, then the full name as tie breaker.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OrderKey {
    number: Option<u128>,
    name: String,
}

impl OrderKey {
    fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let number = name_stem(&name)
            .split(|c: char| !c.is_ascii_digit())
            .find(|run| !run.is_empty())
            .and_then(|digits| digits.parse::<u128>().ok());
        Self { number, name }
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number, other.number) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// File name up to its first `.`.
fn name_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// List the `.output` files of `dir` in process-index order.
pub fn discover_outputs(dir: &Path) -> Result<Vec<DiscoveredFile>, DiscoveryError> {
    if !dir.exists() {
        return Err(DiscoveryError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let io_err = |source| DiscoveryError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut outputs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_output = path.is_file()
            && path
                .file_name()
                .map(|n| n.to_string_lossy().ends_with(&format!(".{OUTPUT_EXTENSION}")))
                .unwrap_or(false);
        if is_output {
            outputs.push((OrderKey::from_path(&path), path));
        }
    }
    outputs.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(outputs
        .into_iter()
        .enumerate()
        .map(|(i, (_, path))| DiscoveredFile {
            process: ProcessIndex(i),
            path,
        })
        .collect())
}

/// Locate the `<stem>.config` that belongs to an output file.
pub fn paired_config(output: &Path) -> Result<PathBuf, DiscoveryError> {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let config = output.with_file_name(format!("{}.{CONFIG_EXTENSION}", name_stem(&name)));
    if config.is_file() {
        Ok(config)
    } else {
        Err(DiscoveryError::ConfigNotFound {
            output: output.to_path_buf(),
            config,
        })
    }
}
