//! Command-line helpers shared by the binaries: error reporting and path arguments.

use anyhow::{anyhow, Result};
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The message of an io error without the trailing " (os error N)".
fn io_error_message(err: &io::Error) -> String {
    let message = err.to_string();
    match err.raw_os_error() {
        Some(code) => message
            .strip_suffix(&format!(" (os error {code})"))
            .map_or_else(|| message.clone(), str::to_string),
        None => message,
    }
}

/// Print an error and its causes to stderr, one cause per line.
/// A bare io error is printed without its os error code.
pub fn print_error_chain(err: &anyhow::Error) {
    match err.downcast_ref::<io::Error>() {
        Some(io_err) if err.chain().len() == 1 => eprintln!("ERROR: {}", io_error_message(io_err)),
        _ => eprintln!("ERROR: {}", err.chain().join("\n\tCaused by: ")),
    }
}

/// Expand a `~` to the current users home dir.
pub fn expand_tilde(path: &Path) -> Option<PathBuf> {
    if path.starts_with("~") {
        if path == Path::new("~") {
            dirs::home_dir()
        } else {
            let rest = path.strip_prefix("~").ok()?;
            dirs::home_dir().map(|home| home.join(rest))
        }
    } else {
        Some(path.to_path_buf())
    }
}

/// Parse a path argument, expanding a leading `~`. For use with Clap's value_parser.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    expand_tilde(Path::new(s))
        .ok_or_else(|| anyhow!("Can't expand '~' in {s}. No home directory is known"))
}

/// An input path argument that must exist, stored canonicalized.
#[derive(Clone)]
pub struct CliPath {
    path: PathBuf,
}

impl FromStr for CliPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<CliPath> {
        let path = parse_path(s)?
            .canonicalize()
            .map_err(|err| anyhow!(io_error_message(&err)))?;
        Ok(CliPath { path })
    }
}

impl Display for CliPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.path.display(), f)
    }
}

impl Debug for CliPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.path, f)
    }
}

impl From<CliPath> for PathBuf {
    fn from(cli_path: CliPath) -> PathBuf {
        cli_path.path
    }
}

impl AsRef<Path> for CliPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}
