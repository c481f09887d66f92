use snafu::prelude::*;
use std::path::PathBuf;

pub mod delete;
pub mod format;
pub mod order;
pub mod parser;
pub mod report;

pub use delete::{Confirm, DeleteOutcome, Deleter};
pub use format::{Bullet, Entry, FormatOptions};
pub use order::Collected;
pub use parser::marker::{MarkerMatcher, Match, PositionalMatch, ScannedLine};
pub use report::ReportConfig;

/// The marker searched for when none is given.
pub const DEFAULT_MARKER: &str = "todo";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{msg}"))]
    Config { msg: String },

    #[snafu(display("Found 0 matches for {marker}"))]
    NoMatches { marker: String },

    #[snafu(display("Could not read {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not write {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Could not replace {}: {source}", path.display()))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    #[snafu(display("Invalid marker pattern: {source}"))]
    Pattern { source: regex::Error },

    #[snafu(display("Parse error - {msg}: {source}"))]
    Nom {
        msg: &'static str,
        source: nom::Err<nom::error::Error<String>>,
    },
}

impl Error {
    /// Whether this error only means nothing matched, as opposed to a failure.
    pub fn is_no_matches(&self) -> bool {
        matches!(self, Error::NoMatches { .. })
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
