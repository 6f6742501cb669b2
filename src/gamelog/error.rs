//! Error types for log parsing

use thiserror::Error;

/// Reasons a log could not be turned into match statistics.
///
/// Parsing is all-or-nothing: any of these aborts the run and no matches
/// are returned, even ones that were already complete.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The line has no recognizable time header (1-indexed line number)
    #[error("line {line} is malformed")]
    Malformed { line: usize },

    /// Input ended between `InitGame` and its terminator
    #[error("log entries ended while a match was still open")]
    UnterminatedMatch,

    /// The underlying reader failed
    #[error("failed to read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}
