use std::fmt;
use std::io;

use retroboard::shakmaty::Board;

/// Errors surfaced at the public seams of the engine (generation, probing, verification).
/// Internal invariants that cannot fire given upstream validation stay as `debug_assert!`/
/// `expect`, matching the rest of the crate.
#[derive(Debug)]
pub enum EgtbError {
    Parse(String),
    Io(io::Error),
    Format(String),
    MissingSubTable { name: String },
    IndexOverflow { name: String, max_dtm: i32 },
    InvariantViolation { index: u64, board: Box<Board> },
}

impl fmt::Display for EgtbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Format(msg) => write!(f, "format error: {msg}"),
            Self::MissingSubTable { name } => write!(f, "missing sub-table: {name}"),
            Self::IndexOverflow { name, max_dtm } => write!(
                f,
                "index overflow for {name}: dtm {max_dtm} does not fit a single byte cell, enable 2-byte cells"
            ),
            Self::InvariantViolation { index, board } => {
                write!(f, "invariant violation at index {index}, board: {board:?}")
            }
        }
    }
}

impl std::error::Error for EgtbError {}

impl From<io::Error> for EgtbError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

pub type EgtbResult<T> = Result<T, EgtbError>;
