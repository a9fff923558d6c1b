//! Error types for the layout engine.

/// Errors raised while reading dot-bracket notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("bad dot-bracket character {ch:?} at position {pos}")]
    BadCharacter { ch: char, pos: usize },

    #[error("unmatched {ch:?} at position {pos}")]
    UnmatchedClose { ch: char, pos: usize },

    #[error("unclosed {ch:?} opened at position {pos}")]
    UnmatchedOpen { ch: char, pos: usize },
}

/// Primary error type for layout operations.
///
/// `Algorithm` marks a broken internal invariant and always aborts the whole
/// layout. `CrossedRegions` and `Pseudoknot` describe inputs the loop-tree
/// model cannot draw cleanly; callers may recover by relaxing the config.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NaviewError {
    #[error("naview algorithm error: {0}")]
    Algorithm(String),

    /// Only returned when `strict_crossings` is enabled.
    #[error("loop {loop_number} has crossed regions")]
    CrossedRegions { loop_number: usize },

    #[error("pairs {first:?} and {second:?} cross")]
    Pseudoknot {
        first: (usize, usize),
        second: (usize, usize),
    },

    #[error("invalid pair table: {0}")]
    InvalidPairTable(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, NaviewError>;

pub(crate) fn algorithm_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(NaviewError::Algorithm(msg.into()))
}
