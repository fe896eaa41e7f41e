use thiserror::Error;

/// Errors raised while parsing unified-diff text.
///
/// The parser is tolerant of most malformed input (see [`crate::parser`]);
/// these variants cover the cases §4.1 calls "structurally unrecoverable".
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("hunk header appeared before any file header")]
    HunkBeforeFileHeader,

    #[error("invalid hunk header: {0}")]
    InvalidHunkHeader(String),

    #[error("unexpected end of input")]
    UnexpectedEof,
}
