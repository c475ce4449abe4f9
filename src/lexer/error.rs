use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{character}'.")]
    UnexpectedCharacter { character: char, line: usize },
    #[error("Unterminated string.")]
    UnterminatedString { line: usize },
    #[error("Unterminated block comment.")]
    UnterminatedComment { line: usize },
    #[error("Invalid number literal '{literal}'.")]
    InvalidNumberLiteral { literal: String, line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. }
            | Self::UnterminatedString { line }
            | Self::UnterminatedComment { line }
            | Self::InvalidNumberLiteral { line, .. } => *line,
        }
    }
}

pub type LexResult<T> = Result<T, LexError>;
