use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("unterminated block comment")]
    UnterminatedBlockComment { line: usize, col: usize },

    #[error("unterminated string")]
    UnterminatedString { line: usize, col: usize },

    #[error("unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, line: usize, col: usize },

    #[error("invalid number '{lexeme}': multiple decimal points")]
    InvalidNumber {
        lexeme: String,
        line: usize,
        col: usize,
    },
}

impl Error {
    pub fn line(&self) -> usize {
        match self {
            Error::UnterminatedBlockComment { line, .. } => *line,
            Error::UnterminatedString { line, .. } => *line,
            Error::UnexpectedCharacter { line, .. } => *line,
            Error::InvalidNumber { line, .. } => *line,
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Error::UnterminatedBlockComment { col, .. } => *col,
            Error::UnterminatedString { col, .. } => *col,
            Error::UnexpectedCharacter { col, .. } => *col,
            Error::InvalidNumber { col, .. } => *col,
        }
    }
}
