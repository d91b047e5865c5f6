use std::fmt;

use thenga_core::{Error as CoreError, Token, Type};
use thiserror::Error;

use crate::env::EnvError;

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("[line {line}:{col}] scanner error: {}", .source)]
    ScannerError {
        line: usize,
        col: usize,
        source: CoreError,
    },

    #[error("[line {line}:{col}] parser error: {msg}")]
    ParserError {
        // line and col are copied from the offending token, thiserror can't reach into
        // nested fields in format strings
        line: usize,
        col: usize,
        found: Type,
        msg: String,
    },

    #[error("{msg}")]
    RuntimeError { msg: String },
}

impl Error {
    pub(crate) fn parser_error(token: &Token, msg: &str) -> Self {
        Error::ParserError {
            line: token.line,
            col: token.col,
            found: token.ty,
            msg: String::from(msg),
        }
    }

    pub(crate) fn runtime(msg: fmt::Arguments) -> Self {
        Error::RuntimeError {
            msg: format!("{}", msg),
        }
    }

    /// Message bound to the variable of a `pidikk` clause.
    pub fn message(&self) -> String {
        match self {
            Error::RuntimeError { msg } => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<CoreError> for Error {
    fn from(value: CoreError) -> Self {
        Error::ScannerError {
            line: value.line(),
            col: value.col(),
            source: value,
        }
    }
}

impl From<EnvError> for Error {
    fn from(value: EnvError) -> Self {
        Error::RuntimeError {
            msg: value.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::runtime(format_args!("Runtime error: {}", value))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::runtime(format_args!("Runtime error: {}", value))
    }
}

pub type InterpreterResult<T> = Result<T, Error>;
