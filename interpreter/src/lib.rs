mod ast;
mod callable;
mod env;
mod error;
mod interpreter;
mod native;
mod parser;
mod stack;
mod value;

use std::io::Write;

use thenga_core::{Scanner, Token};

pub use ast::*;
pub use callable::{Arity, Callable};
pub use env::ScopeId;
pub use error::*;
pub use interpreter::{Flow, InputProvider, Interpreter};
pub use parser::Parser;
pub use value::{Pending, Record, Value};

/// Scans `src` into tokens, the stream always ends with an `Eof` token.
pub fn tokenize(src: &str) -> Result<Vec<Token>, Error> {
    let mut scanner = Scanner::new();
    Ok(scanner.tokenize(src)?)
}

/// Scans and parses `src` into a syntax tree.
#[tracing::instrument(skip_all, fields(source_len = src.len()))]
pub fn parse(src: &str) -> Result<Program, Error> {
    let tokens = tokenize(src)?;
    let mut parser = Parser::new(&tokens);
    parser.parse()
}

/// Runs `src` against a fresh global frame. Print, debug and warning lines go to `stdout`,
/// `input` answers `chodhik` if given, otherwise it yields pending placeholders.
#[tracing::instrument(skip_all, fields(source_len = src.len()))]
pub fn run(
    src: &str,
    stdout: &mut dyn Write,
    input: Option<InputProvider<'_>>,
) -> Result<Value, Error> {
    let program = parse(src)?;

    let mut interpreter = Interpreter::new(stdout);
    if let Some(provider) = input {
        interpreter = interpreter.with_input(provider);
    }

    interpreter.interpret(&program)
}

#[cfg(test)]
mod tests {
    use crate::{parse, run, tokenize, Error, Value};
    use thenga_core::Type;

    #[test]
    fn test_entry_points() {
        let tokens = tokenize("para(1)").unwrap();
        assert_eq!(tokens.last().map(|t| t.ty), Some(Type::Eof));

        let program = parse("ith_aan x = [1, 'a']").unwrap();
        let json = program.to_json().unwrap();
        assert!(json.contains("\"type\": \"Var\""));
        assert!(json.contains("\"type\": \"Array\""));

        let mut output: Vec<u8> = Vec::new();
        let result = run(
            "para(chodhik('q')); 42",
            &mut output,
            Some(Box::new(|prompt: &str| format!("{}?", prompt))),
        );
        assert_eq!(result, Ok(Value::from(42)));
        assert_eq!(String::from_utf8(output).unwrap(), "q?\n");
    }

    #[test]
    fn test_errors_are_classified() {
        let mut sink: Vec<u8> = Vec::new();

        assert!(matches!(
            run("ith_aan s = 'open", &mut sink, None),
            Err(Error::ScannerError { line: 1, col: 13, .. })
        ));
        assert!(matches!(
            run("para(1", &mut sink, None),
            Err(Error::ParserError { line: 1, col: 7, .. })
        ));
        assert_eq!(
            run("para(1 / 0)", &mut sink, None),
            Err(Error::RuntimeError {
                msg: String::from("Division by zero")
            })
        );
        assert_eq!(
            Error::from(thenga_core::Error::UnexpectedCharacter {
                ch: '#',
                line: 2,
                col: 4
            })
            .to_string(),
            "[line 2:4] scanner error: unexpected character '#'"
        );
    }
}
