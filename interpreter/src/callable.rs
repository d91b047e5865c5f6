use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::env::ScopeId;
use crate::error::Error;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Accepted argument counts of a callable, `max` is open ended when `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(count: usize) -> Self {
        Arity {
            min: count,
            max: Some(count),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Arity {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Arity { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}

pub trait Callable {
    fn name(&self) -> &str;
    fn arity(&self) -> Arity;
    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error>;

    /// Frame the callable closes over, it stays alive for as long as the callable does.
    fn closure(&self) -> Option<ScopeId> {
        None
    }
}

impl Debug for dyn Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<function {}>", self.name())
    }
}

pub(crate) type BoxedFunction = Box<dyn Fn(&[Value]) -> Result<Value, Error>>;

// `Native` bridges the rust functions and the Thenga interpreter environment.
// All of these trait objects live in the global frame.
pub(crate) struct Native {
    func: BoxedFunction,
    name: &'static str,
    arity: Arity,
}

impl Native {
    pub(crate) fn new(name: &'static str, arity: Arity, func: BoxedFunction) -> Self {
        Self { func, name, arity }
    }
}

impl Callable for Native {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> Arity {
        self.arity
    }

    fn execute(self: Rc<Self>, _: &mut Interpreter, args: &[Value]) -> Result<Value, Error> {
        (self.func)(args)
    }
}

// The declaration is shared with the syntax tree through an `Rc`, creating a function value
// never clones the body statements.
#[derive(Debug)]
pub(crate) struct Function {
    declaration: Rc<FunctionDecl>,
    closure: ScopeId,
}

impl Function {
    pub(crate) fn new(declaration: &Rc<FunctionDecl>, closure: ScopeId) -> Self {
        Function {
            declaration: Rc::clone(declaration),
            closure,
        }
    }

    fn bind_params(
        &self,
        interpreter: &mut Interpreter,
        env: ScopeId,
        args: &[Value],
    ) -> Result<(), Error> {
        for (param, arg) in self.declaration.params.iter().zip(args) {
            interpreter.scopes.define(env, param, arg.clone(), false)?;
        }
        Ok(())
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.declaration.name
    }

    fn arity(&self) -> Arity {
        Arity::exactly(self.declaration.params.len())
    }

    fn closure(&self) -> Option<ScopeId> {
        Some(self.closure)
    }

    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error> {
        tracing::trace!(function = %self.declaration.name, args = args.len(), "call");

        // The new frame hangs off the defining scope, not the caller's
        let env = interpreter.scopes.push(self.closure);
        let res = self
            .bind_params(interpreter, env, args)
            .and_then(|_| interpreter.execute_block_with_env(&self.declaration.body, env));
        interpreter.scopes.release(env);

        match res? {
            Flow::Normal(_) => Ok(Value::Null),
            Flow::Return(value) => Ok(value),
            Flow::Break => Err(Error::runtime(format_args!(
                "'odaruth_mone' used outside of a loop"
            ))),
            Flow::Continue => Err(Error::runtime(format_args!(
                "'vitt_kala' used outside of a loop"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::callable::Arity;

    #[test]
    fn test_arity() {
        let tests = [
            (Arity::exactly(2), 2, true, "2"),
            (Arity::exactly(2), 1, false, "2"),
            (Arity::range(1, 2), 2, true, "1 to 2"),
            (Arity::range(1, 2), 3, false, "1 to 2"),
            (Arity::at_least(1), 7, true, "at least 1"),
            (Arity::at_least(1), 0, false, "at least 1"),
        ];

        for (arity, count, accepted, description) in tests {
            assert_eq!(arity.accepts(count), accepted);
            assert_eq!(arity.to_string(), description);
        }
    }
}
