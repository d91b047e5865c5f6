use std::io::Write;
use std::rc::Rc;

use thenga_core::Literal;

use crate::ast::{
    BinaryOp, Block, Branch, CatchClause, Expr, ExprVisitor, FunctionDecl, LogicalOp, Program,
    Property, Stmt, StmtVisitor, UnaryOp,
};
use crate::callable::{Callable, Function};
use crate::env::{ScopeId, Scopes};
use crate::error::Error;
use crate::native;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Pending, Record, Value};

// Runaway recursion is reported instead of growing the native stack without bound
pub(crate) const MAX_CALL_DEPTH: usize = 5_000;

/// Name the counted loop binds its zero-based iteration index to.
const REPEAT_INDEX: &str = "i";

/// Outcome of executing a statement. `Return`, `Break` and `Continue` unwind to the
/// construct handling them through ordinary returns.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

pub type InputProvider<'a> = Box<dyn FnMut(&str) -> String + 'a>;

pub struct Interpreter<'a> {
    pub(crate) scopes: Scopes,
    env: ScopeId,
    depth: usize,
    stdout: &'a mut dyn Write,
    input: Option<InputProvider<'a>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(stdout: &'a mut dyn Write) -> Self {
        let mut scopes = Scopes::new();
        let globals = scopes.global();

        for native in native::globals() {
            let name = String::from(native.name());
            let defined = scopes.define(globals, &name, Value::Callable(native), false);
            debug_assert!(defined.is_ok(), "duplicate built-in '{}'", name);
        }

        Interpreter {
            scopes,
            env: globals,
            depth: 0,
            stdout,
            input: None,
        }
    }

    /// Answers `chodhik` synchronously instead of handing out a pending placeholder.
    pub fn with_input(mut self, provider: impl FnMut(&str) -> String + 'a) -> Self {
        self.input = Some(Box::new(provider));
        self
    }

    /// Runs the program and returns the value of its last statement.
    #[tracing::instrument(skip_all, fields(statements = program.statements.len()))]
    pub fn interpret(&mut self, program: &Program) -> Result<Value, Error> {
        let mut last = Value::Null;
        for stmt in &program.statements {
            match self.execute(stmt)? {
                Flow::Normal(value) => last = value,
                Flow::Return(_) => {
                    return Err(Error::runtime(format_args!(
                        "'thirich_tha' used outside of a function"
                    )))
                }
                Flow::Break => {
                    return Err(Error::runtime(format_args!(
                        "'odaruth_mone' used outside of a loop"
                    )))
                }
                Flow::Continue => {
                    return Err(Error::runtime(format_args!(
                        "'vitt_kala' used outside of a loop"
                    )))
                }
            }
        }

        self.scopes.sweep();
        tracing::debug!(result = %last, "program finished");
        Ok(last)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, Error> {
        #[cfg(feature = "debug-trace-execution")]
        tracing::trace!(?stmt, env = ?self.env, "execute");

        ensure_sufficient_stack(|| self.visit_stmt(stmt))
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Error> {
        ensure_sufficient_stack(|| self.visit_expr(expr))
    }

    // Blocks share the frame they run in, so `seriyano` and `odi_repeat_mwone` bodies declare
    // into the enclosing scope.
    fn execute_block(&mut self, block: &Block) -> Result<Flow, Error> {
        let mut last = Value::Null;
        for stmt in &block.statements {
            match self.execute(stmt)? {
                Flow::Normal(value) => last = value,
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    pub(crate) fn execute_block_with_env(
        &mut self,
        block: &Block,
        env: ScopeId,
    ) -> Result<Flow, Error> {
        let current = self.env;
        self.env = env;
        let res = self.execute_block(block);
        self.env = current;
        res
    }

    // Runs `block` in a fresh child frame seeded with one binding, the frame is released after
    fn execute_block_with_binding(
        &mut self,
        block: &Block,
        name: &str,
        value: Value,
    ) -> Result<Flow, Error> {
        let env = self.scopes.push(self.env);
        let res = self
            .scopes
            .define(env, name, value, false)
            .map_err(Error::from)
            .and_then(|_| self.execute_block_with_env(block, env));
        self.scopes.release(env);
        res
    }

    fn get_member(&self, object: &Value, name: &str) -> Result<Value, Error> {
        match object {
            Value::Null => Err(Error::runtime(format_args!(
                "Cannot access property '{}' of onnum_illa",
                name
            ))),
            Value::Object(record) => Ok(record.borrow().get(name).cloned().unwrap_or(Value::Null)),
            Value::Array(items) if name == "length" => Ok(Value::from(items.borrow().len())),
            Value::Str(text) if name == "length" => Ok(Value::from(text.chars().count())),
            _ => Ok(Value::Null),
        }
    }

    fn get_index(&self, object: &Value, index: &Value) -> Result<Value, Error> {
        match (object, index) {
            (Value::Null, _) => Err(Error::runtime(format_args!(
                "Cannot access index of onnum_illa"
            ))),
            (Value::Array(items), Value::Num(num)) => Ok(as_index(*num)
                .and_then(|idx| items.borrow().get(idx).cloned())
                .unwrap_or(Value::Null)),
            (Value::Str(text), Value::Num(num)) => Ok(as_index(*num)
                .and_then(|idx| text.chars().nth(idx))
                .map(|c| Value::from(c.to_string()))
                .unwrap_or(Value::Null)),
            (object, key) => self.get_member(object, &key.to_string()),
        }
    }

    fn set_index(&self, object: &Value, index: &Value, value: Value) -> Result<(), Error> {
        match object {
            Value::Object(record) => {
                // rendering the key may read the record itself
                let key = index.to_string();
                record.borrow_mut().set(&key, value);
                Ok(())
            }
            Value::Array(items) => {
                let idx = match index {
                    Value::Num(num) => as_index(*num),
                    _ => None,
                }
                .ok_or_else(|| Error::runtime(format_args!("Invalid array index: {}", index)))?;

                let mut items = items.borrow_mut();
                if idx >= items.len() {
                    items.resize(idx + 1, Value::Null);
                }
                items[idx] = value;
                Ok(())
            }
            Value::Null => Err(Error::runtime(format_args!(
                "Cannot set property '{}' of onnum_illa",
                index
            ))),
            other => Err(Error::runtime(format_args!(
                "Cannot set property '{}' on {}",
                index,
                other.type_name()
            ))),
        }
    }

    fn call(&mut self, callee: Rc<dyn Callable>, args: &[Value]) -> Result<Value, Error> {
        let arity = callee.arity();
        if !arity.accepts(args.len()) {
            return Err(Error::runtime(format_args!(
                "Function '{}' expects {} arguments, got {}",
                callee.name(),
                arity,
                args.len()
            )));
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::runtime(format_args!(
                "Maximum call depth exceeded in '{}'",
                callee.name()
            )));
        }

        self.depth += 1;
        let res = callee.execute(self, args);
        self.depth -= 1;
        res
    }
}

// Integral, non-negative numbers address sequence slots and characters
fn as_index(num: f64) -> Option<usize> {
    if num >= 0.0 && num.fract() == 0.0 && num <= u32::MAX as f64 {
        Some(num as usize)
    } else {
        None
    }
}

fn callee_name(callee: &Expr) -> String {
    match callee {
        Expr::Variable { name } | Expr::Member { name, .. } => name.clone(),
        _ => String::from("expression"),
    }
}

impl ExprVisitor for Interpreter<'_> {
    type Item = Value;

    fn visit_literal(&mut self, value: &Literal) -> Result<Value, Error> {
        Ok(Value::from(value))
    }

    fn visit_array(&mut self, elements: &[Expr]) -> Result<Value, Error> {
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            items.push(self.evaluate(element)?);
        }
        Ok(Value::array(items))
    }

    fn visit_object(&mut self, properties: &[Property]) -> Result<Value, Error> {
        let mut record = Record::new();
        for property in properties {
            let value = self.evaluate(&property.value)?;
            record.set(&property.key, value);
        }
        Ok(Value::object(record))
    }

    fn visit_variable(&mut self, name: &str) -> Result<Value, Error> {
        Ok(self.scopes.get(self.env, name)?)
    }

    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: BinaryOp,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        let value = match operator {
            BinaryOp::Add => left.add(&right),
            BinaryOp::Subtract => left.subtract(&right),
            BinaryOp::Multiply => left.multiply(&right),
            BinaryOp::Divide => left.divide(&right)?,
            BinaryOp::Modulo => left.modulo(&right),
            BinaryOp::Greater => Value::from(left.compare(&right).map_or(false, |o| o.is_gt())),
            BinaryOp::GreaterEqual => {
                Value::from(left.compare(&right).map_or(false, |o| o.is_ge()))
            }
            BinaryOp::Less => Value::from(left.compare(&right).map_or(false, |o| o.is_lt())),
            BinaryOp::LessEqual => {
                Value::from(left.compare(&right).map_or(false, |o| o.is_le()))
            }
            BinaryOp::LooseEqual => Value::from(left.loose_eq(&right)),
            BinaryOp::StrictEqual => Value::from(left.strict_eq(&right)),
            BinaryOp::NotEqual => Value::from(!left.loose_eq(&right)),
        };

        Ok(value)
    }

    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: LogicalOp,
        right: &Expr,
    ) -> Result<Value, Error> {
        let left = self.evaluate(left)?;

        // The right operand only runs when the left one does not decide the result. Whichever
        // operand decides is returned as is, without turning it into a boolean.
        match operator {
            LogicalOp::Or if left.is_truthy() => Ok(left),
            LogicalOp::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(right),
        }
    }

    fn visit_unary(&mut self, operator: UnaryOp, right: &Expr) -> Result<Value, Error> {
        let right = self.evaluate(right)?;
        match operator {
            UnaryOp::Not => Ok(Value::from(!right.is_truthy())),
            UnaryOp::Negate => Ok(Value::Num(-right.to_number())),
        }
    }

    fn visit_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Value, Error> {
        let function = self.evaluate(callee)?;

        let mut evaluated_args = Vec::with_capacity(args.len());
        for arg in args {
            evaluated_args.push(self.evaluate(arg)?);
        }

        match function {
            Value::Callable(function) => self.call(function, &evaluated_args),
            _ => Err(Error::runtime(format_args!(
                "'{}' is not a function",
                callee_name(callee)
            ))),
        }
    }

    fn visit_member(&mut self, object: &Expr, name: &str) -> Result<Value, Error> {
        let object = self.evaluate(object)?;
        self.get_member(&object, name)
    }

    fn visit_index(&mut self, object: &Expr, index: &Expr) -> Result<Value, Error> {
        let object = self.evaluate(object)?;
        let index = self.evaluate(index)?;
        self.get_index(&object, &index)
    }

    fn visit_input(&mut self, prompt: &Expr) -> Result<Value, Error> {
        let prompt = self.evaluate(prompt)?.to_string();
        match self.input.as_mut() {
            Some(provider) => Ok(Value::from(provider(&prompt))),
            None => Ok(Value::pending(Pending::Input { prompt })),
        }
    }

    fn visit_typeof(&mut self, value: &Expr) -> Result<Value, Error> {
        Ok(Value::from(self.evaluate(value)?.type_name()))
    }

    fn visit_copy(&mut self, value: &Expr) -> Result<Value, Error> {
        Ok(self.evaluate(value)?.deep_copy())
    }

    fn visit_validate(&mut self, value: &Expr) -> Result<Value, Error> {
        let valid = match self.evaluate(value)? {
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Object(record) => !record.borrow().is_empty(),
            Value::Null => false,
            _ => true,
        };
        Ok(Value::from(valid))
    }

    fn visit_truthy_check(&mut self, value: &Expr) -> Result<Value, Error> {
        Ok(Value::from(self.evaluate(value)?.is_truthy()))
    }

    // Concrete values pass through, pending placeholders are forwarded for the host to resolve
    fn visit_await(&mut self, value: &Expr) -> Result<Value, Error> {
        self.evaluate(value)
    }
}

impl StmtVisitor for Interpreter<'_> {
    type Item = Flow;

    fn visit_expression(&mut self, expression: &Expr) -> Result<Flow, Error> {
        Ok(Flow::Normal(self.evaluate(expression)?))
    }

    fn visit_var(&mut self, name: &str, init: &Expr, constant: bool) -> Result<Flow, Error> {
        let value = self.evaluate(init)?;
        self.scopes.define(self.env, name, value.clone(), constant)?;
        Ok(Flow::Normal(value))
    }

    fn visit_assign(&mut self, target: &Expr, value: &Expr) -> Result<Flow, Error> {
        match target {
            Expr::Variable { name } => {
                let value = self.evaluate(value)?;
                self.scopes.assign(self.env, name, value.clone())?;
                Ok(Flow::Normal(value))
            }
            Expr::Member { object, name } => {
                let object = self.evaluate(object)?;
                let value = self.evaluate(value)?;
                self.set_index(&object, &Value::from(name.as_str()), value.clone())?;
                Ok(Flow::Normal(value))
            }
            Expr::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let value = self.evaluate(value)?;
                self.set_index(&object, &index, value.clone())?;
                Ok(Flow::Normal(value))
            }
            _ => Err(Error::runtime(format_args!("Invalid assignment target"))),
        }
    }

    fn visit_function(&mut self, declaration: &Rc<FunctionDecl>) -> Result<Flow, Error> {
        // The defining frame has to outlive the block it belongs to
        self.scopes.capture(self.env);

        let function: Rc<dyn Callable> = Rc::new(Function::new(declaration, self.env));
        self.scopes.track(&function);
        let function = Value::Callable(function);
        self.scopes
            .define(self.env, &declaration.name, function.clone(), false)?;
        Ok(Flow::Normal(function))
    }

    fn visit_print(&mut self, expression: &Expr) -> Result<Flow, Error> {
        let value = self.evaluate(expression)?;
        writeln!(self.stdout, "{}", value)?;
        Ok(Flow::Normal(Value::Null))
    }

    fn visit_debug(&mut self, expression: &Expr) -> Result<Flow, Error> {
        let value = self.evaluate(expression)?;
        writeln!(self.stdout, "[DEBUG] {} (Type: {})", value, value.type_name())?;
        Ok(Flow::Normal(Value::Null))
    }

    fn visit_warning(&mut self, expression: &Expr) -> Result<Flow, Error> {
        let value = self.evaluate(expression)?;
        writeln!(self.stdout, "[WARNING] {}", value)?;
        Ok(Flow::Normal(Value::Null))
    }

    fn visit_if(
        &mut self,
        branches: &[Branch],
        else_branch: Option<&Block>,
    ) -> Result<Flow, Error> {
        for branch in branches {
            if self.evaluate(&branch.condition)?.is_truthy() {
                return self.execute_block(&branch.body);
            }
        }

        match else_branch {
            Some(block) => self.execute_block(block),
            None => Ok(Flow::Normal(Value::Null)),
        }
    }

    fn visit_while(&mut self, condition: &Expr, body: &Block) -> Result<Flow, Error> {
        let mut last = Value::Null;
        while self.evaluate(condition)?.is_truthy() {
            match self.execute_block(body)? {
                Flow::Normal(value) => last = value,
                Flow::Break => break,
                Flow::Continue => continue,
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal(last))
    }

    fn visit_repeat(&mut self, times: &Expr, body: &Block) -> Result<Flow, Error> {
        let times = match self.evaluate(times)? {
            // NaN runs zero iterations, it compares false against every index
            Value::Num(times) if times >= 0.0 || times.is_nan() => times,
            _ => {
                return Err(Error::runtime(format_args!(
                    "Repeat count must be a non-negative number"
                )))
            }
        };

        let mut last = Value::Null;
        let mut idx = 0usize;
        while (idx as f64) < times {
            // each iteration gets its own frame, so assigning the index never leaks forward
            match self.execute_block_with_binding(body, REPEAT_INDEX, Value::from(idx))? {
                Flow::Normal(value) => last = value,
                Flow::Break => break,
                Flow::Continue => {}
                flow @ Flow::Return(_) => return Ok(flow),
            }
            idx += 1;
        }

        Ok(Flow::Normal(last))
    }

    fn visit_break(&mut self) -> Result<Flow, Error> {
        Ok(Flow::Break)
    }

    fn visit_continue(&mut self) -> Result<Flow, Error> {
        Ok(Flow::Continue)
    }

    fn visit_return(&mut self, value: Option<&Expr>) -> Result<Flow, Error> {
        let value = match value {
            Some(expr) => self.evaluate(expr)?,
            None => Value::Null,
        };
        Ok(Flow::Return(value))
    }

    fn visit_try(
        &mut self,
        body: &Block,
        catch: Option<&CatchClause>,
        finally: Option<&Block>,
    ) -> Result<Flow, Error> {
        // Only runtime errors are caught, control signals are `Ok` and pass through untouched
        let outcome = match (self.execute_block(body), catch) {
            (Err(err @ Error::RuntimeError { .. }), Some(clause)) => {
                tracing::debug!(error = %err, "caught runtime error");
                self.execute_block_with_binding(
                    &clause.body,
                    &clause.name,
                    Value::from(err.message()),
                )
            }
            (outcome, _) => outcome,
        };

        match finally {
            Some(block) => match self.execute_block(block)? {
                Flow::Normal(_) => outcome,
                flow => Ok(flow),
            },
            None => outcome,
        }
    }

    fn visit_throw(&mut self, value: &Expr) -> Result<Flow, Error> {
        let value = self.evaluate(value)?;
        Err(Error::runtime(format_args!("{}", value)))
    }

    // Both spellings behave the same, constants stay bound either way
    fn visit_delete(&mut self, target: &Expr, _force: bool) -> Result<Flow, Error> {
        match target {
            Expr::Variable { name } => {
                self.scopes.delete(self.env, name)?;
                Ok(Flow::Normal(Value::from(true)))
            }
            _ => Err(Error::runtime(format_args!("Can only delete variables"))),
        }
    }

    fn visit_assert(&mut self, condition: &Expr, message: Option<&Expr>) -> Result<Flow, Error> {
        if self.evaluate(condition)?.is_truthy() {
            return Ok(Flow::Normal(Value::Null));
        }

        let message = match message {
            Some(expr) => self.evaluate(expr)?.to_string(),
            None => String::from("Assertion failed"),
        };
        Err(Error::runtime(format_args!("Assertion Error: {}", message)))
    }

    fn visit_sleep(&mut self, duration: &Expr) -> Result<Flow, Error> {
        match self.evaluate(duration)? {
            Value::Num(ms) if ms >= 0.0 && ms.is_finite() => {
                Ok(Flow::Normal(Value::pending(Pending::Sleep(ms))))
            }
            _ => Err(Error::runtime(format_args!(
                "Sleep duration must be a non-negative number"
            ))),
        }
    }

    fn visit_pass(&mut self) -> Result<Flow, Error> {
        Ok(Flow::Normal(Value::Null))
    }
}
