use std::rc::Rc;

use serde::Serialize;
use thenga_core::Literal;

use crate::error::Error;

// The tree is built once by the parser and only read afterwards. Function bodies sit behind
// an `Rc` so function values can point at them without cloning the statements.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    LooseEqual,
    StrictEqual,
    NotEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Property {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    Array {
        elements: Vec<Expr>,
    },
    Object {
        properties: Vec<Property>,
    },
    Variable {
        name: String,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },
    Unary {
        operator: UnaryOp,
        right: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        name: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Input {
        prompt: Box<Expr>,
    },
    TypeOf {
        value: Box<Expr>,
    },
    Copy {
        value: Box<Expr>,
    },
    Validate {
        value: Box<Expr>,
    },
    TruthyCheck {
        value: Box<Expr>,
    },
    Await {
        value: Box<Expr>,
    },
}

pub trait ExprVisitor {
    type Item;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Item, Error> {
        match expr {
            Expr::Literal { value } => self.visit_literal(value),
            Expr::Array { elements } => self.visit_array(elements),
            Expr::Object { properties } => self.visit_object(properties),
            Expr::Variable { name } => self.visit_variable(name),
            Expr::Binary {
                left,
                operator,
                right,
            } => self.visit_binary(left, *operator, right),
            Expr::Logical {
                left,
                operator,
                right,
            } => self.visit_logical(left, *operator, right),
            Expr::Unary { operator, right } => self.visit_unary(*operator, right),
            Expr::Call { callee, args } => self.visit_call(callee, args),
            Expr::Member { object, name } => self.visit_member(object, name),
            Expr::Index { object, index } => self.visit_index(object, index),
            Expr::Input { prompt } => self.visit_input(prompt),
            Expr::TypeOf { value } => self.visit_typeof(value),
            Expr::Copy { value } => self.visit_copy(value),
            Expr::Validate { value } => self.visit_validate(value),
            Expr::TruthyCheck { value } => self.visit_truthy_check(value),
            Expr::Await { value } => self.visit_await(value),
        }
    }

    fn visit_literal(&mut self, value: &Literal) -> Result<Self::Item, Error>;
    fn visit_array(&mut self, elements: &[Expr]) -> Result<Self::Item, Error>;
    fn visit_object(&mut self, properties: &[Property]) -> Result<Self::Item, Error>;
    fn visit_variable(&mut self, name: &str) -> Result<Self::Item, Error>;
    fn visit_binary(
        &mut self,
        left: &Expr,
        operator: BinaryOp,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_logical(
        &mut self,
        left: &Expr,
        operator: LogicalOp,
        right: &Expr,
    ) -> Result<Self::Item, Error>;
    fn visit_unary(&mut self, operator: UnaryOp, right: &Expr) -> Result<Self::Item, Error>;
    fn visit_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Self::Item, Error>;
    fn visit_member(&mut self, object: &Expr, name: &str) -> Result<Self::Item, Error>;
    fn visit_index(&mut self, object: &Expr, index: &Expr) -> Result<Self::Item, Error>;
    fn visit_input(&mut self, prompt: &Expr) -> Result<Self::Item, Error>;
    fn visit_typeof(&mut self, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_copy(&mut self, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_validate(&mut self, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_truthy_check(&mut self, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_await(&mut self, value: &Expr) -> Result<Self::Item, Error>;
}

// Creator methods, shorter to read than the struct variants in the parser.
impl Expr {
    pub(crate) fn variable(name: &str) -> Self {
        Expr::Variable {
            name: String::from(name),
        }
    }

    pub(crate) fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn logical(left: Expr, operator: LogicalOp, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn unary(operator: UnaryOp, right: Expr) -> Self {
        Expr::Unary {
            operator,
            right: Box::new(right),
        }
    }

    pub(crate) fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    /// A call to a global built-in, used for the keyword spelled helpers.
    pub(crate) fn builtin_call(name: &str, args: Vec<Expr>) -> Self {
        Expr::call(Expr::variable(name), args)
    }

    pub(crate) fn member(object: Expr, name: &str) -> Self {
        Expr::Member {
            object: Box::new(object),
            name: String::from(name),
        }
    }

    pub(crate) fn index(object: Expr, index: Expr) -> Self {
        Expr::Index {
            object: Box::new(object),
            index: Box::new(index),
        }
    }
}

#[cfg(test)]
impl Expr {
    pub(crate) fn literal<T>(value: T) -> Self
    where
        Literal: From<T>,
    {
        Expr::Literal {
            value: Literal::from(value),
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl Block {
    pub(crate) fn new(statements: Vec<Stmt>) -> Self {
        Block { statements }
    }
}

#[derive(Debug, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct Branch {
    pub condition: Expr,
    pub body: Block,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CatchClause {
    pub name: String,
    pub body: Block,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    Expression {
        expression: Expr,
    },
    Var {
        name: String,
        init: Expr,
        constant: bool,
    },
    Assign {
        target: Expr,
        value: Expr,
    },
    Function {
        declaration: Rc<FunctionDecl>,
    },
    Print {
        expression: Expr,
    },
    Debug {
        expression: Expr,
    },
    Warning {
        expression: Expr,
    },
    // The first branch is the `seriyano` condition, the rest are `allelum` clauses
    If {
        branches: Vec<Branch>,
        else_branch: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    Repeat {
        times: Expr,
        body: Block,
    },
    Break,
    Continue,
    Return {
        value: Option<Expr>,
    },
    Try {
        body: Block,
        catch: Option<CatchClause>,
        finally: Option<Block>,
    },
    Throw {
        value: Expr,
    },
    Delete {
        target: Expr,
        force: bool,
    },
    Assert {
        condition: Expr,
        message: Option<Expr>,
    },
    Sleep {
        duration: Expr,
    },
    Pass,
}

pub trait StmtVisitor {
    type Item;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Self::Item, Error> {
        match stmt {
            Stmt::Expression { expression } => self.visit_expression(expression),
            Stmt::Var {
                name,
                init,
                constant,
            } => self.visit_var(name, init, *constant),
            Stmt::Assign { target, value } => self.visit_assign(target, value),
            Stmt::Function { declaration } => self.visit_function(declaration),
            Stmt::Print { expression } => self.visit_print(expression),
            Stmt::Debug { expression } => self.visit_debug(expression),
            Stmt::Warning { expression } => self.visit_warning(expression),
            Stmt::If {
                branches,
                else_branch,
            } => self.visit_if(branches, else_branch.as_ref()),
            Stmt::While { condition, body } => self.visit_while(condition, body),
            Stmt::Repeat { times, body } => self.visit_repeat(times, body),
            Stmt::Break => self.visit_break(),
            Stmt::Continue => self.visit_continue(),
            Stmt::Return { value } => self.visit_return(value.as_ref()),
            Stmt::Try {
                body,
                catch,
                finally,
            } => self.visit_try(body, catch.as_ref(), finally.as_ref()),
            Stmt::Throw { value } => self.visit_throw(value),
            Stmt::Delete { target, force } => self.visit_delete(target, *force),
            Stmt::Assert { condition, message } => self.visit_assert(condition, message.as_ref()),
            Stmt::Sleep { duration } => self.visit_sleep(duration),
            Stmt::Pass => self.visit_pass(),
        }
    }

    fn visit_expression(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_var(&mut self, name: &str, init: &Expr, constant: bool)
        -> Result<Self::Item, Error>;
    fn visit_assign(&mut self, target: &Expr, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_function(&mut self, declaration: &Rc<FunctionDecl>) -> Result<Self::Item, Error>;
    fn visit_print(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_debug(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_warning(&mut self, expression: &Expr) -> Result<Self::Item, Error>;
    fn visit_if(
        &mut self,
        branches: &[Branch],
        else_branch: Option<&Block>,
    ) -> Result<Self::Item, Error>;
    fn visit_while(&mut self, condition: &Expr, body: &Block) -> Result<Self::Item, Error>;
    fn visit_repeat(&mut self, times: &Expr, body: &Block) -> Result<Self::Item, Error>;
    fn visit_break(&mut self) -> Result<Self::Item, Error>;
    fn visit_continue(&mut self) -> Result<Self::Item, Error>;
    fn visit_return(&mut self, value: Option<&Expr>) -> Result<Self::Item, Error>;
    fn visit_try(
        &mut self,
        body: &Block,
        catch: Option<&CatchClause>,
        finally: Option<&Block>,
    ) -> Result<Self::Item, Error>;
    fn visit_throw(&mut self, value: &Expr) -> Result<Self::Item, Error>;
    fn visit_delete(&mut self, target: &Expr, force: bool) -> Result<Self::Item, Error>;
    fn visit_assert(&mut self, condition: &Expr, message: Option<&Expr>)
        -> Result<Self::Item, Error>;
    fn visit_sleep(&mut self, duration: &Expr) -> Result<Self::Item, Error>;
    fn visit_pass(&mut self) -> Result<Self::Item, Error>;
}

impl Stmt {
    pub(crate) fn expression(expression: Expr) -> Self {
        Stmt::Expression { expression }
    }
}

// Shorthands for building expected trees in tests
#[cfg(test)]
impl Stmt {
    pub(crate) fn print(expression: Expr) -> Self {
        Stmt::Print { expression }
    }

    pub(crate) fn var(name: &str, init: Expr, constant: bool) -> Self {
        Stmt::Var {
            name: String::from(name),
            init,
            constant,
        }
    }

    pub(crate) fn function(name: &str, params: &[&str], body: Block) -> Self {
        Stmt::Function {
            declaration: Rc::new(FunctionDecl {
                name: String::from(name),
                params: params.iter().map(|p| String::from(*p)).collect(),
                body,
            }),
        }
    }
}

/// Root of a parsed program.
#[derive(Debug, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Structured dump of the tree, for inspecting what the parser built.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
