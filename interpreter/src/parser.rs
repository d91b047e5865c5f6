use thenga_core::{Literal, Token, Type};

use crate::ast::{
    BinaryOp, Block, Branch, CatchClause, Expr, FunctionDecl, LogicalOp, Program, Property, Stmt,
    UnaryOp,
};
use crate::error::Error;
use crate::stack::ensure_sufficient_stack;
use std::rc::Rc;

// Statements and expressions nested deeper than this are rejected
const MAX_NESTING: usize = 1000;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    depth: usize,

    // Handed out by `peek` if the slice runs out without an explicit Eof token
    eof: Token,
}

// Helper alias for shorter return types
type BlockResult = Result<Block, Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

// Operator tables for each precedence level, lowest to highest
const OR: &[(Type, LogicalOp)] = &[(Type::Or, LogicalOp::Or)];
const AND: &[(Type, LogicalOp)] = &[(Type::And, LogicalOp::And)];
const EQUALITY: &[(Type, BinaryOp)] = &[
    (Type::EqualEqual, BinaryOp::LooseEqual),
    (Type::StrictEqual, BinaryOp::StrictEqual),
    (Type::BangEqual, BinaryOp::NotEqual),
];
const COMPARISON: &[(Type, BinaryOp)] = &[
    (Type::Greater, BinaryOp::Greater),
    (Type::Less, BinaryOp::Less),
    (Type::GreaterEqual, BinaryOp::GreaterEqual),
    (Type::LessEqual, BinaryOp::LessEqual),
];
const TERM: &[(Type, BinaryOp)] = &[
    (Type::Plus, BinaryOp::Add),
    (Type::Minus, BinaryOp::Subtract),
];
const FACTOR: &[(Type, BinaryOp)] = &[
    (Type::Star, BinaryOp::Multiply),
    (Type::Slash, BinaryOp::Divide),
    (Type::Percent, BinaryOp::Modulo),
];
const UNARY: &[(Type, UnaryOp)] = &[(Type::Bang, UnaryOp::Not), (Type::Minus, UnaryOp::Negate)];

// Keyword spelled helpers that are rewritten into calls of global built-ins
const MATH_HELPERS: &[(Type, &str)] = &[
    (Type::Add, "add"),
    (Type::Subtract, "subtract"),
    (Type::Multiply, "multiply"),
    (Type::Divide, "divide"),
];
const CALL_HELPERS: &[(Type, &str)] = &[
    (Type::Join, "join"),
    (Type::Split, "split"),
    (Type::Trim, "trim"),
    (Type::Concat, "concat"),
    (Type::Push, "push"),
    (Type::Pop, "pop"),
    (Type::Length, "length"),
];

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let (line, col) = tokens.last().map_or((1, 1), |last| (last.line, last.col));
        Parser {
            tokens,
            current: 0,
            depth: 0,
            eof: Token::new(
                Type::Eof,
                String::new(),
                line,
                col,
                tokens.len(),
                Literal::Nil,
            ),
        }
    }

    /// Parses the whole token stream. There is no recovery, the first error is returned.
    #[tracing::instrument(skip_all, fields(token_count = self.tokens.len()))]
    pub fn parse(&mut self) -> Result<Program, Error> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.statement()?);
            self.match_one(Type::SemiColon);
        }

        tracing::debug!(statement_count = statements.len(), "parsed program");
        Ok(Program { statements })
    }

    fn statement(&mut self) -> StmtResult {
        self.nested(Self::dispatch_statement)
    }

    fn dispatch_statement(&mut self) -> StmtResult {
        match self.peek().ty {
            Type::Var | Type::Const => self.var_declaration(),
            Type::Fun => self.function_declaration(),
            Type::Print => {
                self.advance();
                Ok(Stmt::Print {
                    expression: self.parenthesized()?,
                })
            }
            Type::Debug => {
                self.advance();
                Ok(Stmt::Debug {
                    expression: self.parenthesized()?,
                })
            }
            Type::Warning => {
                self.advance();
                Ok(Stmt::Warning {
                    expression: self.parenthesized()?,
                })
            }
            Type::If => self.if_statement(),
            Type::While => self.while_statement(),
            Type::Repeat => self.repeat_statement(),
            Type::Break => {
                self.advance();
                Ok(Stmt::Break)
            }
            Type::Continue => {
                self.advance();
                Ok(Stmt::Continue)
            }
            Type::Return => self.return_statement(),
            Type::Try => self.try_statement(),
            Type::Throw => {
                self.advance();
                Ok(Stmt::Throw {
                    value: self.parenthesized()?,
                })
            }
            Type::Delete | Type::ForceDelete => self.delete_statement(),
            Type::Assert | Type::AssertDetailed => self.assert_statement(),
            Type::Sleep => {
                self.advance();
                Ok(Stmt::Sleep {
                    duration: self.parenthesized()?,
                })
            }
            Type::Pass => {
                self.advance();
                Ok(Stmt::Pass)
            }
            _ => self.expression_statement(),
        }
    }

    fn var_declaration(&mut self) -> StmtResult {
        let constant = self.advance().ty == Type::Const;
        let name = self.consume(Type::Identifier)?.lexeme.clone();
        self.consume(Type::Equal)?;
        let init = self.expression()?;

        Ok(Stmt::Var {
            name,
            init,
            constant,
        })
    }

    fn function_declaration(&mut self) -> StmtResult {
        self.advance();
        let name = self.consume(Type::Identifier)?.lexeme.clone();
        self.consume(Type::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                params.push(self.consume(Type::Identifier)?.lexeme.clone());
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }
        self.consume(Type::RightParen)?;

        let body = self.block()?;
        Ok(Stmt::Function {
            declaration: Rc::new(FunctionDecl { name, params, body }),
        })
    }

    fn block(&mut self) -> BlockResult {
        self.consume(Type::LeftBrace)?;

        let mut statements = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            statements.push(self.statement()?);
            self.match_one(Type::SemiColon);
        }

        self.consume(Type::RightBrace)?;
        Ok(Block::new(statements))
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression()?;

        // Whether the target is assignable is decided when the assignment runs
        if self.match_one(Type::Equal) {
            let value = self.expression()?;
            Ok(Stmt::Assign {
                target: expr,
                value,
            })
        } else {
            Ok(Stmt::expression(expr))
        }
    }

    fn if_statement(&mut self) -> StmtResult {
        self.advance();
        let condition = self.parenthesized()?;
        let body = self.block()?;
        let mut branches = vec![Branch { condition, body }];

        while self.match_one(Type::ElseIf) {
            let condition = self.parenthesized()?;
            let body = self.block()?;
            branches.push(Branch { condition, body });
        }

        let else_branch = if self.match_one(Type::Else) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::If {
            branches,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> StmtResult {
        self.advance();
        let condition = self.parenthesized()?;
        let body = self.block()?;
        Ok(Stmt::While { condition, body })
    }

    fn repeat_statement(&mut self) -> StmtResult {
        self.advance();
        let times = self.parenthesized()?;
        let body = self.block()?;
        Ok(Stmt::Repeat { times, body })
    }

    fn return_statement(&mut self) -> StmtResult {
        self.advance();

        let ends = [Type::SemiColon, Type::RightBrace];
        let value = if ends.iter().any(|ty| self.check(*ty)) || self.is_at_end() {
            None
        } else {
            Some(self.expression()?)
        };

        Ok(Stmt::Return { value })
    }

    fn try_statement(&mut self) -> StmtResult {
        self.advance();
        let body = self.block()?;

        let catch = if self.match_one(Type::Catch) {
            self.consume(Type::LeftParen)?;
            let name = self.consume(Type::Identifier)?.lexeme.clone();
            self.consume(Type::RightParen)?;
            let body = self.block()?;
            Some(CatchClause { name, body })
        } else {
            None
        };

        let finally = if self.match_one(Type::Finally) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(Stmt::Try {
            body,
            catch,
            finally,
        })
    }

    fn delete_statement(&mut self) -> StmtResult {
        let force = self.advance().ty == Type::ForceDelete;
        let target = self.parenthesized()?;
        Ok(Stmt::Delete { target, force })
    }

    fn assert_statement(&mut self) -> StmtResult {
        let detailed = self.advance().ty == Type::AssertDetailed;
        self.consume(Type::LeftParen)?;
        let condition = self.expression()?;

        let message = if detailed && self.match_one(Type::Comma) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Type::RightParen)?;
        Ok(Stmt::Assert { condition, message })
    }

    fn expression(&mut self) -> ExprResult {
        self.nested(Self::or_expression)
    }

    fn or_expression(&mut self) -> ExprResult {
        let mut expr = self.and_expression()?;
        while let Some(operator) = self.match_operator(OR) {
            let right = self.and_expression()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn and_expression(&mut self) -> ExprResult {
        let mut expr = self.equality()?;
        while let Some(operator) = self.match_operator(AND) {
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ExprResult {
        let mut expr = self.comparison()?;
        while let Some(operator) = self.match_operator(EQUALITY) {
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ExprResult {
        let mut expr = self.term()?;
        while let Some(operator) = self.match_operator(COMPARISON) {
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ExprResult {
        let mut expr = self.factor()?;
        while let Some(operator) = self.match_operator(TERM) {
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ExprResult {
        let mut expr = self.unary()?;
        while let Some(operator) = self.match_operator(FACTOR) {
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ExprResult {
        if let Some(operator) = self.match_operator(UNARY) {
            Ok(Expr::unary(operator, self.nested(Self::unary)?))
        } else if self.match_one(Type::Await) {
            Ok(Expr::Await {
                value: Box::new(self.nested(Self::unary)?),
            })
        } else {
            self.postfix()
        }
    }

    fn postfix(&mut self) -> ExprResult {
        let mut expr = self.primary()?;
        loop {
            if self.match_one(Type::Dot) {
                let name = self.property_name()?;
                expr = Expr::member(expr, &name);
            } else if self.match_one(Type::LeftBracket) {
                let index = self.expression()?;
                self.consume(Type::RightBracket)?;
                expr = Expr::index(expr, index);
            } else if self.match_one(Type::LeftParen) {
                let args = self.finish_arguments()?;
                expr = Expr::call(expr, args);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    // Expects the opening parenthesis to be consumed already
    fn finish_arguments(&mut self) -> Result<Vec<Expr>, Error> {
        let mut args = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                args.push(self.expression()?);
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> ExprResult {
        if let Some(name) = self.match_operator(MATH_HELPERS) {
            self.consume(Type::LeftParen)?;
            let left = self.expression()?;
            self.consume(Type::Comma)?;
            let right = self.expression()?;
            self.consume(Type::RightParen)?;
            return Ok(Expr::builtin_call(name, vec![left, right]));
        }

        if let Some(name) = self.match_operator(CALL_HELPERS) {
            self.consume(Type::LeftParen)?;
            let args = self.finish_arguments()?;
            return Ok(Expr::builtin_call(name, args));
        }

        match self.peek().ty {
            Type::Number | Type::String | Type::True | Type::False | Type::Nil => {
                let value = self.advance().value.clone();
                Ok(Expr::Literal { value })
            }
            Type::LeftBracket => self.array_literal(),
            Type::LeftBrace => self.object_literal(),
            Type::LeftParen => self.parenthesized(),
            Type::Input => {
                self.advance();
                Ok(Expr::Input {
                    prompt: Box::new(self.parenthesized()?),
                })
            }
            Type::TypeOf => {
                self.advance();
                Ok(Expr::TypeOf {
                    value: Box::new(self.parenthesized()?),
                })
            }
            Type::Copy => {
                self.advance();
                Ok(Expr::Copy {
                    value: Box::new(self.parenthesized()?),
                })
            }
            Type::TruthyCheck => {
                self.advance();
                Ok(Expr::TruthyCheck {
                    value: Box::new(self.parenthesized()?),
                })
            }
            Type::Validate => {
                self.advance();
                Ok(Expr::Validate {
                    value: Box::new(self.parenthesized()?),
                })
            }
            Type::Random => {
                self.advance();
                self.consume(Type::LeftParen)?;
                self.consume(Type::RightParen)?;
                Ok(Expr::builtin_call("random", Vec::new()))
            }
            Type::Identifier => {
                let name = self.advance().lexeme.clone();
                Ok(Expr::Variable { name })
            }
            ty => Err(Error::parser_error(
                self.peek(),
                &format!("Unexpected token: {:?}", ty),
            )),
        }
    }

    fn array_literal(&mut self) -> ExprResult {
        self.consume(Type::LeftBracket)?;

        let mut elements = Vec::new();
        while !self.check(Type::RightBracket) {
            elements.push(self.expression()?);
            if !self.match_one(Type::Comma) {
                break;
            }
        }

        self.consume(Type::RightBracket)?;
        Ok(Expr::Array { elements })
    }

    fn object_literal(&mut self) -> ExprResult {
        self.consume(Type::LeftBrace)?;

        let mut properties = Vec::new();
        while !self.check(Type::RightBrace) {
            let key = if self.check(Type::String) {
                match &self.advance().value {
                    Literal::Str(key) => key.clone(),
                    other => format!("{:?}", other),
                }
            } else {
                self.property_name()?
            };

            self.consume(Type::Colon)?;
            let value = self.expression()?;
            properties.push(Property { key, value });

            if !self.match_one(Type::Comma) {
                break;
            }
        }

        self.consume(Type::RightBrace)?;
        Ok(Expr::Object { properties })
    }

    // Keywords are plain names after `.` and as record keys, e.g. `xs.length`
    fn property_name(&mut self) -> Result<String, Error> {
        if self.check(Type::Identifier) || self.peek().ty.is_keyword() {
            Ok(self.advance().lexeme.clone())
        } else {
            Err(self.unexpected(Type::Identifier))
        }
    }

    fn parenthesized(&mut self) -> ExprResult {
        self.consume(Type::LeftParen)?;
        let expr = self.expression()?;
        self.consume(Type::RightParen)?;
        Ok(expr)
    }

    // Every recursive rule goes through here, nesting is bounded before the native stack is
    fn nested<T>(&mut self, rule: impl FnOnce(&mut Self) -> Result<T, Error>) -> Result<T, Error> {
        if self.depth >= MAX_NESTING {
            return Err(Error::parser_error(self.peek(), "Too much nesting"));
        }

        self.depth += 1;
        let res = ensure_sufficient_stack(|| rule(self));
        self.depth -= 1;
        res
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == Type::Eof
    }

    fn check(&self, ty: Type) -> bool {
        if self.is_at_end() {
            false
        } else {
            self.peek().ty == ty
        }
    }

    fn consume(&mut self, ty: Type) -> Result<&Token, Error> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(ty))
        }
    }

    fn unexpected(&self, expected: Type) -> Error {
        let found = self.peek();
        Error::parser_error(
            found,
            &format!("Expected {:?}, got {:?}", expected, found.ty),
        )
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.current).unwrap_or(&self.eof)
    }

    fn previous(&self) -> &Token {
        self.current
            .checked_sub(1)
            .and_then(|idx| self.tokens.get(idx))
            .unwrap_or(&self.eof)
    }

    fn match_operator<T: Copy>(&mut self, table: &[(Type, T)]) -> Option<T> {
        for (ty, item) in table {
            if self.match_one(*ty) {
                // Already skipped in the `match_one`, just return result
                return Some(*item);
            }
        }

        None
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Block, Branch, CatchClause, Expr, LogicalOp, Program, Stmt, UnaryOp};
    use crate::error::Error;
    use crate::parser::Parser;
    use thenga_core::{Literal, Scanner, Type};

    fn parse(src: &str) -> Result<Program, Error> {
        let mut scanner = Scanner::new();
        let tokens = scanner.tokenize(src).unwrap();
        let mut parser = Parser::new(&tokens);
        parser.parse()
    }

    #[test]
    fn test_statements() {
        let tests = [
            // precedence
            (
                "2 + 3 * 4",
                Stmt::expression(Expr::binary(
                    Expr::literal(2),
                    BinaryOp::Add,
                    Expr::binary(Expr::literal(3), BinaryOp::Multiply, Expr::literal(4)),
                )),
            ),
            // left associativity
            (
                "10 - 3 - 2;",
                Stmt::expression(Expr::binary(
                    Expr::binary(Expr::literal(10), BinaryOp::Subtract, Expr::literal(3)),
                    BinaryOp::Subtract,
                    Expr::literal(2),
                )),
            ),
            // grouping is not a node of its own
            (
                "(1 + 2) % 4",
                Stmt::expression(Expr::binary(
                    Expr::binary(Expr::literal(1), BinaryOp::Add, Expr::literal(2)),
                    BinaryOp::Modulo,
                    Expr::literal(4),
                )),
            ),
            // logical levels, `pinnem` binds tighter than `allel`
            (
                "a allel b pinnem !c",
                Stmt::expression(Expr::logical(
                    Expr::variable("a"),
                    LogicalOp::Or,
                    Expr::logical(
                        Expr::variable("b"),
                        LogicalOp::And,
                        Expr::unary(UnaryOp::Not, Expr::variable("c")),
                    ),
                )),
            ),
            // loose and strict equality stay separate
            (
                "x == 1 === y",
                Stmt::expression(Expr::binary(
                    Expr::binary(Expr::variable("x"), BinaryOp::LooseEqual, Expr::literal(1)),
                    BinaryOp::StrictEqual,
                    Expr::variable("y"),
                )),
            ),
            (
                "para(x velliyathum_same 1)",
                Stmt::print(Expr::binary(
                    Expr::variable("x"),
                    BinaryOp::GreaterEqual,
                    Expr::literal(1),
                )),
            ),
            (
                "ith_fixed_aan pi = 3.14",
                Stmt::var("pi", Expr::literal(3.14), true),
            ),
            // postfix chain
            (
                "a.b[0](1, 2).length",
                Stmt::expression(Expr::member(
                    Expr::call(
                        Expr::index(Expr::member(Expr::variable("a"), "b"), Expr::literal(0)),
                        vec![Expr::literal(1), Expr::literal(2)],
                    ),
                    "length",
                )),
            ),
            // keyword helpers become ordinary calls
            (
                "koottu(1, 2)",
                Stmt::expression(Expr::builtin_call(
                    "add",
                    vec![Expr::literal(1), Expr::literal(2)],
                )),
            ),
            (
                "push(xs, 1, 2)",
                Stmt::expression(Expr::builtin_call(
                    "push",
                    vec![Expr::variable("xs"), Expr::literal(1), Expr::literal(2)],
                )),
            ),
            (
                "random()",
                Stmt::expression(Expr::builtin_call("random", Vec::new())),
            ),
            (
                "xs[1] = -2",
                Stmt::Assign {
                    target: Expr::index(Expr::variable("xs"), Expr::literal(1)),
                    value: Expr::unary(UnaryOp::Negate, Expr::literal(2)),
                },
            ),
        ];

        for (src, expected) in tests {
            assert_eq!(
                parse(src).unwrap(),
                Program {
                    statements: vec![expected]
                },
                "source: {}",
                src
            );
        }
    }

    #[test]
    fn test_literals_with_trailing_commas() {
        let program = parse("[1, 'two', onnum_illa,]; {a: 1, 'b c': sheriya, length: 2,}").unwrap();

        assert_eq!(
            program.statements[0],
            Stmt::expression(Expr::Array {
                elements: vec![
                    Expr::literal(1),
                    Expr::literal("two"),
                    Expr::literal(Literal::Nil),
                ]
            })
        );

        match &program.statements[1] {
            Stmt::Expression {
                expression: Expr::Object { properties },
            } => {
                let keys: Vec<&str> = properties.iter().map(|p| p.key.as_str()).collect();
                assert_eq!(keys, vec!["a", "b c", "length"]);
                assert_eq!(properties[1].value, Expr::literal(true));
            }
            other => panic!("expected an object literal, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let program = parse(
            "seriyano (x) { para(1) } allelum (y) { para(2); } allelum (z) {} allengil { para(3) }",
        )
        .unwrap();

        assert_eq!(
            program.statements,
            vec![Stmt::If {
                branches: vec![
                    Branch {
                        condition: Expr::variable("x"),
                        body: Block::new(vec![Stmt::print(Expr::literal(1))]),
                    },
                    Branch {
                        condition: Expr::variable("y"),
                        body: Block::new(vec![Stmt::print(Expr::literal(2))]),
                    },
                    Branch {
                        condition: Expr::variable("z"),
                        body: Block::default(),
                    },
                ],
                else_branch: Some(Block::new(vec![Stmt::print(Expr::literal(3))])),
            }]
        );
    }

    #[test]
    fn test_function_and_return() {
        let program = parse("pani f(a, b) { thirich_tha a + b } pani g() { thirich_tha }").unwrap();

        assert_eq!(
            program.statements,
            vec![
                Stmt::function(
                    "f",
                    &["a", "b"],
                    Block::new(vec![Stmt::Return {
                        value: Some(Expr::binary(
                            Expr::variable("a"),
                            BinaryOp::Add,
                            Expr::variable("b"),
                        )),
                    }]),
                ),
                Stmt::function("g", &[], Block::new(vec![Stmt::Return { value: None }])),
            ]
        );
    }

    #[test]
    fn test_try_catch_finally() {
        let program = parse(
            "try_cheyth_nokk { theri_vili('x') } pidikk (e) { para(e) } ettavum_avasanam { chumma_iri_mone }",
        )
        .unwrap();

        assert_eq!(
            program.statements,
            vec![Stmt::Try {
                body: Block::new(vec![Stmt::Throw {
                    value: Expr::literal("x"),
                }]),
                catch: Some(CatchClause {
                    name: String::from("e"),
                    body: Block::new(vec![Stmt::print(Expr::variable("e"))]),
                }),
                finally: Some(Block::new(vec![Stmt::Pass])),
            }]
        );
    }

    #[test]
    fn test_special_forms() {
        let program = parse(
            "ith_manasilaayo(x, 'msg'); adipoli_aan(x, 'ignored')",
        );
        // the plain assert takes no message
        assert!(program.is_err());

        let program = parse(
            "ith_manasilaayo(x, 'msg'); sherikkum_pokkoda(x); scene_idd(10); ith_aan t = ithenthonn(kath_mone x)",
        )
        .unwrap();

        assert_eq!(
            program.statements,
            vec![
                Stmt::Assert {
                    condition: Expr::variable("x"),
                    message: Some(Expr::literal("msg")),
                },
                Stmt::Delete {
                    target: Expr::variable("x"),
                    force: true,
                },
                Stmt::Sleep {
                    duration: Expr::literal(10),
                },
                Stmt::var(
                    "t",
                    Expr::TypeOf {
                        value: Box::new(Expr::Await {
                            value: Box::new(Expr::variable("x")),
                        }),
                    },
                    false,
                ),
            ]
        );
    }

    #[test]
    fn test_errors_report_position() {
        assert_eq!(
            parse("para(1"),
            Err(Error::ParserError {
                line: 1,
                col: 7,
                found: Type::Eof,
                msg: String::from("Expected RightParen, got Eof"),
            })
        );

        assert_eq!(
            parse("ith_aan = 2"),
            Err(Error::ParserError {
                line: 1,
                col: 9,
                found: Type::Equal,
                msg: String::from("Expected Identifier, got Equal"),
            })
        );

        assert_eq!(
            parse("x = )"),
            Err(Error::ParserError {
                line: 1,
                col: 5,
                found: Type::RightParen,
                msg: String::from("Unexpected token: RightParen"),
            })
        );

        // reserved keywords have no grammar rule
        assert!(matches!(
            parse("vili f()"),
            Err(Error::ParserError {
                found: Type::Call,
                ..
            })
        ));
    }

    #[test]
    fn test_malformed_input() {
        let tests = [
            "[1, 2",
            "{a: }",
            "pani (x) {}",
            "seriyano sheriya {}",
            "repeat_adi(3) para(i)",
            "ith_aan x = ;",
            "f(1, 2",
            "1 +",
            ")",
            "try_cheyth_nokk { } pidikk {",
            "a.[0]",
        ];

        for src in tests {
            assert!(
                matches!(parse(src), Err(Error::ParserError { .. })),
                "source: {}",
                src
            );
        }
    }

    // Token the parser gave up on, if it gave up because of nesting
    fn too_deep_at(result: Result<Program, Error>) -> Option<Type> {
        match result {
            Err(Error::ParserError { found, msg, .. }) if msg == "Too much nesting" => Some(found),
            _ => None,
        }
    }

    #[test]
    fn test_nesting_limit() {
        let parens = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        assert_eq!(too_deep_at(parse(&parens)), Some(Type::LeftParen));

        let arrays = format!("{}{}", "[".repeat(5000), "]".repeat(5000));
        assert_eq!(too_deep_at(parse(&arrays)), Some(Type::LeftBracket));

        let negations = format!("{}1", "-".repeat(5000));
        assert_eq!(too_deep_at(parse(&negations)), Some(Type::Minus));

        let blocks = format!(
            "{}{}",
            "seriyano (sheriya) { ".repeat(2000),
            "} ".repeat(2000)
        );
        assert!(too_deep_at(parse(&blocks)).is_some());

        // moderate nesting is fine
        let parens = format!("para({}1{})", "(".repeat(200), ")".repeat(200));
        assert!(parse(&parens).is_ok());
        let negations = format!("{}1", "-".repeat(200));
        assert!(parse(&negations).is_ok());
    }

    #[test]
    fn test_empty_token_slice_does_not_panic() {
        let mut parser = Parser::new(&[]);
        assert_eq!(parser.parse(), Ok(Program { statements: vec![] }));
    }
}
