use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    SemiColon,

    Minus,
    Plus,
    Slash,
    Star,
    Percent,

    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    StrictEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,

    Identifier,
    String,
    Number,

    // Declarations and literals
    Var,
    Const,
    True,
    False,
    Nil,

    // I/O
    Print,
    Input,
    Throw,
    Log,

    // Conditionals
    If,
    ElseIf,
    Else,

    // Loops
    Repeat,
    While,
    Break,
    Continue,

    // Functions
    Fun,
    Return,
    Call,

    // Memory
    Delete,
    ForceDelete,
    TypeOf,
    Copy,

    // Sequences
    Array,
    Push,
    Pop,
    Length,

    // Text helpers
    Join,
    Split,
    Trim,
    Concat,

    // Math helpers
    Add,
    Subtract,
    Multiply,
    Divide,
    Random,

    // Special statements and checks
    Assert,
    AssertDetailed,
    TruthyCheck,
    Debug,
    Sleep,
    Pass,
    Validate,
    Warning,

    Try,
    Catch,
    Finally,

    Await,
    Later,
    Before,

    Eof,
}

impl Type {
    /// Whether this category comes from the keyword table rather than punctuation.
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            Type::LeftParen
                | Type::RightParen
                | Type::LeftBrace
                | Type::RightBrace
                | Type::LeftBracket
                | Type::RightBracket
                | Type::Comma
                | Type::Dot
                | Type::Colon
                | Type::SemiColon
                | Type::Minus
                | Type::Plus
                | Type::Slash
                | Type::Star
                | Type::Percent
                | Type::Bang
                | Type::BangEqual
                | Type::Equal
                | Type::EqualEqual
                | Type::StrictEqual
                | Type::Greater
                | Type::GreaterEqual
                | Type::Less
                | Type::LessEqual
                | Type::And
                | Type::Or
                | Type::Identifier
                | Type::String
                | Type::Number
                | Type::Eof
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Str(String),
    Num(f64),
    Bool(bool),
    Nil,
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(String::from(value))
    }
}

macro_rules! impl_from_num_for_literal {
    ( $( $t:ident )* ) => {
        $(
            impl From<$t> for Literal {
                fn from(n: $t) -> Literal {
                    Literal::Num(n as f64)
                }
            }
        )*
    }
}

impl_from_num_for_literal!(u8 i8 u16 i16 u32 i32 u64 i64 usize isize f32 f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TokenIndex(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub ty: Type,
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
    pub idx: TokenIndex,
    pub value: Literal,
}

impl Token {
    pub fn new(
        ty: Type,
        lexeme: String,
        line: usize,
        col: usize,
        idx: usize,
        value: Literal,
    ) -> Self {
        Token {
            ty,
            lexeme,
            line,
            col,
            idx: TokenIndex(idx),
            value,
        }
    }
}
