use phf::{phf_map, Map};

use crate::error::Error;
use crate::token::{Literal, Token, Type};

pub struct Scanner;

impl Scanner {
    pub const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "ith_aan" => Type::Var,
        "ith_fixed_aan" => Type::Const,

        "sheriya" => Type::True,
        "sheriyalla" => Type::False,
        "onnum_illa" => Type::Nil,

        "para" => Type::Print,
        "chodhik" => Type::Input,
        "theri_vili" => Type::Throw,
        "log_cheyy" => Type::Log,

        "seriyano" => Type::If,
        "allelum" => Type::ElseIf,
        "allengil" => Type::Else,

        "repeat_adi" => Type::Repeat,
        "odi_repeat_mwone" => Type::While,
        "odaruth_mone" => Type::Break,
        "vitt_kala" => Type::Continue,

        "pani" => Type::Fun,
        "thirich_tha" => Type::Return,
        "vili" => Type::Call,

        "nee_po_mone_dinesha" => Type::Delete,
        "sherikkum_pokkoda" => Type::ForceDelete,
        "ithenthonn" => Type::TypeOf,
        "copy_adi" => Type::Copy,

        "array" => Type::Array,
        "push" => Type::Push,
        "pop" => Type::Pop,
        "length" => Type::Length,

        "join_pannuda" => Type::Join,
        "split_pannuda" => Type::Split,
        "trim_pannuda" => Type::Trim,
        "kooti_vekkada" => Type::Concat,

        "koottu" => Type::Add,
        "kurakku" => Type::Subtract,
        "gunikku" => Type::Multiply,
        "harikku" => Type::Divide,
        "random" => Type::Random,

        "adipoli_aan" => Type::Assert,
        "ner_aano_mwone" => Type::TruthyCheck,
        "enthada_ith" => Type::Debug,
        "scene_idd" => Type::Sleep,
        "chumma_iri_mone" => Type::Pass,
        "ith_manasilaayo" => Type::AssertDetailed,
        "aalu_sheri_aano" => Type::Validate,
        "kett_paranju" => Type::Warning,

        "try_cheyth_nokk" => Type::Try,
        "pidikk" => Type::Catch,
        "ettavum_avasanam" => Type::Finally,

        "kath_mone" => Type::Await,
        "pinne_parayam" => Type::Later,
        "pand_munne" => Type::Before,

        // Word spellings of the operators share the category of the symbol
        "same_aano" => Type::EqualEqual,
        "bilkul_same" => Type::StrictEqual,
        "velliya" => Type::Greater,
        "cheriya" => Type::Less,
        "velliyathum_same" => Type::GreaterEqual,
        "cheriyathum_same" => Type::LessEqual,
        "vendathilla" => Type::BangEqual,
        "pinnem" => Type::And,
        "allel" => Type::Or,
        "onnum_venda" => Type::Bang,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens(&mut self, src: &str) -> TokenStream {
        TokenStream::new(src)
    }

    /// Scans the whole source, stopping at the first lexical error.
    #[tracing::instrument(skip_all, fields(source_len = src.len()))]
    pub fn tokenize(&mut self, src: &str) -> Result<Vec<Token>, Error> {
        let mut stream = self.scan_tokens(src);
        let tokens: Vec<Token> = stream.by_ref().collect();

        match stream.error() {
            Some(err) => Err(err.clone()),
            None => {
                tracing::debug!(token_count = tokens.len(), "scanned source");
                Ok(tokens)
            }
        }
    }
}

pub struct TokenStream {
    src: Vec<char>,

    // Position of the cursor, 1-based like the reported positions
    line: usize,
    col: usize,

    // `start` and `current` points to the start and end of the token being scanned
    start: usize,
    start_line: usize,
    start_col: usize,
    current: usize,

    // This represents a token's index in the token stream
    index: usize,

    // Set once the eof token has been emitted, so the iterator can tell "reached the end"
    // apart from "reached the end and already produced Eof".
    eof: bool,
    error: Option<Error>,
}

impl TokenStream {
    pub fn new(src: &str) -> Self {
        TokenStream {
            src: src.chars().collect(),
            line: 1,
            col: 1,
            start: 0,
            start_line: 1,
            start_col: 1,
            current: 0,
            index: 0,
            eof: false,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    fn scan_token(&mut self) -> Result<Option<Token>, Error> {
        let c = self.advance();

        let token = match c {
            '(' => Some(self.make_token(Type::LeftParen)),
            ')' => Some(self.make_token(Type::RightParen)),
            '{' => Some(self.make_token(Type::LeftBrace)),
            '}' => Some(self.make_token(Type::RightBrace)),
            '[' => Some(self.make_token(Type::LeftBracket)),
            ']' => Some(self.make_token(Type::RightBracket)),
            ',' => Some(self.make_token(Type::Comma)),
            '.' => Some(self.make_token(Type::Dot)),
            ':' => Some(self.make_token(Type::Colon)),
            ';' => Some(self.make_token(Type::SemiColon)),
            '-' => Some(self.make_token(Type::Minus)),
            '+' => Some(self.make_token(Type::Plus)),
            '*' => Some(self.make_token(Type::Star)),
            '%' => Some(self.make_token(Type::Percent)),

            '!' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::BangEqual))
                } else {
                    Some(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Some(self.make_token(Type::StrictEqual))
                    } else {
                        Some(self.make_token(Type::EqualEqual))
                    }
                } else {
                    Some(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::LessEqual))
                } else {
                    Some(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::GreaterEqual))
                } else {
                    Some(self.make_token(Type::Greater))
                }
            }

            '&' if self.match_char('&') => Some(self.make_token(Type::And)),
            '|' if self.match_char('|') => Some(self.make_token(Type::Or)),

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else if self.match_char('*') {
                    let mut done = false;
                    while !self.is_at_end() && !done {
                        let now = self.advance();
                        if now == '*' && self.peek() == '/' {
                            self.advance();
                            done = true;
                        }
                    }

                    if done {
                        None
                    } else {
                        return Err(Error::UnterminatedBlockComment {
                            line: self.start_line,
                            col: self.start_col,
                        });
                    }
                } else {
                    Some(self.make_token(Type::Slash))
                }
            }

            '"' | '\'' => Some(self.string(c)?),

            // Newlines carry no meaning, statement boundaries come from the grammar
            '\n' => None,
            c if c.is_whitespace() => None,

            c if c.is_ascii_digit() => Some(self.number()?),
            c if c.is_ascii_alphabetic() || c == '_' => Some(self.identifier()),

            _ => {
                return Err(Error::UnexpectedCharacter {
                    ch: c,
                    line: self.start_line,
                    col: self.start_col,
                });
            }
        };

        Ok(token)
    }

    fn string(&mut self, quote: char) -> Result<Token, Error> {
        let unterminated = Error::UnterminatedString {
            line: self.start_line,
            col: self.start_col,
        };
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(unterminated);
            }

            let c = self.advance();
            if c == quote {
                break;
            }

            if c != '\\' {
                value.push(c);
                continue;
            }

            if self.is_at_end() {
                return Err(unterminated);
            }

            match self.advance() {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                // covers `\\`, the delimiting quote and any unknown escape
                other => value.push(other),
            }
        }

        Ok(self.make_token_with_val(Type::String, Literal::from(value)))
    }

    fn number(&mut self) -> Result<Token, Error> {
        let mut seen_dot = false;
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            if self.advance() == '.' {
                if seen_dot {
                    return Err(self.invalid_number());
                }
                seen_dot = true;
            }
        }

        let text = self.lexeme();
        match text.parse::<f64>() {
            Ok(num) => Ok(self.make_token_with_val(Type::Number, Literal::Num(num))),
            Err(_) => Err(self.invalid_number()),
        }
    }

    fn invalid_number(&mut self) -> Error {
        // swallow the rest of the malformed literal so the reported lexeme is complete
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            self.advance();
        }

        Error::InvalidNumber {
            lexeme: self.lexeme(),
            line: self.start_line,
            col: self.start_col,
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();

        match Scanner::KEYWORDS.get(text.as_str()) {
            None => self.make_token(Type::Identifier),
            Some(ty @ Type::True) => self.make_token_with_val(*ty, Literal::Bool(true)),
            Some(ty @ Type::False) => self.make_token_with_val(*ty, Literal::Bool(false)),
            Some(keyword) => self.make_token(*keyword),
        }
    }

    fn lexeme(&self) -> String {
        self.src[self.start..self.current].iter().collect()
    }

    fn peek(&self) -> char {
        self.src.get(self.current).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let res = self.peek();
        self.current += 1;

        if res == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }

        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.peek() != c {
            false
        } else {
            self.advance();
            true
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn make_token(&mut self, ty: Type) -> Token {
        self.make_token_with_val(ty, Literal::Nil)
    }

    fn make_token_with_val(&mut self, ty: Type, val: Literal) -> Token {
        let lexeme = match ty {
            Type::Eof => String::new(),
            _ => self.lexeme(),
        };

        let token = Token::new(
            ty,
            lexeme,
            self.start_line,
            self.start_col,
            self.index,
            val,
        );
        self.index += 1;
        token
    }
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof || self.error.is_some() {
            return None;
        }

        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.col;

            let token = self.scan_token();
            match token {
                Ok(None) => continue,
                Ok(Some(token)) => return Some(token),
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            }
        }

        self.eof = true;
        self.start = self.current;
        self.start_line = self.line;
        self.start_col = self.col;
        Some(self.make_token(Type::Eof))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::scanner::Scanner;
    use crate::token::{Literal, Token, Type};

    #[test]
    fn test_basic_scanning() {
        let source = "ith_aan x = 12.5 'hi' sheriya // comment";
        let mut scanner = Scanner::new();
        let stream = scanner.scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![
                Token::new(Type::Var, String::from("ith_aan"), 1, 1, 0, Literal::Nil),
                Token::new(Type::Identifier, String::from("x"), 1, 9, 1, Literal::Nil),
                Token::new(Type::Equal, String::from("="), 1, 11, 2, Literal::Nil),
                Token::new(
                    Type::Number,
                    String::from("12.5"),
                    1,
                    13,
                    3,
                    Literal::Num(12.5)
                ),
                Token::new(
                    Type::String,
                    String::from("'hi'"),
                    1,
                    18,
                    4,
                    Literal::from("hi")
                ),
                Token::new(
                    Type::True,
                    String::from("sheriya"),
                    1,
                    23,
                    5,
                    Literal::Bool(true)
                ),
                Token::new(Type::Eof, String::new(), 1, 41, 6, Literal::Nil),
            ]
        );
    }

    #[test]
    fn test_operators_match_longest_first() {
        let source = "=== == = != ! >= > <= < && || %";
        let mut scanner = Scanner::new();
        let types: Vec<Type> = scanner.scan_tokens(source).map(|t| t.ty).collect();

        assert_eq!(
            types,
            vec![
                Type::StrictEqual,
                Type::EqualEqual,
                Type::Equal,
                Type::BangEqual,
                Type::Bang,
                Type::GreaterEqual,
                Type::Greater,
                Type::LessEqual,
                Type::Less,
                Type::And,
                Type::Or,
                Type::Percent,
                Type::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_operators_share_symbol_categories() {
        let mut scanner = Scanner::new();
        let types: Vec<Type> = scanner
            .scan_tokens("velliya same_aano bilkul_same pinnem allel onnum_venda")
            .map(|t| t.ty)
            .collect();

        assert_eq!(
            types,
            vec![
                Type::Greater,
                Type::EqualEqual,
                Type::StrictEqual,
                Type::And,
                Type::Or,
                Type::Bang,
                Type::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        let mut scanner = Scanner::new();
        let tokens = scanner
            .tokenize(r#""a\nb\t\"q\"" 'it\'s' "back\\slash""#)
            .unwrap();

        assert_eq!(tokens[0].value, Literal::from("a\nb\t\"q\""));
        assert_eq!(tokens[1].value, Literal::from("it's"));
        assert_eq!(tokens[2].value, Literal::from("back\\slash"));
    }

    #[test]
    fn test_positions_across_lines() {
        let mut scanner = Scanner::new();
        let tokens = scanner.tokenize("para(1)\n  x").unwrap();

        let x = &tokens[4];
        assert_eq!(x.ty, Type::Identifier);
        assert_eq!((x.line, x.col), (2, 3));
    }

    #[test]
    fn test_multiline_comment() {
        let source = "/*\n\
            this is a multiline comment \n\
        */";
        let mut scanner = Scanner::new();
        let stream = scanner.scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![Token::new(Type::Eof, String::new(), 3, 3, 0, Literal::Nil)]
        );
    }

    #[test]
    fn test_unterminated_multiline_comment() {
        let source = "/*";
        let mut scanner = Scanner::new();
        let mut stream = scanner.scan_tokens(source);
        stream.by_ref().last();

        assert_eq!(
            stream.error().unwrap(),
            &Error::UnterminatedBlockComment { line: 1, col: 1 }
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut scanner = Scanner::new();

        assert_eq!(
            scanner.tokenize("\"hello"),
            Err(Error::UnterminatedString { line: 1, col: 1 })
        );
        assert_eq!(
            scanner.tokenize("x = 'dangling\\"),
            Err(Error::UnterminatedString { line: 1, col: 5 })
        );
    }

    #[test]
    fn test_number_with_two_dots() {
        let mut scanner = Scanner::new();

        assert_eq!(
            scanner.tokenize("ith_aan n = 1.2.3"),
            Err(Error::InvalidNumber {
                lexeme: String::from("1.2.3"),
                line: 1,
                col: 13,
            })
        );
    }

    #[test]
    fn test_unexpected_character() {
        let mut scanner = Scanner::new();

        assert_eq!(
            scanner.tokenize("x # y"),
            Err(Error::UnexpectedCharacter {
                ch: '#',
                line: 1,
                col: 3,
            })
        );
        assert_eq!(
            scanner.tokenize("a & b"),
            Err(Error::UnexpectedCharacter {
                ch: '&',
                line: 1,
                col: 3,
            })
        );
    }
}
