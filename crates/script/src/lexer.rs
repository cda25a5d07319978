//! Tokenizer for the drawing dialect.
//!
//! Fragments can end anywhere, including inside a string or a block
//! comment, so "ran off the end of the input" is an ordinary parse error
//! here; the streaming executor treats it as "keep waiting".

use crate::error::ScriptError;
use compact_str::CompactString;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Num(f64),
    Str(String),
    Ident(CompactString),

    // keywords
    Const,
    Let,
    Var,
    For,
    If,
    Else,
    True,
    False,
    Null,

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    Dot,
    Question,

    // operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    Bang,
}

impl Tok {
    pub(crate) fn describe(&self) -> String {
        match self {
            Tok::Num(n) => format!("number {n}"),
            Tok::Str(_) => "string".into(),
            Tok::Ident(name) => format!("identifier '{name}'"),
            other => format!("{other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub tok: Tok,
    pub line: u32,
    pub col: u32,
    /// Set when at least one line break separates this token from the
    /// previous one; the parser uses it as a lenient statement terminator.
    pub newline_before: bool,
}

pub(crate) fn lex(src: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
    newline_pending: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            line: 1,
            col: 1,
            newline_pending: false,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn err(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::parse_at(self.line, self.col, message)
    }

    fn run(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, col) = (self.line, self.col);
            let Some(c) = self.peek() else { break };
            let tok = self.next_tok(c)?;
            tokens.push(Token {
                tok,
                line,
                col,
                newline_before: std::mem::take(&mut self.newline_pending),
            });
        }
        Ok(tokens)
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' {
                        self.newline_pending = true;
                    }
                    self.bump();
                }
                Some('/') => {
                    // Lookahead without consuming: clone is cheap on Chars.
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.next() {
                        Some('/') => {
                            while let Some(c) = self.peek() {
                                if c == '\n' {
                                    break;
                                }
                                self.bump();
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut closed = false;
                            while let Some(c) = self.bump() {
                                if c == '*' && self.eat('/') {
                                    closed = true;
                                    break;
                                }
                            }
                            if !closed {
                                return Err(self.err("unterminated block comment"));
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_tok(&mut self, c: char) -> Result<Tok, ScriptError> {
        if c.is_ascii_digit() || (c == '.' && self.peeks_digit_after_dot()) {
            return self.number();
        }
        if c == '"' || c == '\'' {
            return self.string(c);
        }
        if c.is_alphabetic() || c == '_' || c == '$' {
            return Ok(self.ident());
        }

        self.bump();
        let tok = match c {
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            '{' => Tok::LBrace,
            '}' => Tok::RBrace,
            '[' => Tok::LBracket,
            ']' => Tok::RBracket,
            ',' => Tok::Comma,
            ';' => Tok::Semi,
            ':' => Tok::Colon,
            '.' => Tok::Dot,
            '?' => Tok::Question,
            '%' => Tok::Percent,
            '+' => {
                if self.eat('+') {
                    Tok::PlusPlus
                } else if self.eat('=') {
                    Tok::PlusAssign
                } else {
                    Tok::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    Tok::MinusMinus
                } else if self.eat('=') {
                    Tok::MinusAssign
                } else {
                    Tok::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    Tok::StarAssign
                } else {
                    Tok::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    Tok::SlashAssign
                } else {
                    Tok::Slash
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') { Tok::EqEqEq } else { Tok::EqEq }
                } else {
                    Tok::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') { Tok::NotEqEq } else { Tok::NotEq }
                } else {
                    Tok::Bang
                }
            }
            '<' => {
                if self.eat('=') {
                    Tok::Le
                } else {
                    Tok::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Tok::Ge
                } else {
                    Tok::Gt
                }
            }
            '&' => {
                if self.eat('&') {
                    Tok::AndAnd
                } else {
                    return Err(self.err("unexpected character '&'"));
                }
            }
            '|' => {
                if self.eat('|') {
                    Tok::OrOr
                } else {
                    return Err(self.err("unexpected character '|'"));
                }
            }
            // A lone backtick is what a split code fence looks like once
            // cleaning has only partially caught up; report it like any
            // other stray character.
            other => return Err(self.err(format!("unexpected character '{other}'"))),
        };
        Ok(tok)
    }

    fn peeks_digit_after_dot(&mut self) -> bool {
        let mut ahead = self.chars.clone();
        ahead.next();
        matches!(ahead.next(), Some(d) if d.is_ascii_digit())
    }

    fn number(&mut self) -> Result<Tok, ScriptError> {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '.' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            text.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            let mut digits = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                    digits = true;
                } else {
                    break;
                }
            }
            if !digits {
                return Err(self.err("malformed exponent"));
            }
        }
        text.parse::<f64>()
            .map(Tok::Num)
            .map_err(|_| self.err(format!("malformed number '{text}'")))
    }

    fn string(&mut self, quote: char) -> Result<Tok, ScriptError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some(c) if c == quote => return Ok(Tok::Str(out)),
                Some('\\') => match self.bump() {
                    None => return Err(self.err("unterminated string")),
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(other) => out.push(other),
                },
                Some('\n') => return Err(self.err("unterminated string")),
                Some(c) => out.push(c),
            }
        }
    }

    fn ident(&mut self) -> Tok {
        let mut name = CompactString::default();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match name.as_str() {
            "const" => Tok::Const,
            "let" => Tok::Let,
            "var" => Tok::Var,
            "for" => Tok::For,
            "if" => Tok::If,
            "else" => Tok::Else,
            "true" => Tok::True,
            "false" => Tok::False,
            "null" => Tok::Null,
            _ => Tok::Ident(name),
        }
    }
}
