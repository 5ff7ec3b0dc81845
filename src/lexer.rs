use std::{iter::Peekable, str::Chars};

use crate::token::{Location, Span, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Lexes the whole input, producing the tokens into the provided buffer. The
/// last token is always [`TokenKind::Eof`].
pub fn lex(src: &str, tokens: &mut Vec<Token>) {
    assert_eq!(tokens.len(), 0, "must pass clean tokens buffer");
    let mut lexer = Lexer::new(src);
    loop {
        let token = lexer.next_token();
        tokens.push(token);
        if token.is_eof() {
            break;
        }
    }
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

/// The lexer. Each call to [`Lexer::next_token`] irreversibly advances it;
/// whitespace and comments are skipped.
pub struct Lexer<'src> {
    src: &'src str,
    iter: Peekable<Chars<'src>>,
    cursor: usize,
    line: u32,
    column: u32,
    current_lo: usize,
    current_line: u32,
    current_column: u32,
    last: Option<Token>,
}

impl<'src> Lexer<'src> {
    /// Constructs a new lexer with the default state.
    pub fn new(src: &'src str) -> Lexer<'src> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            line: 1,
            column: 1,
            current_lo: 0,
            current_line: 1,
            current_column: 1,
            last: None,
        }
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        let kind = self.scan_token_kind();
        let token = Token {
            kind,
            span: self.span(),
            loc: self.location(),
        };
        self.last = Some(token);
        token
    }

    /// Returns the source text of the provided token.
    pub fn text(&self, token: Token) -> &'src str {
        token.span.substr(self.src)
    }

    /// Whether the input has been fully consumed.
    pub fn is_at_end(&self) -> bool {
        self.last.is_some_and(|t| t.is_eof())
    }

    /// Tries to scan the current character.
    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        match self.mark_advance() {
            '\0' => Eof,
            '+' | '*' | '/' | '%' | '&' | '|' => Operator,
            '-' => match self.peek() {
                '>' => self.advance_with(Arrow),
                _ => Operator,
            },
            '<' | '>' | '!' => {
                if self.peek() == '=' {
                    self.advance();
                }
                Operator
            }
            '=' => match self.peek() {
                '=' => self.advance_with(Operator),
                _ => Equals,
            },
            ':' => match self.peek() {
                '=' => self.advance_with(ColonEquals),
                _ => Colon,
            },
            ';' => Semicolon,
            ',' => Comma,
            '.' => Dot,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            _ => ErrorUnexpectedChar,
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        let valid_identifier_suffix = |c: char| c.is_ascii_alphanumeric() || c == '_';
        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    fn number(&mut self) -> TokenKind {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        TokenKind::Integer
    }

    /// Skips whitespace and `//` line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                c if c.is_ascii_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_second() == '/' => {
                    while !matches!(self.peek(), '\n' | '\0') {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }
}

impl Lexer<'_> {
    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.current_line = self.line;
        self.current_column = self.column;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the character after the next one, without advancing.
    fn peek_second(&self) -> char {
        self.src[self.cursor..].chars().nth(1).unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo, self.cursor)
    }

    /// Returns the location of the current marked bounds.
    fn location(&self) -> Location {
        Location::new(self.current_line, self.current_column, self.line, self.column)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }
}
