use std::fmt;

use crate::ice;

/// A source region, in 1-based lines and columns.
///
/// `last_column` is exclusive: the region of a single character at column 4
/// is `4..5`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub first_line: u32,
    pub first_column: u32,
    pub last_line: u32,
    pub last_column: u32,
}

impl Location {
    pub const fn new(first_line: u32, first_column: u32, last_line: u32, last_column: u32) -> Self {
        Location {
            first_line,
            first_column,
            last_line,
            last_column,
        }
    }

    /// Returns a location that spans from the start of `self` to the end of
    /// `other`.
    #[must_use]
    pub fn to(self, other: Location) -> Location {
        Location {
            first_line: self.first_line,
            first_column: self.first_column,
            last_line: other.last_line,
            last_column: other.last_column,
        }
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { loc: self, inner }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location({self})")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Location {
            first_line,
            first_column,
            last_line,
            last_column,
        } = self;
        if first_line == last_line {
            write!(f, "{first_line}:{first_column}..{last_column}")
        } else {
            write!(f, "{first_line}:{first_column}..{last_line}:{last_column}")
        }
    }
}

/// Byte bounds of a token in the source buffer.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Span {
    pub lo: usize,
    pub len: u32,
}

impl Span {
    pub fn new_of_bounds(lo: usize, hi: usize) -> Span {
        debug_assert!(hi >= lo);
        let len = u32::try_from(hi - lo).unwrap_or(u32::MAX);
        Span { lo, len }
    }

    /// The text of the span. The span must come from lexing `src`.
    pub fn substr(self, src: &str) -> &str {
        let hi = self.lo + self.len as usize;
        match src.get(self.lo..hi) {
            Some(text) => text,
            None => ice!("span {}..{hi} outside of a {}-byte source", self.lo, src.len()),
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = lo + self.len as usize;
        write!(f, "Span({lo}..{hi})")
    }
}

/// Some value with an attached source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub loc: Location,
    pub inner: T,
}

impl<T> Spanned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            loc: self.loc,
            inner: f(self.inner),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub loc: Location,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.loc)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Fn,
    Var,
    If,
    Else,
    While,
    Nil,
    True,
    False,

    /// `Nil`, in type position.
    NilType,
    IntegerType,
    BooleanType,
    CharacterType,

    /// Any operator-like token (`+`, `<=`, `!`, `&`, ...). The actual operator
    /// is taken from the token text, since the operator tables are keyed by it.
    Operator,
    /// `=`
    Equals,
    /// `:=`
    ColonEquals,
    /// `->`
    Arrow,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Identifier,
    Integer,

    Eof,
    ErrorUnexpectedChar,
}

impl TokenKind {
    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::ErrorUnexpectedChar)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            Fn => "`fn`",
            Var => "`var`",
            If => "`if`",
            Else => "`else`",
            While => "`while`",
            Nil => "`nil`",
            True => "`true`",
            False => "`false`",
            NilType => "`Nil`",
            IntegerType => "`Integer`",
            BooleanType => "`Boolean`",
            CharacterType => "`Character`",
            Operator => "operator",
            Equals => "`=`",
            ColonEquals => "`:=`",
            Arrow => "`->`",
            Colon => "`:`",
            Semicolon => "`;`",
            Comma => "`,`",
            Dot => "`.`",
            LParen => "`(`",
            RParen => "`)`",
            LBrace => "`{`",
            RBrace => "`}`",
            LBracket => "`[`",
            RBracket => "`]`",
            Identifier => "identifier",
            Integer => "integer literal",
            Eof => "end of file",
            ErrorUnexpectedChar => "unexpected character",
        };
        f.write_str(s)
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "fn" => TokenKind::Fn,
    "var" => TokenKind::Var,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "nil" => TokenKind::Nil,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "Nil" => TokenKind::NilType,
    "Integer" => TokenKind::IntegerType,
    "Boolean" => TokenKind::BooleanType,
    "Character" => TokenKind::CharacterType,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_text() {
        let span = Span::new_of_bounds(3, 7);
        assert_eq!(span.substr("fn main() {}"), "main");
    }

    #[test]
    #[should_panic(expected = "internal compiler error: span 3..7 outside of a 4-byte source")]
    fn span_from_another_source() {
        Span::new_of_bounds(3, 7).substr("main");
    }
}
