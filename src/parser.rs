use tracing::instrument;

use crate::{
    ast::{self, Ast, Ident, NodeId, NodeKind, Param},
    context::Context,
    lexer::Lexer,
    ops::{Assoc, Precedence},
    token::{Location, Spanned, Token, TokenKind},
    types::TypeId,
    util::intern::Symbol,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Parses a single expression spanning the whole input.
pub fn parse_expr(src: &str, cx: &mut Context) -> Result<Ast> {
    let mut p = Parser::new(src, cx);
    p.affix()?;
    p.consume(TokenKind::Eof)?;
    Ok(p.finish())
}

/// Parses every top-level term of a program, stopping at the first error. A
/// program must contain at least one term.
#[instrument(level = "debug", skip_all)]
pub fn parse_program(src: &str, cx: &mut Context) -> Result<Vec<Ast>> {
    let mut p = Parser::new(src, cx);
    let mut terms = vec![p.parse_top()?];
    while !p.is_at_end() {
        terms.push(p.parse_top()?);
    }
    Ok(terms)
}

/// A one-token-lookahead recursive descent parser. Each call to
/// [`Parser::parse_top`] produces the tree of the next top-level term.
pub struct Parser<'src, 'cx> {
    lexer: Lexer<'src>,
    current: Token,
    cx: &'cx mut Context,
    ast: Ast,
}

impl<'src, 'cx> Parser<'src, 'cx> {
    pub fn new(src: &'src str, cx: &'cx mut Context) -> Parser<'src, 'cx> {
        let mut lexer = Lexer::new(src);
        let current = lexer.next_token();
        Parser {
            lexer,
            current,
            cx,
            ast: Ast::default(),
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.current.is_eof()
    }

    /// Parses the next top-level term: a function or a global binding.
    ///
    /// Fails with [`Error::EndOfFile`] once the input is exhausted.
    pub fn parse_top(&mut self) -> Result<Ast> {
        match self.current.kind {
            TokenKind::Fn => self.function()?,
            TokenKind::Var | TokenKind::Identifier => self.bind_statement()?,
            TokenKind::Eof => return Err(self.current.loc.wrap(Error::EndOfFile)),
            kind if kind.is_error() => return Err(self.current_error(Error::UnexpectedCharacter)),
            kind => return Err(self.current_error(Error::BadTopLevel(kind))),
        };
        Ok(self.finish())
    }

    fn finish(&mut self) -> Ast {
        std::mem::take(&mut self.ast)
    }

    fn function(&mut self) -> Result<NodeId> {
        let start = self.consume(TokenKind::Fn)?.loc;
        let name = self.ident()?;
        self.consume(TokenKind::LParen)?;
        let params = self.list(TokenKind::RParen, |p| {
            let name = p.ident()?;
            p.consume(TokenKind::Colon)?;
            let ty = p.ty()?;
            Ok(Param { name, ty })
        })?;
        self.consume(TokenKind::RParen)?;
        let ret = if self.take(TokenKind::Arrow) {
            Some(self.ty()?)
        } else {
            None
        };
        let body = self.block()?;

        let loc = start.to(self.ast.loc(body));
        let function = ast::Function {
            name,
            params: params.into(),
            ret,
            body,
        };
        Ok(self.push(NodeKind::Function(Box::new(function)), loc))
    }

    /// `["var"] ID ':=' affix ';'`
    fn bind_statement(&mut self) -> Result<NodeId> {
        let start = self.current.loc;
        let mutable = self.take(TokenKind::Var);
        let name = self.ident()?;
        self.consume(TokenKind::ColonEquals)?;
        let value = self.affix()?;
        self.consume(TokenKind::Semicolon)?;

        let loc = start.to(self.ast.loc(value));
        Ok(self.push(
            NodeKind::Bind {
                name,
                mutable,
                value,
            },
            loc,
        ))
    }

    fn block(&mut self) -> Result<NodeId> {
        let start = self.consume(TokenKind::LBrace)?.loc;
        let mut terms = Vec::new();
        while !self.is(TokenKind::RBrace) && !self.is(TokenKind::Eof) {
            terms.push(self.term()?);
        }
        let end = self.consume(TokenKind::RBrace)?.loc;

        let loc = start.to(end);
        if terms.is_empty() {
            return Err(loc.wrap(Error::EmptyBlock));
        }
        Ok(self.push(NodeKind::Block(terms.into()), loc))
    }

    fn term(&mut self) -> Result<NodeId> {
        match self.current.kind {
            TokenKind::If | TokenKind::While => {
                let node = if self.is(TokenKind::If) {
                    self.conditional()?
                } else {
                    self.while_loop()?
                };
                self.take(TokenKind::Semicolon);
                Ok(node)
            }
            TokenKind::Var => self.bind_statement(),
            _ => {
                let node = self.affix()?;
                self.consume(TokenKind::Semicolon)?;
                Ok(node)
            }
        }
    }

    fn conditional(&mut self) -> Result<NodeId> {
        let start = self.consume(TokenKind::If)?.loc;
        self.consume(TokenKind::LParen)?;
        let test = self.affix()?;
        self.consume(TokenKind::RParen)?;
        let then_arm = self.block()?;
        self.consume(TokenKind::Else)?;
        let else_arm = if self.is(TokenKind::If) {
            self.conditional()?
        } else {
            self.block()?
        };

        let loc = start.to(self.ast.loc(else_arm));
        Ok(self.push(
            NodeKind::IfThenElse {
                test,
                then_arm,
                else_arm,
            },
            loc,
        ))
    }

    fn while_loop(&mut self) -> Result<NodeId> {
        let start = self.consume(TokenKind::While)?.loc;
        self.consume(TokenKind::LParen)?;
        let test = self.affix()?;
        self.consume(TokenKind::RParen)?;
        let body = self.block()?;

        let loc = start.to(self.ast.loc(body));
        Ok(self.push(NodeKind::While { test, body }, loc))
    }

    /// Assignment, which is right-associative and binds looser than any
    /// operator.
    fn affix(&mut self) -> Result<NodeId> {
        let target = self.composite()?;
        if !self.take(TokenKind::Equals) {
            return Ok(target);
        }
        let value = self.affix()?;

        let loc = self.ast.loc(target).to(self.ast.loc(value));
        Ok(self.push(NodeKind::Assignment { target, value }, loc))
    }

    fn composite(&mut self) -> Result<NodeId> {
        let lhs = self.builtin()?;
        self.infix(lhs, Precedence(0))
    }

    /// Precedence climbing over the operators registered in the binop table.
    fn infix(&mut self, mut lhs: NodeId, min: Precedence) -> Result<NodeId> {
        while let Some((op, precedence, assoc)) = self.peek_binop()? {
            if precedence < min {
                break;
            }
            self.advance(); // Operator

            let rhs = self.builtin()?;
            let next_min = match assoc {
                Assoc::Left => Precedence(precedence.0.saturating_add(1)),
                Assoc::Right => precedence,
            };
            let rhs = self.infix(rhs, next_min)?;

            let loc = self.ast.loc(lhs).to(self.ast.loc(rhs));
            lhs = self.push(NodeKind::Binop { op, lhs, rhs }, loc);
        }
        Ok(lhs)
    }

    /// If the current token is an operator, returns its binop table entry.
    fn peek_binop(&mut self) -> Result<Option<(Ident, Precedence, Assoc)>> {
        if !self.is(TokenKind::Operator) {
            return Ok(None);
        }
        let op = self.intern_current();
        match self.cx.binops.get(op.name) {
            Some(entry) => Ok(Some((op, entry.precedence, entry.assoc))),
            None => Err(op.loc.wrap(Error::UnknownBinop(op.name))),
        }
    }

    /// A basic expression followed by any number of member accesses,
    /// subscripts and applications.
    fn builtin(&mut self) -> Result<NodeId> {
        let mut node = self.basic()?;
        loop {
            node = match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let right = self.basic()?;
                    let loc = self.ast.loc(node).to(self.ast.loc(right));
                    self.push(NodeKind::Dot { left: node, right }, loc)
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.affix()?;
                    let end = self.consume(TokenKind::RBracket)?.loc;
                    let loc = self.ast.loc(node).to(end);
                    self.push(NodeKind::Subscript { left: node, index }, loc)
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.list(TokenKind::RParen, Parser::affix)?;
                    let end = self.consume(TokenKind::RParen)?.loc;
                    let loc = self.ast.loc(node).to(end);
                    let application = NodeKind::Application {
                        callee: node,
                        args: args.into(),
                    };
                    self.push(application, loc)
                }
                _ => return Ok(node),
            };
        }
    }

    fn basic(&mut self) -> Result<NodeId> {
        let token = self.current;
        match token.kind {
            TokenKind::Identifier => {
                let name = self.ident()?;
                if !self.take(TokenKind::ColonEquals) {
                    return Ok(self.push(NodeKind::Variable(name), name.loc));
                }
                let value = self.affix()?;
                let loc = name.loc.to(self.ast.loc(value));
                let bind = NodeKind::Bind {
                    name,
                    mutable: false,
                    value,
                };
                Ok(self.push(bind, loc))
            }
            TokenKind::Integer => {
                self.advance();
                let Ok(value) = self.lexer.text(token).parse::<i64>() else {
                    return Err(token.loc.wrap(Error::IntegerOutOfBounds));
                };
                Ok(self.push(NodeKind::Integer(value), token.loc))
            }
            TokenKind::Operator => self.prefix(),
            TokenKind::Nil => {
                self.advance();
                Ok(self.push(NodeKind::Nil, token.loc))
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                let value = token.kind == TokenKind::True;
                Ok(self.push(NodeKind::Boolean(value), token.loc))
            }

            // Grouping or tuple: ( affix [, affix]* )
            TokenKind::LParen => {
                self.advance();
                let elements = self.separated(Parser::affix)?;
                let end = self.consume(TokenKind::RParen)?.loc;
                let loc = token.loc.to(end);
                if let [inner] = elements[..] {
                    self.ast.set_loc(inner, loc);
                    return Ok(inner);
                }
                Ok(self.push(NodeKind::Tuple(elements.into()), loc))
            }

            // Array: [ affix [, affix]* ]
            TokenKind::LBracket => {
                self.advance();
                let elements = self.separated(Parser::affix)?;
                let end = self.consume(TokenKind::RBracket)?.loc;
                Ok(self.push(NodeKind::Array(elements.into()), token.loc.to(end)))
            }

            TokenKind::If => self.conditional(),
            TokenKind::While => self.while_loop(),

            kind if kind.is_error() => Err(self.current_error(Error::UnexpectedCharacter)),
            kind => Err(self.current_error(Error::UnknownBasic(kind))),
        }
    }

    /// Prefix forms: `&` (address-of), `*` (value-of) and the registered
    /// unary operators. The operand is a builtin, so prefixes bind tighter
    /// than any binary operator but looser than postfix forms.
    fn prefix(&mut self) -> Result<NodeId> {
        let op = self.intern_current();
        let kind: fn(NodeId) -> NodeKind = match self.lexer.text(self.current) {
            "&" => NodeKind::AddressOf,
            "*" => NodeKind::ValueOf,
            _ if self.cx.unops.contains(op.name) => {
                self.advance();
                let operand = self.builtin()?;
                let loc = op.loc.to(self.ast.loc(operand));
                return Ok(self.push(NodeKind::Unop { op, operand }, loc));
            }
            _ => return Err(op.loc.wrap(Error::UnknownUnop(op.name))),
        };
        self.advance();
        let operand = self.builtin()?;
        let loc = op.loc.to(self.ast.loc(operand));
        Ok(self.push(kind(operand), loc))
    }

    fn ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        let name = self.cx.strings.intern(self.lexer.text(token));
        Ok(Ident {
            name,
            loc: token.loc,
        })
    }

    /// Interns the text of the current token, without advancing.
    fn intern_current(&mut self) -> Ident {
        let token = self.current;
        Ident {
            name: self.cx.strings.intern(self.lexer.text(token)),
            loc: token.loc,
        }
    }
}

/// A type atom. Parenthesized lists are kept apart since they are either a
/// tuple, a grouping, or the parameter list of a function type.
enum TypeAtom {
    Single(TypeId),
    Group(Vec<TypeId>, Location),
}

impl Parser<'_, '_> {
    /// `atom ['->' type]`, where the arrow is right-associative.
    fn ty(&mut self) -> Result<TypeId> {
        let atom = self.type_atom()?;
        if !self.take(TokenKind::Arrow) {
            return self.resolve_atom(atom);
        }
        let args = match atom {
            TypeAtom::Single(ty) => vec![ty],
            TypeAtom::Group(tys, _) => tys,
        };
        let ret = self.ty()?;
        Ok(self.cx.types.function(ret, &args))
    }

    fn resolve_atom(&mut self, atom: TypeAtom) -> Result<TypeId> {
        match atom {
            TypeAtom::Single(ty) => Ok(ty),
            TypeAtom::Group(tys, loc) => match tys[..] {
                [] => Err(loc.wrap(Error::EmptyTupleType)),
                [ty] => Ok(ty),
                _ => Ok(self.cx.types.tuple(&tys)),
            },
        }
    }

    fn type_atom(&mut self) -> Result<TypeAtom> {
        let token = self.current;
        let ty = match token.kind {
            TokenKind::NilType => self.cx.types.nil(),
            TokenKind::IntegerType => self.cx.types.integer(),
            TokenKind::BooleanType => self.cx.types.boolean(),
            TokenKind::CharacterType => self.cx.types.character(),
            TokenKind::LParen => {
                self.advance();
                let tys = self.list(TokenKind::RParen, Parser::ty)?;
                let end = self.consume(TokenKind::RParen)?.loc;
                return Ok(TypeAtom::Group(tys, token.loc.to(end)));
            }
            TokenKind::LBracket => {
                self.advance();
                return self.array_type_rest().map(TypeAtom::Single);
            }
            TokenKind::Operator if self.lexer.text(token) == "*" => {
                self.advance();
                if self.take(TokenKind::LBracket) {
                    if self.take(TokenKind::RBracket) {
                        let atom = self.type_atom()?;
                        let element = self.resolve_atom(atom)?;
                        return Ok(TypeAtom::Single(self.cx.types.slice(element)));
                    }
                    let array = self.array_type_rest()?;
                    return Ok(TypeAtom::Single(self.cx.types.pointer(array)));
                }
                let atom = self.type_atom()?;
                let pointee = self.resolve_atom(atom)?;
                return Ok(TypeAtom::Single(self.cx.types.pointer(pointee)));
            }
            kind if kind.is_error() => return Err(self.current_error(Error::UnexpectedCharacter)),
            kind => return Err(self.current_error(Error::UnknownType(kind))),
        };
        self.advance();
        Ok(TypeAtom::Single(ty))
    }

    /// `type ';' INTEGER ']'`, after the opening bracket.
    fn array_type_rest(&mut self) -> Result<TypeId> {
        let element = self.ty()?;
        self.consume(TokenKind::Semicolon)?;
        let size_token = self.consume(TokenKind::Integer)?;
        let Ok(size) = self.lexer.text(size_token).parse::<u64>() else {
            return Err(size_token.loc.wrap(Error::IntegerOutOfBounds));
        };
        self.consume(TokenKind::RBracket)?;
        Ok(self.cx.types.array(size, element))
    }
}

impl Parser<'_, '_> {
    fn push(&mut self, kind: NodeKind, loc: Location) -> NodeId {
        self.ast.push(kind, loc)
    }

    /// Parses `item (',' item)*` until `end` is found, allowing no items at
    /// all. Does **NOT** consume the end delimiter.
    fn list<T>(
        &mut self,
        end: TokenKind,
        item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        if self.is(end) {
            return Ok(Vec::new());
        }
        self.separated(item)
    }

    /// Parses `item (',' item)*`.
    fn separated<T>(&mut self, mut item: impl FnMut(&mut Self) -> Result<T>) -> Result<Vec<T>> {
        let mut items = vec![item(self)?];
        while self.take(TokenKind::Comma) {
            items.push(item(self)?);
        }
        Ok(items)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> Token {
        let c = self.current;
        if !c.is_eof() {
            self.current = self.lexer.next_token();
        }
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.current.kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        if self.is(expect) {
            return Ok(self.advance());
        }
        let actual = self.current.kind;
        if actual.is_error() {
            return Err(self.current_error(Error::UnexpectedCharacter));
        }
        Err(self.current_error(Error::Unexpected { expected: expect, actual }))
    }

    fn current_error(&self, error: Error) -> Spanned<Error> {
        self.current.loc.wrap(error)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unexpected {
        expected: TokenKind,
        actual: TokenKind,
    },
    UnexpectedCharacter,
    /// The input ended where a top-level term was expected.
    EndOfFile,
    BadTopLevel(TokenKind),
    UnknownBasic(TokenKind),
    UnknownType(TokenKind),
    UnknownBinop(Symbol),
    UnknownUnop(Symbol),
    EmptyBlock,
    EmptyTupleType,
    IntegerOutOfBounds,
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_precedence() {
            let expr = "1 + 2 * 3";
            let tree_ok = "
                binop + (1:1..10)
                  integer 1 (1:1..2)
                  binop * (1:5..10)
                    integer 2 (1:5..6)
                    integer 3 (1:9..10)
            ";
        }

        fn test_left_associativity() {
            let expr = "a - b - c";
            let tree_ok = "
                binop - (1:1..10)
                  binop - (1:1..6)
                    variable a (1:1..2)
                    variable b (1:5..6)
                  variable c (1:9..10)
            ";
        }

        fn test_grouping_widens_location() {
            let expr = "(1 + 2) * 3";
            let tree_ok = "
                binop * (1:1..12)
                  binop + (1:1..8)
                    integer 1 (1:2..3)
                    integer 2 (1:6..7)
                  integer 3 (1:11..12)
            ";
        }

        fn test_assignment_is_right_associative() {
            let expr = "a = b = 3";
            let tree_ok = "
                assignment (1:1..10)
                  variable a (1:1..2)
                  assignment (1:5..10)
                    variable b (1:5..6)
                    integer 3 (1:9..10)
            ";
        }

        fn test_postfix_chain() {
            let expr = "f(x)[0].1";
            let tree_ok = "
                dot (1:1..10)
                  subscript (1:1..8)
                    application (1:1..5)
                      variable f (1:1..2)
                      variable x (1:3..4)
                    integer 0 (1:6..7)
                  integer 1 (1:9..10)
            ";
        }

        fn test_prefix_operators() {
            let expr = "-a + *p & !b";
            let tree_ok = "
                binop & (1:1..13)
                  binop + (1:1..8)
                    unop - (1:1..3)
                      variable a (1:2..3)
                    value-of (1:6..8)
                      variable p (1:7..8)
                  unop ! (1:11..13)
                    variable b (1:12..13)
            ";
        }

        fn test_tuple_and_array() {
            let expr = "([1, 2], (x), nil)";
            let tree_ok = "
                tuple (1:1..19)
                  array (1:2..8)
                    integer 1 (1:3..4)
                    integer 2 (1:6..7)
                  variable x (1:10..13)
                  nil (1:15..18)
            ";
        }

        fn test_bind_in_expression() {
            let expr = "x := &y";
            let tree_ok = "
                bind x (1:1..8)
                  address-of (1:6..8)
                    variable y (1:7..8)
            ";
        }

        fn test_function_with_return_type() {
            let program = "fn add(a: Integer, b: Integer) -> Integer { a + b; }";
            let tree_ok = "
                function add(a: Integer, b: Integer) -> Integer (1:1..53)
                  block (1:43..53)
                    binop + (1:45..50)
                      variable a (1:45..46)
                      variable b (1:49..50)
            ";
        }

        fn test_global_bindings() {
            let program = "var x := 1;\ny := (x, true);";
            let tree_ok = "
                bind var x (1:1..11)
                  integer 1 (1:10..11)
                bind y (2:1..15)
                  tuple (2:6..15)
                    variable x (2:7..8)
                    boolean true (2:10..14)
            ";
        }

        fn test_parameter_types() {
            let program = "fn f(p: *[]Integer, g: (Integer, Boolean) -> *[Nil; 2]) { while (true) { p; } }";
            let tree_ok = "
                function f(p: *[]Integer, g: (Integer, Boolean) -> *[Nil; 2]) (1:1..80)
                  block (1:57..80)
                    while (1:59..78)
                      boolean true (1:66..70)
                      block (1:72..78)
                        variable p (1:74..75)
            ";
        }

        fn test_else_if_chain() {
            let program = "fn main() { if (x < 1) { 1; } else if (b) { 2; } else { 3; }; }";
            let tree_ok = "
                function main() (1:1..64)
                  block (1:11..64)
                    if (1:13..61)
                      binop < (1:17..22)
                        variable x (1:17..18)
                        integer 1 (1:21..22)
                      block (1:24..30)
                        integer 1 (1:26..27)
                      if (1:36..61)
                        variable b (1:40..41)
                        block (1:43..49)
                          integer 2 (1:45..46)
                        block (1:55..61)
                          integer 3 (1:57..58)
            ";
        }

        fn test_empty_block() {
            let program = "fn main() {}";
            let expected_errors = &["1:11..13: empty block"];
        }

        fn test_missing_operand() {
            let expr = "1 + ;";
            let expected_errors = &["1:5..6: expected an expression, found `;`"];
        }

        fn test_unknown_binop() {
            let expr = "a ! b";
            let expected_errors = &["1:3..4: unknown binary operator `!`"];
        }

        fn test_unknown_unop() {
            let expr = "+x";
            let expected_errors = &["1:1..2: unknown unary operator `+`"];
        }

        fn test_integer_out_of_bounds() {
            let expr = "99999999999999999999";
            let expected_errors = &["1:1..21: integer literal out of bounds"];
        }

        fn test_bad_top_level() {
            let program = "42;";
            let expected_errors = &["1:1..3: expected a function or a binding, found integer literal"];
        }

        fn test_empty_program() {
            let program = "// nothing here";
            let expected_errors = &["1:16..16: unexpected end of file"];
        }

        fn test_missing_semicolon() {
            let program = "x := 1";
            let expected_errors = &["1:7..7: expected `;`, found end of file"];
        }

        fn test_unexpected_character() {
            let program = "fn main() { $; }";
            let expected_errors = &["1:13..14: unexpected character"];
        }

        fn test_empty_tuple_type() {
            let program = "fn f(x: ()) { x; }";
            let expected_errors = &["1:9..11: empty tuple type"];
        }
    );
}
