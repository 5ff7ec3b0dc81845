use std::io::Write;

use crate::{
    ast::{Ast, NodeId, NodeKind},
    typecheck::TypeTable,
    types::TypeId,
    util::fmt::Context,
};

const INDENT_WIDTH: usize = 2;

/// Prints the tree of a single term. If a [`TypeTable`] is provided, the type
/// of each node is printed next to its location.
pub fn print_ast_string(ctx: &Context<'_>, ast: &Ast, types: Option<&TypeTable>) -> String {
    let mut buf = Vec::with_capacity(512);
    print_ast(&mut buf, ctx, ast, types).expect("writing to a Vec never fails");
    String::from_utf8(buf).expect("the tree printer only writes UTF-8")
}

pub fn print_ast(
    w: &mut impl Write,
    ctx: &Context<'_>,
    ast: &Ast,
    types: Option<&TypeTable>,
) -> std::io::Result<()> {
    let Some(root) = ast.root() else {
        return Ok(());
    };
    Printer { ctx, ast, types }.node(w, 0, root)
}

struct Printer<'a> {
    ctx: &'a Context<'a>,
    ast: &'a Ast,
    types: Option<&'a TypeTable>,
}

impl Printer<'_> {
    fn node(&self, w: &mut impl Write, i: usize, id: NodeId) -> std::io::Result<()> {
        let s = self.ctx.strings;
        let info = self.info(id);
        let loc = self.ast.loc(id);
        sp(w, i)?;
        match &self.ast[id].kind {
            NodeKind::Nil => writeln!(w, "nil ({loc}{info})")?,
            NodeKind::Boolean(value) => writeln!(w, "boolean {value} ({loc}{info})")?,
            NodeKind::Integer(value) => writeln!(w, "integer {value} ({loc}{info})")?,
            NodeKind::Array(elements) => {
                writeln!(w, "array ({loc}{info})")?;
                self.nodes(w, i + 1, elements)?;
            }
            NodeKind::Tuple(elements) => {
                writeln!(w, "tuple ({loc}{info})")?;
                self.nodes(w, i + 1, elements)?;
            }
            NodeKind::Variable(name) => {
                writeln!(w, "variable {} ({loc}{info})", s.get(name.name))?;
            }
            NodeKind::Bind {
                name,
                mutable,
                value,
            } => {
                let var = if *mutable { "var " } else { "" };
                writeln!(w, "bind {var}{} ({loc}{info})", s.get(name.name))?;
                self.node(w, i + 1, *value)?;
            }
            NodeKind::Assignment { target, value } => {
                writeln!(w, "assignment ({loc}{info})")?;
                self.nodes(w, i + 1, &[*target, *value])?;
            }
            NodeKind::Binop { op, lhs, rhs } => {
                writeln!(w, "binop {} ({loc}{info})", s.get(op.name))?;
                self.nodes(w, i + 1, &[*lhs, *rhs])?;
            }
            NodeKind::Unop { op, operand } => {
                writeln!(w, "unop {} ({loc}{info})", s.get(op.name))?;
                self.node(w, i + 1, *operand)?;
            }
            NodeKind::AddressOf(operand) => {
                writeln!(w, "address-of ({loc}{info})")?;
                self.node(w, i + 1, *operand)?;
            }
            NodeKind::ValueOf(operand) => {
                writeln!(w, "value-of ({loc}{info})")?;
                self.node(w, i + 1, *operand)?;
            }
            NodeKind::IfThenElse {
                test,
                then_arm,
                else_arm,
            } => {
                writeln!(w, "if ({loc}{info})")?;
                self.nodes(w, i + 1, &[*test, *then_arm, *else_arm])?;
            }
            NodeKind::While { test, body } => {
                writeln!(w, "while ({loc}{info})")?;
                self.nodes(w, i + 1, &[*test, *body])?;
            }
            NodeKind::Block(terms) => {
                writeln!(w, "block ({loc}{info})")?;
                self.nodes(w, i + 1, terms)?;
            }
            NodeKind::Dot { left, right } => {
                writeln!(w, "dot ({loc}{info})")?;
                self.nodes(w, i + 1, &[*left, *right])?;
            }
            NodeKind::Subscript { left, index } => {
                writeln!(w, "subscript ({loc}{info})")?;
                self.nodes(w, i + 1, &[*left, *index])?;
            }
            NodeKind::Application { callee, args } => {
                writeln!(w, "application ({loc}{info})")?;
                self.node(w, i + 1, *callee)?;
                self.nodes(w, i + 1, args)?;
            }
            NodeKind::Function(function) => {
                write!(w, "function {}(", s.get(function.name.name))?;
                for (idx, param) in function.params.iter().enumerate() {
                    if idx > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{}: {}", s.get(param.name.name), self.ty(param.ty))?;
                }
                write!(w, ")")?;
                if let Some(ret) = function.ret {
                    write!(w, " -> {}", self.ty(ret))?;
                }
                writeln!(w, " ({loc}{info})")?;
                self.node(w, i + 1, function.body)?;
            }
        }
        Ok(())
    }

    fn nodes(&self, w: &mut impl Write, i: usize, ids: &[NodeId]) -> std::io::Result<()> {
        for id in ids {
            self.node(w, i, *id)?;
        }
        Ok(())
    }

    fn ty(&self, ty: TypeId) -> impl std::fmt::Display + '_ {
        self.ctx.types.display(ty, self.ctx.strings)
    }

    /// Inferred type, for typed trees.
    fn info(&self, id: NodeId) -> String {
        let Some(ty) = self.types.and_then(|types| types.get(id)) else {
            return String::new();
        };
        let literal = if self.ctx.types.is_literal(ty) {
            "literal "
        } else {
            ""
        };
        format!(" %: {literal}{}", self.ty(ty))
    }
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
