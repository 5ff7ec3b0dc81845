#![allow(clippy::items_after_statements)]

use crate::{codegen, parser, token::Spanned, typecheck, types::TypeId, util::fmt::Show};

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &super::Context<'_>) -> std::fmt::Result {
        let s = ctx.strings;
        let Spanned { loc, inner: error } = self;

        if f.alternate() {
            write!(f, "{loc}: ")?;
        }

        use parser::Error::*;
        match error {
            Unexpected { expected, actual } => write!(f, "expected {expected}, found {actual}"),
            UnexpectedCharacter => write!(f, "unexpected character"),
            EndOfFile => write!(f, "unexpected end of file"),
            BadTopLevel(actual) => write!(f, "expected a function or a binding, found {actual}"),
            UnknownBasic(actual) => write!(f, "expected an expression, found {actual}"),
            UnknownType(actual) => write!(f, "expected a type, found {actual}"),
            UnknownBinop(op) => write!(f, "unknown binary operator `{}`", s.get(*op)),
            UnknownUnop(op) => write!(f, "unknown unary operator `{}`", s.get(*op)),
            EmptyBlock => write!(f, "empty block"),
            EmptyTupleType => write!(f, "empty tuple type"),
            IntegerOutOfBounds => write!(f, "integer literal out of bounds"),
        }
    }
}

impl Show for Spanned<typecheck::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &super::Context<'_>) -> std::fmt::Result {
        let s = ctx.strings;
        let ty = |t: TypeId| ctx.types.display(t, s);
        let Spanned { loc, inner: error } = self;

        if f.alternate() {
            write!(f, "{loc}: ")?;
        }

        use typecheck::Error::*;
        match *error {
            TypeCannotBeCalled(callee) => {
                write!(f, "a value of type {} cannot be called", ty(callee))
            }
            ArgNumMismatch { expected, actual } => {
                write!(f, "expected {expected} arguments, found {actual}")
            }
            ArgTypeMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "argument {index} has type {}, expected {}",
                ty(actual),
                ty(expected)
            ),
            AssigneeTypeMismatch { expected, actual } => write!(
                f,
                "cannot assign a value of type {} to {}",
                ty(actual),
                ty(expected)
            ),
            ValueCannotBeAssigned => write!(f, "expression cannot be assigned to"),
            NameNotBoundInScope(name) => {
                write!(f, "name `{}` is not bound in scope", s.get(name))
            }
            NameAlreadyBoundInScope(name) => {
                write!(f, "name `{}` is already bound in scope", s.get(name))
            }
            ArrayMemberTypeMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "array member {index} has type {}, expected {}",
                ty(actual),
                ty(expected)
            ),
            CondTestExprTypeMismatch(test) => {
                write!(f, "condition must be a Boolean, found {}", ty(test))
            }
            CondBodyExprTypeMismatch { then_ty, else_ty } => write!(
                f,
                "branches have different types: {} and {}",
                ty(then_ty),
                ty(else_ty)
            ),
            WhileTestTypeMismatch(test) => {
                write!(f, "loop condition must be a Boolean, found {}", ty(test))
            }
            DotLeftIsNotATuple(left) => {
                write!(f, "cannot access a member of a value of type {}", ty(left))
            }
            DotRightIsNotAnInt => write!(f, "tuple member must be an integer literal"),
            DotIndexOutOfRange { index, arity } => write!(
                f,
                "tuple index {index} out of range for a tuple of {arity} elements"
            ),
            SubscriptLeftIsNotSubscriptable(left) => {
                write!(f, "cannot subscript a value of type {}", ty(left))
            }
            SubscriptRightIsNotAnIndex(index) => {
                write!(f, "subscript index must be an Integer, found {}", ty(index))
            }
            OverloadDoesNotExist { op, left, right } => write!(
                f,
                "no overload of `{}` for {} and {}",
                s.get(op),
                ty(left),
                ty(right)
            ),
            UnopOverloadDoesNotExist { op, operand } => {
                write!(f, "no overload of `{}` for {}", s.get(op), ty(operand))
            }
            CannotTakeAddressOfLiteral => write!(f, "cannot take the address of a literal"),
            CannotTakeAddressOfTemporary => {
                write!(f, "cannot take the address of a temporary value")
            }
            CannotTakeAddressOfFunction => write!(f, "cannot take the address of a function"),
            MainWithParameters => write!(f, "`main` cannot take parameters"),
            CannotDereferenceNonPointer(operand) => {
                write!(f, "cannot dereference a value of type {}", ty(operand))
            }
            ReturnTypeMismatch { expected, actual } => write!(
                f,
                "expected return type {}, found {}",
                ty(expected),
                ty(actual)
            ),
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, _ctx: &super::Context<'_>) -> std::fmt::Result {
        let Spanned { loc, inner: error } = self;

        if f.alternate() {
            write!(f, "{loc}: ")?;
        }

        use codegen::Error::*;
        match error {
            NonConstGlobalInitializer => {
                write!(f, "global initializer must be a constant expression")
            }
            NonConstArrayInitializer => {
                write!(f, "array members in a global initializer must be constant")
            }
            NonConstTupleInitializer => {
                write!(f, "tuple members in a global initializer must be constant")
            }
        }
    }
}
