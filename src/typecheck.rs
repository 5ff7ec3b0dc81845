use tracing::{instrument, trace};

use crate::{
    ast::{self, Ast, Ident, NodeId, NodeKind},
    context::{Binding, Context, Storage},
    ice,
    token::{Location, Spanned},
    types::{Annotations, TypeId, TypeKind},
    util::intern::Symbol,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// The types computed for the nodes of an [`Ast`], indexed by [`NodeId`].
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<Option<TypeId>>,
}

impl TypeTable {
    fn with_len(len: usize) -> TypeTable {
        TypeTable {
            types: vec![None; len],
        }
    }

    pub fn get(&self, id: NodeId) -> Option<TypeId> {
        self.types.get(id.index()).copied().flatten()
    }

    /// Type of a node which is known to have been checked.
    pub fn of(&self, id: NodeId) -> TypeId {
        match self.get(id) {
            Some(ty) => ty,
            None => ice!("node {id:?} has no type"),
        }
    }
}

/// Typechecks a top-level term, binding the names it declares in the current
/// scope of the context.
#[instrument(level = "debug", skip_all)]
pub fn check(cx: &mut Context, ast: &Ast) -> Result<TypeTable> {
    let Some(root) = ast.root() else {
        ice!("typechecking an empty tree");
    };
    let mut checker = Checker {
        cx,
        ast,
        table: TypeTable::with_len(ast.len()),
    };
    checker.check(root)?;
    Ok(checker.table)
}

struct Checker<'cx, 'ast> {
    cx: &'cx mut Context,
    ast: &'ast Ast,
    table: TypeTable,
}

impl Checker<'_, '_> {
    /// Returns the type of a node, computing it on first request.
    fn check(&mut self, id: NodeId) -> Result<TypeId> {
        if let Some(ty) = self.table.get(id) {
            return Ok(ty);
        }
        let ty = self.infer(id)?;
        trace!(node = id.index(), ty = %self.cx.types.display(ty, &self.cx.strings), "typed");
        self.table.types[id.index()] = Some(ty);
        Ok(ty)
    }

    fn infer(&mut self, id: NodeId) -> Result<TypeId> {
        let ast = self.ast;
        let loc = ast.loc(id);
        match &ast[id].kind {
            NodeKind::Nil => Ok(self.literal(TypeKind::Nil)),
            NodeKind::Boolean(_) => Ok(self.literal(TypeKind::Boolean)),
            NodeKind::Integer(_) => Ok(self.literal(TypeKind::Integer)),
            NodeKind::Array(elements) => self.array(elements),
            NodeKind::Tuple(elements) => self.tuple(elements),
            NodeKind::Variable(name) => self.variable(*name),
            NodeKind::Bind { name, value, .. } => self.bind(*name, *value),
            NodeKind::Assignment { target, value } => self.assignment(*target, *value),
            NodeKind::Binop { op, lhs, rhs } => self.binop(*op, *lhs, *rhs),
            NodeKind::Unop { op, operand } => self.unop(*op, *operand),
            NodeKind::AddressOf(operand) => self.address_of(*operand),
            NodeKind::ValueOf(operand) => {
                let ty = self.check(*operand)?;
                match *self.cx.types.kind(ty) {
                    TypeKind::Pointer(pointee) => Ok(pointee),
                    _ => Err(self.error(*operand, Error::CannotDereferenceNonPointer(ty))),
                }
            }
            NodeKind::IfThenElse {
                test,
                then_arm,
                else_arm,
            } => self.if_then_else(*test, *then_arm, *else_arm),
            NodeKind::While { test, body } => {
                let test_ty = self.check(*test)?;
                if !self.is_boolean(test_ty) {
                    return Err(self.error(*test, Error::WhileTestTypeMismatch(test_ty)));
                }
                self.check(*body)?;
                Ok(self.cx.types.nil())
            }
            NodeKind::Block(terms) => self.scoped(|this| {
                let mut last = None;
                for term in terms.iter() {
                    last = Some(this.check(*term)?);
                }
                match last {
                    Some(ty) => Ok(this.cx.types.unqualified(ty)),
                    None => ice!("empty block at {loc}"),
                }
            }),
            NodeKind::Dot { left, right } => self.dot(*left, *right),
            NodeKind::Subscript { left, index } => self.subscript(*left, *index),
            NodeKind::Application { callee, args } => self.application(id, *callee, args),
            NodeKind::Function(function) => self.function(function),
        }
    }

    fn literal(&mut self, kind: TypeKind) -> TypeId {
        self.cx.types.intern(kind, Annotations::LITERAL)
    }

    fn array(&mut self, elements: &[NodeId]) -> Result<TypeId> {
        let Some((&first, rest)) = elements.split_first() else {
            ice!("empty array literal");
        };
        let first_ty = self.check(first)?;
        let element = self.cx.types.unqualified(first_ty);
        let mut literal = self.cx.types.is_literal(first_ty);
        for (i, &member) in rest.iter().enumerate() {
            let ty = self.check(member)?;
            if !self.cx.types.same(ty, element) {
                let error = Error::ArrayMemberTypeMismatch {
                    index: i + 1,
                    expected: element,
                    actual: ty,
                };
                return Err(self.error(member, error));
            }
            literal &= self.cx.types.is_literal(ty);
        }
        let array = self.cx.types.array(elements.len() as u64, element);
        Ok(self.literal_if(array, literal))
    }

    fn tuple(&mut self, elements: &[NodeId]) -> Result<TypeId> {
        let mut tys = Vec::with_capacity(elements.len());
        let mut literal = true;
        for &element in elements {
            let ty = self.check(element)?;
            literal &= self.cx.types.is_literal(ty);
            tys.push(self.cx.types.unqualified(ty));
        }
        let tuple = self.cx.types.tuple(&tys);
        Ok(self.literal_if(tuple, literal))
    }

    fn literal_if(&mut self, ty: TypeId, literal: bool) -> TypeId {
        if literal {
            self.cx.types.annotated(ty, Annotations::LITERAL)
        } else {
            ty
        }
    }

    fn variable(&mut self, name: Ident) -> Result<TypeId> {
        match self.cx.scopes.lookup(name.name) {
            Some(binding) => Ok(binding.ty),
            None => Err(name.loc.wrap(Error::NameNotBoundInScope(name.name))),
        }
    }

    fn bind(&mut self, name: Ident, value: NodeId) -> Result<TypeId> {
        self.ensure_unbound(name)?;
        let ty = self.check(value)?;
        let ty = self.cx.types.unqualified(ty);
        self.declare(name, ty);
        Ok(ty)
    }

    fn ensure_unbound(&self, name: Ident) -> Result<()> {
        if self.cx.scopes.lookup_local(name.name).is_some() {
            return Err(name.loc.wrap(Error::NameAlreadyBoundInScope(name.name)));
        }
        Ok(())
    }

    fn declare(&mut self, name: Ident, ty: TypeId) {
        self.declare_as(name, ty, Storage::Unresolved);
    }

    fn declare_as(&mut self, name: Ident, ty: TypeId, storage: Storage) {
        self.cx.scopes.bind(name.name, Binding { ty, storage });
    }

    /// Whether `id` is a variable naming a function declaration. Such names
    /// have no storage of their own.
    fn names_function(&self, id: NodeId) -> bool {
        let NodeKind::Variable(name) = &self.ast[id].kind else {
            return false;
        };
        self.cx
            .scopes
            .lookup(name.name)
            .is_some_and(Binding::is_function)
    }

    fn assignment(&mut self, target: NodeId, value: NodeId) -> Result<TypeId> {
        if !self.ast.is_place(target) || self.names_function(target) {
            return Err(self.error(target, Error::ValueCannotBeAssigned));
        }
        let target_ty = self.check(target)?;
        let value_ty = self.check(value)?;
        if !self.cx.types.same(target_ty, value_ty) {
            let error = Error::AssigneeTypeMismatch {
                expected: target_ty,
                actual: value_ty,
            };
            return Err(self.error(value, error));
        }
        Ok(self.cx.types.unqualified(target_ty))
    }

    fn binop(&mut self, op: Ident, lhs: NodeId, rhs: NodeId) -> Result<TypeId> {
        let left = self.check(lhs)?;
        let right = self.check(rhs)?;
        let Some(entry) = self.cx.binops.get(op.name) else {
            ice!("parsed an unregistered operator at {}", op.loc);
        };
        match entry.lookup(&mut self.cx.types, left, right) {
            Some(overload) => Ok(overload.result),
            None => {
                let loc = self.ast.loc(lhs).to(self.ast.loc(rhs));
                Err(loc.wrap(Error::OverloadDoesNotExist {
                    op: op.name,
                    left,
                    right,
                }))
            }
        }
    }

    fn unop(&mut self, op: Ident, operand: NodeId) -> Result<TypeId> {
        let ty = self.check(operand)?;
        match self.cx.unops.lookup(&mut self.cx.types, op.name, ty) {
            Some(overload) => Ok(overload.result),
            None => Err(op
                .loc
                .to(self.ast.loc(operand))
                .wrap(Error::UnopOverloadDoesNotExist { op: op.name, operand: ty })),
        }
    }

    fn address_of(&mut self, operand: NodeId) -> Result<TypeId> {
        let ty = self.check(operand)?;
        if self.cx.types.is_literal(ty) {
            return Err(self.error(operand, Error::CannotTakeAddressOfLiteral));
        }
        if self.names_function(operand) {
            return Err(self.error(operand, Error::CannotTakeAddressOfFunction));
        }
        if !self.ast.is_place(operand) {
            return Err(self.error(operand, Error::CannotTakeAddressOfTemporary));
        }
        let pointee = self.cx.types.unqualified(ty);
        Ok(self.cx.types.pointer(pointee))
    }

    fn if_then_else(&mut self, test: NodeId, then_arm: NodeId, else_arm: NodeId) -> Result<TypeId> {
        let test_ty = self.check(test)?;
        if !self.is_boolean(test_ty) {
            return Err(self.error(test, Error::CondTestExprTypeMismatch(test_ty)));
        }
        let then_ty = self.check(then_arm)?;
        let else_ty = self.check(else_arm)?;
        if !self.cx.types.same(then_ty, else_ty) {
            let error = Error::CondBodyExprTypeMismatch {
                then_ty,
                else_ty,
            };
            return Err(self.error(else_arm, error));
        }
        Ok(self.cx.types.unqualified(then_ty))
    }

    fn dot(&mut self, left: NodeId, right: NodeId) -> Result<TypeId> {
        let left_ty = self.check(left)?;
        let TypeKind::Tuple(elements) = self.cx.types.kind(left_ty) else {
            return Err(self.error(left, Error::DotLeftIsNotATuple(left_ty)));
        };
        let elements = elements.clone();
        let NodeKind::Integer(index) = self.ast[right].kind else {
            return Err(self.error(right, Error::DotRightIsNotAnInt));
        };
        self.check(right)?;
        match usize::try_from(index).ok().and_then(|i| elements.get(i)) {
            Some(&element) => Ok(element),
            None => {
                let error = Error::DotIndexOutOfRange {
                    index,
                    arity: elements.len(),
                };
                Err(self.error(right, error))
            }
        }
    }

    fn subscript(&mut self, left: NodeId, index: NodeId) -> Result<TypeId> {
        let left_ty = self.check(left)?;
        let element = match *self.cx.types.kind(left_ty) {
            TypeKind::Array { element, .. } | TypeKind::Slice(element) => element,
            _ => return Err(self.error(left, Error::SubscriptLeftIsNotSubscriptable(left_ty))),
        };
        let index_ty = self.check(index)?;
        let integer = self.cx.types.integer();
        if !self.cx.types.same(index_ty, integer) {
            return Err(self.error(index, Error::SubscriptRightIsNotAnIndex(index_ty)));
        }
        Ok(element)
    }

    fn application(&mut self, id: NodeId, callee: NodeId, args: &[NodeId]) -> Result<TypeId> {
        let callee_ty = self.check(callee)?;
        let TypeKind::Function { ret, args: params } = self.cx.types.kind(callee_ty) else {
            return Err(self.error(callee, Error::TypeCannotBeCalled(callee_ty)));
        };
        let (ret, params) = (*ret, params.clone());
        if params.len() != args.len() {
            let error = Error::ArgNumMismatch {
                expected: params.len(),
                actual: args.len(),
            };
            return Err(self.error(id, error));
        }
        for (i, (&arg, &param)) in args.iter().zip(params.iter()).enumerate() {
            let arg_ty = self.check(arg)?;
            if !self.cx.types.same(arg_ty, param) && !self.cx.types.coerces_to_slice(arg_ty, param) {
                let error = Error::ArgTypeMismatch {
                    index: i,
                    expected: param,
                    actual: arg_ty,
                };
                return Err(self.error(arg, error));
            }
        }
        Ok(ret)
    }

    fn function(&mut self, function: &ast::Function) -> Result<TypeId> {
        let ast::Function {
            name,
            params,
            ret,
            body,
        } = function;
        self.ensure_unbound(*name)?;
        if !params.is_empty() && self.cx.strings.get(name.name) == "main" {
            return Err(name.loc.wrap(Error::MainWithParameters));
        }
        let arg_tys: Vec<_> = params.iter().map(|p| p.ty).collect();

        // With a declared return type the function may refer to itself.
        let declared = ret.map(|ret| self.cx.types.function(ret, &arg_tys));
        if let Some(fn_ty) = declared {
            self.declare_as(*name, fn_ty, Storage::UnresolvedFunction);
        }

        let body_ty = self.scoped(|this| {
            for param in params.iter() {
                this.ensure_unbound(param.name)?;
                this.declare(param.name, param.ty);
            }
            this.check(*body)
        })?;

        if let Some(ret) = *ret {
            if !self.cx.types.same(body_ty, ret) {
                let error = Error::ReturnTypeMismatch {
                    expected: ret,
                    actual: body_ty,
                };
                return Err(self.error(*body, error));
            }
        }
        let fn_ty = match declared {
            Some(fn_ty) => fn_ty,
            None => {
                let ret = self.cx.types.unqualified(body_ty);
                let fn_ty = self.cx.types.function(ret, &arg_tys);
                self.declare_as(*name, fn_ty, Storage::UnresolvedFunction);
                fn_ty
            }
        };
        Ok(fn_ty)
    }
}

impl Checker<'_, '_> {
    /// Runs `f` in a new scope, which is popped whether `f` fails or not.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.cx.scopes.push();
        let result = f(self);
        self.cx.scopes.pop();
        result
    }

    fn is_boolean(&mut self, ty: TypeId) -> bool {
        let boolean = self.cx.types.boolean();
        self.cx.types.same(ty, boolean)
    }

    fn error(&self, at: NodeId, error: Error) -> Spanned<Error> {
        self.loc(at).wrap(error)
    }

    fn loc(&self, id: NodeId) -> Location {
        self.ast.loc(id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    TypeCannotBeCalled(TypeId),
    ArgNumMismatch {
        expected: usize,
        actual: usize,
    },
    ArgTypeMismatch {
        index: usize,
        expected: TypeId,
        actual: TypeId,
    },
    AssigneeTypeMismatch {
        expected: TypeId,
        actual: TypeId,
    },
    ValueCannotBeAssigned,
    NameNotBoundInScope(Symbol),
    NameAlreadyBoundInScope(Symbol),
    ArrayMemberTypeMismatch {
        index: usize,
        expected: TypeId,
        actual: TypeId,
    },
    CondTestExprTypeMismatch(TypeId),
    CondBodyExprTypeMismatch {
        then_ty: TypeId,
        else_ty: TypeId,
    },
    WhileTestTypeMismatch(TypeId),
    DotLeftIsNotATuple(TypeId),
    DotRightIsNotAnInt,
    DotIndexOutOfRange {
        index: i64,
        arity: usize,
    },
    SubscriptLeftIsNotSubscriptable(TypeId),
    SubscriptRightIsNotAnIndex(TypeId),
    OverloadDoesNotExist {
        op: Symbol,
        left: TypeId,
        right: TypeId,
    },
    UnopOverloadDoesNotExist {
        op: Symbol,
        operand: TypeId,
    },
    CannotTakeAddressOfLiteral,
    CannotTakeAddressOfTemporary,
    CannotTakeAddressOfFunction,
    MainWithParameters,
    CannotDereferenceNonPointer(TypeId),
    ReturnTypeMismatch {
        expected: TypeId,
        actual: TypeId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, util::test_utils::tree_tests};

    #[test]
    fn scopes_are_popped_when_a_nested_term_fails() {
        let cx = &mut Context::new();
        let src = "fn f(a: Integer) { if (true) { y; } else { 1; }; }";
        let terms = parser::parse_program(src, cx).unwrap();
        assert!(check(cx, &terms[0]).is_err());
        assert_eq!(cx.scopes.depth(), 1);
    }

    tree_tests!(
        use checker;

        fn test_literals_are_annotated_but_bindings_are_not() {
            let program = "x := (1, [true, false]);";
            let tree_ok = "
                bind x (1:1..24 %: (Integer, [Boolean; 2]))
                  tuple (1:6..24 %: literal (Integer, [Boolean; 2]))
                    integer 1 (1:7..8 %: literal Integer)
                    array (1:10..23 %: literal [Boolean; 2])
                      boolean true (1:11..15 %: literal Boolean)
                      boolean false (1:17..22 %: literal Boolean)
            ";
        }

        fn test_function_and_call() {
            let program = "
                fn double(n: Integer) { n * 2; }
                fn main() -> Integer { double(21); }
            ";
            let tree_ok = "
                function double(n: Integer) (1:1..33 %: (Integer) -> Integer)
                  block (1:23..33 %: Integer)
                    binop * (1:25..30 %: Integer)
                      variable n (1:25..26 %: Integer)
                      integer 2 (1:29..30 %: literal Integer)
                function main() -> Integer (2:1..37 %: () -> Integer)
                  block (2:22..37 %: Integer)
                    application (2:24..34 %: Integer)
                      variable double (2:24..30 %: (Integer) -> Integer)
                      integer 21 (2:31..33 %: literal Integer)
            ";
        }

        fn test_pointers() {
            let program = "fn main() { x := 1; p := &x; *p = 2; *p; }";
            let tree_ok = "
                function main() (1:1..43 %: () -> Integer)
                  block (1:11..43 %: Integer)
                    bind x (1:13..19 %: Integer)
                      integer 1 (1:18..19 %: literal Integer)
                    bind p (1:21..28 %: *Integer)
                      address-of (1:26..28 %: *Integer)
                        variable x (1:27..28 %: Integer)
                    assignment (1:30..36 %: Integer)
                      value-of (1:30..32 %: Integer)
                        variable p (1:31..32 %: *Integer)
                      integer 2 (1:35..36 %: literal Integer)
                    value-of (1:38..40 %: Integer)
                      variable p (1:39..40 %: *Integer)
            ";
        }

        fn test_recursion_needs_declared_return_type() {
            let program = "fn f(n: Integer) { f(n); }";
            let expected_errors = &["1:20..21: name `f` is not bound in scope"];
        }

        fn test_recursion_with_declared_return_type() {
            let program = "fn f(n: Integer) -> Integer { if (n < 1) { 0; } else { f(n - 1); } }";
            let expected_errors = &[];
        }

        fn test_return_type_mismatch() {
            let program = "fn f() -> Boolean { 1; }";
            let expected_errors = &["1:19..25: expected return type Boolean, found Integer"];
        }

        fn test_duplicate_binding() {
            let program = "fn main() { x := 1; x := 2; }";
            let expected_errors = &["1:21..22: name `x` is already bound in scope"];
        }

        fn test_shadowing_in_inner_block() {
            let program = "fn main() { x := 1; if (true) { x := false; x; } else { x := true; }; x; }";
            let expected_errors = &[];
        }

        fn test_overload_does_not_exist() {
            let program = "fn main() { 1 + true; }";
            let expected_errors = &["1:13..21: no overload of `+` for Integer and Boolean"];
        }

        fn test_unop_overload_does_not_exist() {
            let program = "fn main() { !1; }";
            let expected_errors = &["1:13..15: no overload of `!` for Integer"];
        }

        fn test_dot_index_out_of_range() {
            let program = "fn main() { t := (1, 2); t.2; }";
            let expected_errors = &["1:28..29: tuple index 2 out of range for a tuple of 2 elements"];
        }

        fn test_dot_on_non_tuple() {
            let program = "fn main() { a := [1, 2]; a.0; }";
            let expected_errors = &["1:26..27: cannot access a member of a value of type [Integer; 2]"];
        }

        fn test_dot_right_is_not_an_integer() {
            let program = "fn main() { t := (1, 2); t.x; }";
            let expected_errors = &["1:28..29: tuple member must be an integer literal"];
        }

        fn test_array_member_mismatch() {
            let program = "x := [1, 2, false];";
            let expected_errors = &["1:13..18: array member 2 has type Boolean, expected Integer"];
        }

        fn test_subscript_errors() {
            let program = "fn main() { t := (1, 2); t[0]; }";
            let expected_errors = &["1:26..27: cannot subscript a value of type (Integer, Integer)"];
        }

        fn test_subscript_index_must_be_integer() {
            let program = "fn main() { a := [1, 2]; a[true]; }";
            let expected_errors = &["1:28..32: subscript index must be an Integer, found Boolean"];
        }

        fn test_cond_test_mismatch() {
            let program = "fn main() { if (1) { 1; } else { 2; }; }";
            let expected_errors = &["1:17..18: condition must be a Boolean, found Integer"];
        }

        fn test_cond_body_mismatch() {
            let program = "fn main() { if (true) { 1; } else { false; }; }";
            let expected_errors = &["1:35..45: branches have different types: Integer and Boolean"];
        }

        fn test_while_test_mismatch() {
            let program = "fn main() { while (nil) { 1; }; }";
            let expected_errors = &["1:20..23: loop condition must be a Boolean, found Nil"];
        }

        fn test_address_of_literal() {
            let program = "fn main() { &1; }";
            let expected_errors = &["1:14..15: cannot take the address of a literal"];
        }

        fn test_address_of_temporary() {
            let program = "fn main() { x := 1; &(x + 1); }";
            let expected_errors = &["1:22..29: cannot take the address of a temporary value"];
        }

        fn test_dereference_non_pointer() {
            let program = "fn main() { x := 1; *x; }";
            let expected_errors = &["1:22..23: cannot dereference a value of type Integer"];
        }

        fn test_assignment_to_non_place() {
            let program = "fn main() { x := 1; x + 1 = 2; }";
            let expected_errors = &["1:21..26: expression cannot be assigned to"];
        }

        fn test_assignee_type_mismatch() {
            let program = "fn main() { x := 1; x = true; }";
            let expected_errors = &["1:25..29: cannot assign a value of type Boolean to Integer"];
        }

        fn test_function_name_cannot_be_assigned() {
            let program = "
                fn f() -> Integer { 1; }
                fn g() -> Integer { 2; }
                fn main() { f = g; f(); }
            ";
            let expected_errors = &["3:13..14: expression cannot be assigned to"];
        }

        fn test_address_of_function() {
            let program = "
                fn f() { 1; }
                fn main() { &f; }
            ";
            let expected_errors = &["2:14..15: cannot take the address of a function"];
        }

        fn test_main_cannot_take_parameters() {
            let program = "fn main(x: Integer) { 7; }";
            let expected_errors = &["1:4..8: `main` cannot take parameters"];
        }

        fn test_call_errors() {
            let program = "
                fn f(a: Integer) { a; }
                fn main() { f(1, 2); f(true); 1(2); }
            ";
            let expected_errors = &["2:13..20: expected 1 arguments, found 2"];
        }

        fn test_argument_type_mismatch() {
            let program = "
                fn f(a: Integer) { a; }
                fn main() { f(true); }
            ";
            let expected_errors = &["2:15..19: argument 0 has type Boolean, expected Integer"];
        }

        fn test_type_cannot_be_called() {
            let program = "fn main() { 1(2); }";
            let expected_errors = &["1:13..14: a value of type Integer cannot be called"];
        }

        fn test_array_pointer_coerces_to_slice() {
            let program = "
                fn first(s: *[]Integer) -> Integer { s[0]; }
                fn main() -> Integer { a := [4, 5]; first(&a); }
            ";
            let expected_errors = &[];
        }

        fn test_errors_are_batched_across_terms() {
            let program = "
                x := y;
                fn main() { 1 + true; }
            ";
            let expected_errors = &[
                "1:6..7: name `y` is not bound in scope",
                "2:13..21: no overload of `+` for Integer and Boolean",
            ];
        }

        fn test_function_values_in_variables_are_assignable() {
            let program = "
                fn f() -> Integer { 1; }
                fn g() -> Integer { 2; }
                fn main() { var h := f; h = g; }
            ";
            let expected_errors = &[];
        }
    );
}
