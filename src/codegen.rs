//! Lowering of typed trees into the IR of [`crate::ir`].
//!
//! Values of aggregate types (arrays, tuples and slices) never live in
//! registers: an expression of aggregate type always evaluates to the address
//! of its storage, and aggregates are copied element by element. Scalars are
//! loaded from their storage unless the address itself is requested through
//! [`EvalMode::Address`].

use tracing::{debug, instrument, trace};

use crate::{
    ast::{self, Ast, NodeId, NodeKind},
    context::{Binding, Context, Storage},
    ice,
    ir::{
        interp::OUT_OF_BOUNDS_EXIT_CODE, verify, BinaryOp, BlockId, Constant, FuncId, Function,
        FunctionBuilder, IcmpPred, IrType, Module, Value,
    },
    token::Spanned,
    typecheck::TypeTable,
    types::{TypeId, TypeInterner, TypeKind},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// What the caller of [`Codegen::expr`] wants out of an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EvalMode {
    /// The value of the expression. Scalars are loaded from their storage.
    Value,
    /// The address of the storage holding the value of the expression.
    Address,
}

/// Emits the code of a typechecked top-level term into `module`, binding the
/// names it declares in the current scope of the context.
#[instrument(level = "debug", skip_all)]
pub fn codegen(cx: &mut Context, module: &mut Module, ast: &Ast, types: &TypeTable) -> Result<Value> {
    let Some(root) = ast.root() else {
        ice!("generating code for an empty tree");
    };
    let mut codegen = Codegen {
        cx,
        module,
        ast,
        types,
        cursor: None,
    };
    codegen.top(root)
}

/// Representation of a language type in the IR.
pub fn lower_type(types: &TypeInterner, ty: TypeId) -> IrType {
    match types.kind(ty) {
        TypeKind::Nil | TypeKind::Boolean => IrType::I1,
        TypeKind::Integer => IrType::I64,
        TypeKind::Character => IrType::I8,
        TypeKind::Void => IrType::Void,
        TypeKind::Pointer(_) | TypeKind::Function { .. } => IrType::Ptr,
        TypeKind::Slice(_) => slice_type(),
        TypeKind::Array { size, element } => {
            IrType::Array(*size, Box::new(lower_type(types, *element)))
        }
        TypeKind::Tuple(elements) => IrType::Struct(
            elements
                .iter()
                .map(|element| lower_type(types, *element))
                .collect(),
        ),
        TypeKind::TypeVariable(_) => ice!("unsubstituted type variable reached codegen"),
    }
}

/// A slice is a pointer to its first element followed by its length.
fn slice_type() -> IrType {
    IrType::Struct(Box::new([IrType::Ptr, IrType::I64]))
}

struct Codegen<'a> {
    cx: &'a mut Context,
    module: &'a mut Module,
    ast: &'a Ast,
    types: &'a TypeTable,
    /// The function and block being emitted into, if any.
    cursor: Option<(FuncId, BlockId)>,
}

impl Codegen<'_> {
    fn top(&mut self, id: NodeId) -> Result<Value> {
        let ast = self.ast;
        match &ast[id].kind {
            NodeKind::Function(function) => self.function(id, function),
            NodeKind::Bind { name, value, .. } => {
                let init = self.const_eval(*value, Error::NonConstGlobalInitializer)?;
                let global = self.module.add_global(self.cx.strings.get(name.name), init);
                trace!(name = self.cx.strings.get(name.name), "emitted global");
                let binding = Binding {
                    ty: self.types.of(id),
                    storage: Storage::Global(global),
                };
                self.cx.scopes.bind(name.name, binding);
                Ok(Value::Global(global))
            }
            _ => ice!("unexpected top-level term at {}", ast.loc(id)),
        }
    }

    fn expr(&mut self, id: NodeId, mode: EvalMode) -> Result<Value> {
        let ty = self.types.of(id);
        let ast = self.ast;
        let value = match &ast[id].kind {
            NodeKind::Nil => Value::bool(false),
            NodeKind::Boolean(value) => Value::bool(*value),
            NodeKind::Integer(value) => Value::i64(*value),
            NodeKind::Array(elements) | NodeKind::Tuple(elements) => self.aggregate(ty, elements)?,
            NodeKind::Variable(name) => {
                let Some(binding) = self.cx.scopes.lookup(name.name) else {
                    ice!("name bound during typechecking is missing at {}", name.loc);
                };
                let ptr = match binding.storage.clone() {
                    Storage::Local(ptr) => ptr,
                    Storage::Global(global) => Value::Global(global),
                    Storage::Function(func) => return Ok(self.rvalue(mode, ty, Value::Func(func))),
                    Storage::Unresolved | Storage::UnresolvedFunction => {
                        ice!("unresolved binding at {}", name.loc)
                    }
                };
                return Ok(self.place(mode, ty, ptr));
            }
            NodeKind::Bind { name, value, .. } => {
                let storage = self.local(*value)?;
                let binding = Binding {
                    ty,
                    storage: Storage::Local(storage.clone()),
                };
                self.cx.scopes.bind(name.name, binding);
                return Ok(self.place(mode, ty, storage));
            }
            NodeKind::Assignment { target, value } => {
                let ptr = self.expr(*target, EvalMode::Address)?;
                let value = self.expr(*value, EvalMode::Value)?;
                self.store_typed(ty, value.clone(), ptr.clone());
                if self.is_aggregate(ty) {
                    ptr
                } else {
                    value
                }
            }
            NodeKind::Binop { op, lhs, rhs } => {
                let (left, right) = (self.types.of(*lhs), self.types.of(*rhs));
                let lhs = self.expr(*lhs, EvalMode::Value)?;
                let rhs = self.expr(*rhs, EvalMode::Value)?;
                let Some(overload) = self.cx.binops.lookup(&mut self.cx.types, op.name, left, right)
                else {
                    ice!("binary overload missing at {}", op.loc);
                };
                (overload.lower)(&mut self.builder(), lhs, rhs)
            }
            NodeKind::Unop { op, operand } => {
                let operand_ty = self.types.of(*operand);
                let operand = self.expr(*operand, EvalMode::Value)?;
                let Some(overload) = self.cx.unops.lookup(&mut self.cx.types, op.name, operand_ty)
                else {
                    ice!("unary overload missing at {}", op.loc);
                };
                (overload.lower)(&mut self.builder(), operand)
            }
            NodeKind::AddressOf(operand) => self.expr(*operand, EvalMode::Address)?,
            NodeKind::ValueOf(operand) => {
                let ptr = self.expr(*operand, EvalMode::Value)?;
                return Ok(self.place(mode, ty, ptr));
            }
            NodeKind::IfThenElse {
                test,
                then_arm,
                else_arm,
            } => self.if_then_else(ty, *test, *then_arm, *else_arm)?,
            NodeKind::While { test, body } => self.while_loop(*test, *body)?,
            NodeKind::Block(terms) => self.scoped(|this| {
                let mut last = None;
                for term in terms.iter() {
                    last = Some(this.expr(*term, EvalMode::Value)?);
                }
                match last {
                    Some(value) => Ok(value),
                    None => ice!("empty block at {}", ast.loc(id)),
                }
            })?,
            NodeKind::Dot { left, right } => {
                let NodeKind::Integer(index) = ast[*right].kind else {
                    ice!("non-literal tuple member at {}", ast.loc(*right));
                };
                let tuple = self.lower(self.types.of(*left));
                let base = self.expr(*left, EvalMode::Address)?;
                let ptr = self.builder().member_gep(tuple, base, Value::i64(index));
                return Ok(self.place(mode, ty, ptr));
            }
            NodeKind::Subscript { left, index } => {
                let ptr = self.subscript(*left, *index)?;
                return Ok(self.place(mode, ty, ptr));
            }
            NodeKind::Application { callee, args } => self.application(*callee, args)?,
            NodeKind::Function(_) => ice!("nested function at {}", ast.loc(id)),
        };
        Ok(self.rvalue(mode, ty, value))
    }

    /// Result of an expression which is not a place: scalars are spilled into
    /// a fresh slot if their address is requested.
    fn rvalue(&mut self, mode: EvalMode, ty: TypeId, value: Value) -> Value {
        if mode == EvalMode::Value || self.is_aggregate(ty) {
            return value;
        }
        let lowered = self.lower(ty);
        let mut b = self.builder();
        let slot = b.alloca(lowered);
        b.store(value, slot.clone());
        slot
    }

    /// Result of an expression denoting the storage at `ptr`.
    fn place(&mut self, mode: EvalMode, ty: TypeId, ptr: Value) -> Value {
        if mode == EvalMode::Address || self.is_aggregate(ty) {
            return ptr;
        }
        let lowered = self.lower(ty);
        self.builder().load(lowered, ptr)
    }

    /// Materializes the storage of a local binding.
    fn local(&mut self, value: NodeId) -> Result<Value> {
        let ty = self.types.of(value);
        let lowered = self.lower(ty);
        let result = self.expr(value, EvalMode::Value)?;
        // Literals and call results are fresh temporaries, owned by nobody else.
        let fresh = matches!(
            self.ast[value].kind,
            NodeKind::Array(_) | NodeKind::Tuple(_) | NodeKind::Application { .. }
        );
        if self.is_aggregate(ty) && fresh {
            return Ok(result);
        }
        let slot = self.builder().alloca(lowered);
        self.store_typed(ty, result, slot.clone());
        Ok(slot)
    }

    fn aggregate(&mut self, ty: TypeId, elements: &[NodeId]) -> Result<Value> {
        let lowered = self.lower(ty);
        let slot = self.builder().alloca(lowered.clone());
        for (i, &element) in elements.iter().enumerate() {
            let element_ty = self.types.of(element);
            let value = self.expr(element, EvalMode::Value)?;
            let ptr = self
                .builder()
                .member_gep(lowered.clone(), slot.clone(), Value::i64(i as i64));
            self.store_typed(element_ty, value, ptr);
        }
        Ok(slot)
    }

    fn if_then_else(
        &mut self,
        ty: TypeId,
        test: NodeId,
        then_arm: NodeId,
        else_arm: NodeId,
    ) -> Result<Value> {
        let cond = self.expr(test, EvalMode::Value)?;
        let mut b = self.builder();
        let (then_block, else_block, merge) = (b.create_block(), b.create_block(), b.create_block());
        b.cond_br(cond, then_block, else_block);

        self.enter(then_block);
        let then_value = self.expr(then_arm, EvalMode::Value)?;
        let then_end = self.builder().current_block();
        self.builder().br(merge);

        self.enter(else_block);
        let else_value = self.expr(else_arm, EvalMode::Value)?;
        let else_end = self.builder().current_block();
        self.builder().br(merge);

        self.enter(merge);
        let phi_ty = if self.is_aggregate(ty) {
            IrType::Ptr
        } else {
            self.lower(ty)
        };
        let incoming = vec![(then_value, then_end), (else_value, else_end)];
        Ok(self.builder().phi(phi_ty, incoming))
    }

    fn while_loop(&mut self, test: NodeId, body: NodeId) -> Result<Value> {
        let mut b = self.builder();
        let (test_block, body_block, end) = (b.create_block(), b.create_block(), b.create_block());
        b.br(test_block);

        self.enter(test_block);
        let cond = self.expr(test, EvalMode::Value)?;
        self.builder().cond_br(cond, body_block, end);

        self.enter(body_block);
        self.expr(body, EvalMode::Value)?;
        self.builder().br(test_block);

        self.enter(end);
        Ok(Value::bool(false))
    }

    /// Computes the address of a subscripted element, checking the index
    /// against the length of the array or slice.
    fn subscript(&mut self, left: NodeId, index: NodeId) -> Result<Value> {
        let left_ty = self.types.of(left);
        let base = self.expr(left, EvalMode::Address)?;
        let index = self.expr(index, EvalMode::Value)?;
        match *self.cx.types.kind(left_ty) {
            TypeKind::Array { size, .. } => {
                let array = self.lower(left_ty);
                self.bounds_check(index.clone(), Value::i64(size as i64));
                Ok(self.builder().gep(array, base, vec![Value::i64(0), index]))
            }
            TypeKind::Slice(element) => {
                let element = self.lower(element);
                let mut b = self.builder();
                let data = b.member_gep(slice_type(), base.clone(), Value::i64(0));
                let data = b.load(IrType::Ptr, data);
                let len = b.member_gep(slice_type(), base, Value::i64(1));
                let len = b.load(IrType::I64, len);
                self.bounds_check(index.clone(), len);
                Ok(self.builder().gep(element, data, vec![index]))
            }
            _ => ice!("subscript of a non-subscriptable type"),
        }
    }

    /// Exits the program with [`OUT_OF_BOUNDS_EXIT_CODE`] unless
    /// `0 <= index < len`.
    fn bounds_check(&mut self, index: Value, len: Value) {
        let mut b = self.builder();
        let negative = b.icmp(IcmpPred::Slt, index.clone(), Value::i64(0));
        let beyond = b.icmp(IcmpPred::Sge, index, len);
        let out_of_bounds = b.binary(BinaryOp::Or, negative, beyond);
        let (fail, ok) = (b.create_block(), b.create_block());
        b.cond_br(out_of_bounds, fail, ok);

        self.enter(fail);
        self.builder().exit(Value::i64(OUT_OF_BOUNDS_EXIT_CODE));
        self.enter(ok);
    }

    fn application(&mut self, callee: NodeId, args: &[NodeId]) -> Result<Value> {
        let TypeKind::Function { ret, args: params } =
            self.cx.types.kind(self.types.of(callee)).clone()
        else {
            ice!("call of a non-function at {}", self.ast.loc(callee));
        };
        let callee = self.expr(callee, EvalMode::Value)?;
        let sret = self.is_aggregate(ret);

        let mut values = Vec::with_capacity(args.len() + 1);
        let result_slot = if sret {
            let lowered = self.lower(ret);
            let slot = self.builder().alloca(lowered);
            values.push(slot.clone());
            Some(slot)
        } else {
            None
        };
        for (&arg, &param) in args.iter().zip(params.iter()) {
            let arg_ty = self.types.of(arg);
            let value = self.expr(arg, EvalMode::Value)?;
            let value = if self.cx.types.coerces_to_slice(arg_ty, param) {
                self.slice_of_array(arg_ty, value)
            } else {
                value
            };
            values.push(value);
        }

        let ret = if sret { IrType::Void } else { self.lower(ret) };
        let result = self.builder().call(callee, values, ret, sret);
        Ok(result_slot.unwrap_or(result))
    }

    /// Builds a slice covering the whole array pointed to by `ptr`.
    fn slice_of_array(&mut self, ptr_ty: TypeId, ptr: Value) -> Value {
        let &TypeKind::Pointer(array) = self.cx.types.kind(ptr_ty) else {
            ice!("slice of a non-pointer");
        };
        let &TypeKind::Array { size, .. } = self.cx.types.kind(array) else {
            ice!("slice of a pointer to a non-array");
        };
        let mut b = self.builder();
        let slot = b.alloca(slice_type());
        let data = b.member_gep(slice_type(), slot.clone(), Value::i64(0));
        b.store(ptr, data);
        let len = b.member_gep(slice_type(), slot.clone(), Value::i64(1));
        b.store(Value::i64(size as i64), len);
        slot
    }

    fn function(&mut self, id: NodeId, function: &ast::Function) -> Result<Value> {
        let fn_ty = self.types.of(id);
        let TypeKind::Function { ret, args } = self.cx.types.kind(fn_ty).clone() else {
            ice!("function without a function type at {}", self.ast.loc(id));
        };
        let name = self.cx.strings.get(function.name.name).to_owned();
        let is_main = name == "main";
        let sret = !is_main && self.is_aggregate(ret);

        let mut params = Vec::with_capacity(args.len() + 1);
        if sret {
            params.push(IrType::Ptr);
        }
        for &arg in args.iter() {
            params.push(if self.is_aggregate(arg) {
                IrType::Ptr
            } else {
                self.lower(arg)
            });
        }
        let ir_ret = if is_main || sret {
            IrType::Void
        } else {
            self.lower(ret)
        };
        let func = self
            .module
            .add_function(Function::new(name.clone(), params, ir_ret, sret));
        let binding = Binding {
            ty: fn_ty,
            storage: Storage::Function(func),
        };
        self.cx.scopes.bind(function.name.name, binding);

        let mut b = FunctionBuilder::new(self.module, func);
        let entry = b.create_block();
        b.append_block(entry);

        let saved = self.cursor.replace((func, entry));
        let result = self.scoped(|this| this.function_body(function, &args, ret, is_main, sret));
        self.cursor = saved;
        result?;

        if let Err(error) = verify::verify_function(self.module, func) {
            ice!("emitted invalid IR for `{name}`: {error}");
        }
        debug!(function = %name, sret, "emitted function");
        Ok(Value::Func(func))
    }

    fn function_body(
        &mut self,
        function: &ast::Function,
        args: &[TypeId],
        ret: TypeId,
        is_main: bool,
        sret: bool,
    ) -> Result<()> {
        // Every parameter gets a slot, so that its address may be taken.
        let first = u32::from(sret);
        for (i, (param, &ty)) in function.params.iter().zip(args).enumerate() {
            let lowered = self.lower(ty);
            let incoming = self.builder().param(first + i as u32);
            let slot = self.builder().alloca(lowered);
            self.store_typed(ty, incoming, slot.clone());
            let binding = Binding {
                ty,
                storage: Storage::Local(slot),
            };
            self.cx.scopes.bind(param.name.name, binding);
        }

        let value = self.expr(function.body, EvalMode::Value)?;
        if is_main {
            let body_ty = self.types.of(function.body);
            let code = if matches!(self.cx.types.kind(body_ty), TypeKind::Integer) {
                value
            } else if matches!(self.cx.types.kind(body_ty), TypeKind::Boolean) {
                self.builder().zext(value, IrType::I64)
            } else {
                Value::i64(0)
            };
            self.builder().exit(code);
        } else if sret {
            let lowered = self.lower(ret);
            let out = self.builder().param(0);
            self.copy(&lowered, out, value);
            self.builder().ret(None);
        } else {
            self.builder().ret(Some(value));
        }
        Ok(())
    }

    /// Evaluates a global initializer at compile time. Only literals are
    /// constant.
    fn const_eval(&mut self, id: NodeId, error: Error) -> Result<Constant> {
        let ast = self.ast;
        Ok(match &ast[id].kind {
            NodeKind::Nil => Constant::bool(false),
            NodeKind::Boolean(value) => Constant::bool(*value),
            NodeKind::Integer(value) => Constant::i64(*value),
            NodeKind::Array(elements) => {
                let members = elements
                    .iter()
                    .map(|element| self.const_eval(*element, Error::NonConstArrayInitializer))
                    .collect::<Result<_>>()?;
                Constant::Aggregate(self.lower(self.types.of(id)), members)
            }
            NodeKind::Tuple(elements) => {
                let members = elements
                    .iter()
                    .map(|element| self.const_eval(*element, Error::NonConstTupleInitializer))
                    .collect::<Result<_>>()?;
                Constant::Aggregate(self.lower(self.types.of(id)), members)
            }
            _ => return Err(ast.loc(id).wrap(error)),
        })
    }
}

impl Codegen<'_> {
    /// Runs `f` in a new scope, which is popped whether `f` fails or not.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.cx.scopes.push();
        let result = f(self);
        self.cx.scopes.pop();
        result
    }

    fn builder(&mut self) -> FunctionBuilder<'_> {
        let Some((func, block)) = self.cursor else {
            ice!("emitting code outside of a function");
        };
        FunctionBuilder::at(self.module, func, block)
    }

    /// Appends `block` to the current function and continues emitting there.
    fn enter(&mut self, block: BlockId) {
        let mut b = self.builder();
        b.append_block(block);
        b.position_at_end(block);
        let func = b.func_id();
        self.cursor = Some((func, block));
    }

    fn lower(&self, ty: TypeId) -> IrType {
        lower_type(&self.cx.types, ty)
    }

    fn is_aggregate(&self, ty: TypeId) -> bool {
        self.cx.types.is_aggregate(ty)
    }

    /// Stores a value of type `ty`, which for aggregates is the address of
    /// their storage.
    fn store_typed(&mut self, ty: TypeId, value: Value, ptr: Value) {
        if self.is_aggregate(ty) {
            let lowered = self.lower(ty);
            self.copy(&lowered, ptr, value);
        } else {
            self.builder().store(value, ptr);
        }
    }

    /// Copies a value of type `ty` from `src` to `dst`, one scalar at a time.
    fn copy(&mut self, ty: &IrType, dst: Value, src: Value) {
        let len = match ty {
            IrType::Array(n, _) => *n,
            IrType::Struct(fields) => fields.len() as u64,
            scalar => {
                let mut b = self.builder();
                let value = b.load(scalar.clone(), src);
                b.store(value, dst);
                return;
            }
        };
        for i in 0..len {
            let Some((member, _)) = ty.step(i as i64) else {
                ice!("cannot step into {ty}");
            };
            let index = vec![Value::i64(0), Value::i64(i as i64)];
            let mut b = self.builder();
            let dst = b.gep(ty.clone(), dst.clone(), index.clone());
            let src = b.gep(ty.clone(), src.clone(), index);
            self.copy(member, dst, src);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    NonConstGlobalInitializer,
    NonConstArrayInitializer,
    NonConstTupleInitializer,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{unit::CompilationUnit, util::test_utils::tree_tests};

    #[test]
    fn scopes_are_balanced_after_a_failed_term() {
        let src = "fn f(a: Integer) { if (a < 1) { a; } else { 1; }; }\nx := 1;\ny := [x];";
        let mut unit = CompilationUnit::new("scopes", src);
        assert!(unit.compile().is_err());
        assert_eq!(unit.context().scopes.depth(), 1);
    }

    #[test]
    fn lowers_types() {
        let t = &mut TypeInterner::default();
        let int = t.integer();
        let boolean = t.boolean();
        let pair = t.tuple(&[int, boolean]);
        let array = t.array(3, pair);
        let slice = t.slice(int);
        let function = t.function(int, &[slice]);

        assert_eq!(lower_type(t, int), IrType::I64);
        assert_eq!(lower_type(t, boolean), IrType::I1);
        assert_eq!(
            lower_type(t, array),
            IrType::Array(
                3,
                Box::new(IrType::Struct(Box::new([IrType::I64, IrType::I1])))
            )
        );
        assert_eq!(lower_type(t, slice), slice_type());
        assert_eq!(lower_type(t, function), IrType::Ptr);
    }

    tree_tests!(
        use run;

        fn test_integer_exit_code() {
            let program = "fn main() { 42; }";
            let exit_code = 42;
        }

        fn test_boolean_exit_code() {
            let program = "fn main() { 1 < 2; }";
            let exit_code = 1;
        }

        fn test_non_integer_main_exits_with_zero() {
            let program = "fn main() { (1, 2); }";
            let exit_code = 0;
        }

        fn test_arithmetic_on_locals() {
            let program = "fn main() { a := 3; b := 4; a * b - a / 2 % 5; }";
            let exit_code = 11;
        }

        fn test_unary_operators() {
            let program = "fn main() { a := -5; if (!(a < 0)) { 1; } else { 0 - a; }; }";
            let exit_code = 5;
        }

        fn test_while_loop() {
            let program = "
                fn main() {
                    var i := 0;
                    var sum := 0;
                    while (i < 10) { i = i + 1; sum = sum + i; };
                    sum;
                }
            ";
            let exit_code = 55;
        }

        fn test_else_if_chain() {
            let program = "
                fn classify(n: Integer) -> Integer {
                    if (n < 0) { 1; } else if (n == 0) { 2; } else { 3; }
                }
                fn main() { classify(0 - 4) * 100 + classify(0) * 10 + classify(9); }
            ";
            let exit_code = 123;
        }

        fn test_recursion() {
            let program = "
                fn fib(n: Integer) -> Integer {
                    if (n < 2) { n; } else { fib(n - 1) + fib(n - 2); }
                }
                fn main() { fib(10); }
            ";
            let exit_code = 55;
        }

        fn test_pointers() {
            let program = "
                fn bump(p: *Integer) { *p = *p + 1; }
                fn main() { x := 40; bump(&x); bump(&x); x; }
            ";
            let exit_code = 42;
        }

        fn test_tuple_members() {
            let program = "fn main() { t := (1, (2, 3)); t.1.0 = 20; t.0 + t.1.0 + t.1.1; }";
            let exit_code = 24;
        }

        fn test_arrays_are_copied_on_bind() {
            let program = "fn main() { a := [1, 2, 3]; b := a; b[0] = 10; a[0] + b[0]; }";
            let exit_code = 11;
        }

        fn test_aggregate_arguments_are_copied() {
            let program = "
                fn clobber(a: [Integer; 2]) { a[0] = 99; a[0]; }
                fn main() { a := [1, 2]; clobber(a); a[0]; }
            ";
            let exit_code = 1;
        }

        fn test_aggregate_return() {
            let program = "
                fn swap(p: (Integer, Integer)) -> (Integer, Integer) { (p.1, p.0); }
                fn main() { s := swap((3, 4)); s.0 * 10 + s.1; }
            ";
            let exit_code = 43;
        }

        fn test_aggregate_if_then_else() {
            let program = "
                fn main() {
                    a := (1, 2);
                    b := (3, 4);
                    c := if (a.0 < b.0) { b; } else { a; };
                    c.0 = 7;
                    b.0 + c.0;
                }
            ";
            let exit_code = 10;
        }

        fn test_slices() {
            let program = "
                fn sum(s: *[]Integer, n: Integer) -> Integer {
                    var i := 0;
                    var total := 0;
                    while (i < n) { total = total + s[i]; i = i + 1; };
                    total;
                }
                fn main() { a := [1, 2, 3, 4]; sum(&a, 4); }
            ";
            let exit_code = 10;
        }

        fn test_function_values_can_be_reassigned() {
            let program = "
                fn f() -> Integer { 1; }
                fn g() -> Integer { 2; }
                fn main() { var h := f; h = g; h(); }
            ";
            let exit_code = 2;
        }

        fn test_deep_recursion() {
            let program = "
                fn sum(n: Integer) -> Integer {
                    if (n < 1) { 0; } else { n + sum(n - 1); }
                }
                fn main() { sum(10000) % 256; }
            ";
            let exit_code = 8;
        }

        fn test_functions_as_values() {
            let program = "
                fn twice(n: Integer) { n * 2; }
                fn apply(f: (Integer) -> Integer, n: Integer) -> Integer { f(n); }
                fn main() { g := twice; apply(g, 21); }
            ";
            let exit_code = 42;
        }

        fn test_globals() {
            let program = "
                var counter := 1;
                table := [(1, true), (2, false)];
                fn main() { counter = counter + table[1].0; counter; }
            ";
            let exit_code = 3;
        }

        fn test_array_out_of_bounds() {
            let program = "fn main() { a := [1, 2, 3]; b := a[5]; b; }";
            let exit_code = 255;
        }

        fn test_negative_index_out_of_bounds() {
            let program = "fn main() { a := [1, 2, 3]; i := 0 - 1; a[i]; }";
            let exit_code = 255;
        }

        fn test_slice_out_of_bounds() {
            let program = "
                fn at(s: *[]Integer, i: Integer) -> Integer { s[i]; }
                fn main() { a := [1, 2]; at(&a, 2); }
            ";
            let exit_code = 255;
        }

        fn test_non_constant_global() {
            let program = "
                x := 1;
                y := x;
            ";
            let expected_errors = &[
                "2:6..7: global initializer must be a constant expression\n\
                 y := x;\n     ^",
            ];
        }

        fn test_non_constant_array_member() {
            let program = "
                x := 1;
                y := [1, -x];
            ";
            let expected_errors = &[
                "2:10..12: array members in a global initializer must be constant\n\
                 y := [1, -x];\n         ^^",
            ];
        }
    );
}
