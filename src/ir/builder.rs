use crate::ice;

use super::{
    BinaryOp, Block, BlockId, FuncId, Function, IcmpPred, Inst, InstId, InstKind, IrType, Module,
    Terminator, Value,
};

/// Appends instructions to a function of a [`Module`].
///
/// The builder is positioned at the end of some appended block; every
/// instruction-producing method emits into that block, except for
/// [`FunctionBuilder::alloca`], which always emits into the entry block so that
/// stack slots are created once per call.
pub struct FunctionBuilder<'m> {
    module: &'m mut Module,
    func: FuncId,
    block: Option<BlockId>,
}

impl<'m> FunctionBuilder<'m> {
    pub fn new(module: &'m mut Module, func: FuncId) -> FunctionBuilder<'m> {
        FunctionBuilder {
            module,
            func,
            block: None,
        }
    }

    /// Creates a builder positioned at the end of `block`.
    pub fn at(module: &'m mut Module, func: FuncId, block: BlockId) -> FunctionBuilder<'m> {
        FunctionBuilder {
            module,
            func,
            block: Some(block),
        }
    }

    pub fn module(&self) -> &Module {
        self.module
    }

    pub fn func_id(&self) -> FuncId {
        self.func
    }

    pub fn func(&self) -> &Function {
        self.module.function(self.func)
    }

    fn func_mut(&mut self) -> &mut Function {
        self.module.function_mut(self.func)
    }

    /// Creates a new detached block.
    pub fn create_block(&mut self) -> BlockId {
        let func = self.func_mut();
        let id = BlockId::from_index(func.blocks.len());
        func.blocks.push(Block::default());
        id
    }

    /// Attaches a block to the end of the function body.
    pub fn append_block(&mut self, block: BlockId) {
        let func = self.func_mut();
        if func.is_appended(block) {
            ice!("block {block:?} appended twice to `{}`", func.name);
        }
        func.layout.push(block);
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        if !self.func().is_appended(block) {
            ice!("positioned at detached block {block:?}");
        }
        self.block = Some(block);
    }

    pub fn current_block(&self) -> BlockId {
        match self.block {
            Some(block) => block,
            None => ice!("builder for `{}` is not positioned", self.func().name),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.func()
            .block(self.current_block())
            .terminator
            .is_some()
    }

    pub fn param(&self, index: u32) -> Value {
        if index as usize >= self.func().params.len() {
            ice!("parameter {index} out of range in `{}`", self.func().name);
        }
        Value::Param(index)
    }

    pub fn value_type(&self, value: &Value) -> IrType {
        self.func().value_type(value)
    }

    fn new_inst(&mut self, kind: InstKind, ty: IrType) -> InstId {
        let func = self.func_mut();
        let id = InstId::from_index(func.insts.len());
        func.insts.push(Inst { kind, ty });
        id
    }

    /// Inserts an instruction at position `at` of the current block.
    fn insert(&mut self, at: Option<usize>, kind: InstKind, ty: IrType) -> Value {
        if self.is_terminated() {
            ice!("emitting into terminated block {:?}", self.current_block());
        }
        let block = self.current_block();
        let id = self.new_inst(kind, ty);
        let insts = &mut self.func_mut().blocks[block.index()].insts;
        insts.insert(at.unwrap_or(insts.len()), id);
        Value::Inst(id)
    }

    fn emit(&mut self, kind: InstKind, ty: IrType) -> Value {
        self.insert(None, kind, ty)
    }

    pub fn alloca(&mut self, ty: IrType) -> Value {
        let Some(entry) = self.func().entry() else {
            ice!("alloca in `{}` before its entry block", self.func().name);
        };
        let id = self.new_inst(InstKind::Alloca(ty), IrType::Ptr);
        let func = self.func_mut();
        let at = func.allocas;
        func.blocks[entry.index()].insts.insert(at, id);
        func.allocas += 1;
        Value::Inst(id)
    }

    pub fn load(&mut self, ty: IrType, ptr: Value) -> Value {
        self.emit(InstKind::Load { ty: ty.clone(), ptr }, ty)
    }

    pub fn store(&mut self, value: Value, ptr: Value) {
        self.emit(InstKind::Store { value, ptr }, IrType::Void);
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: Value, rhs: Value) -> Value {
        let ty = self.value_type(&lhs);
        self.emit(InstKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn icmp(&mut self, pred: IcmpPred, lhs: Value, rhs: Value) -> Value {
        self.emit(InstKind::Icmp { pred, lhs, rhs }, IrType::I1)
    }

    pub fn gep(&mut self, base: IrType, ptr: Value, indices: Vec<Value>) -> Value {
        self.emit(InstKind::Gep { base, ptr, indices }, IrType::Ptr)
    }

    /// Address of the `index`th member of the aggregate of type `base` that
    /// `ptr` points to.
    pub fn member_gep(&mut self, base: IrType, ptr: Value, index: Value) -> Value {
        self.gep(base, ptr, vec![Value::i64(0), index])
    }

    pub fn zext(&mut self, value: Value, to: IrType) -> Value {
        self.emit(
            InstKind::ZExt {
                value,
                to: to.clone(),
            },
            to,
        )
    }

    pub fn call(&mut self, callee: Value, args: Vec<Value>, ret: IrType, sret: bool) -> Value {
        self.emit(InstKind::Call { callee, args, sret }, ret)
    }

    /// Emits a phi at the head of the current block, after any other phis.
    pub fn phi(&mut self, ty: IrType, incoming: Vec<(Value, BlockId)>) -> Value {
        let block = self.current_block();
        let func = self.func();
        let at = func
            .block(block)
            .insts
            .iter()
            .take_while(|i| matches!(func.inst(**i).kind, InstKind::Phi { .. }))
            .count();
        self.insert(Some(at), InstKind::Phi { incoming }, ty)
    }

    fn terminate(&mut self, terminator: Terminator) {
        if self.is_terminated() {
            ice!("block {:?} terminated twice", self.current_block());
        }
        let block = self.current_block();
        self.func_mut().blocks[block.index()].terminator = Some(terminator);
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn ret(&mut self, value: Option<Value>) {
        self.terminate(Terminator::Ret(value));
    }

    pub fn exit(&mut self, code: Value) {
        self.terminate(Terminator::Exit(code));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocas_are_hoisted_to_entry() {
        let mut module = Module::new("test");
        let f = module.add_function(Function::new("f", vec![], IrType::I64, false));
        let mut b = FunctionBuilder::new(&mut module, f);
        let entry = b.create_block();
        b.append_block(entry);
        b.position_at_end(entry);
        let slot = b.alloca(IrType::I64);
        b.store(Value::i64(1), slot.clone());
        let next = b.create_block();
        b.br(next);
        b.append_block(next);
        b.position_at_end(next);
        let late = b.alloca(IrType::I1);
        let v = b.load(IrType::I64, slot);
        b.ret(Some(v));

        let func = module.function(f);
        let entry_insts = &func.block(entry).insts;
        assert_eq!(entry_insts.len(), 3);
        assert_eq!(Value::Inst(entry_insts[1]), late);
        assert_eq!(func.block(next).insts.len(), 1);
        assert_eq!(func.layout, [entry, next]);
    }

    #[test]
    fn phis_stay_at_block_head() {
        let mut module = Module::new("test");
        let f = module.add_function(Function::new("f", vec![IrType::I1], IrType::I64, false));
        let mut b = FunctionBuilder::new(&mut module, f);
        let entry = b.create_block();
        let merge = b.create_block();
        b.append_block(entry);
        b.position_at_end(entry);
        b.br(merge);
        b.append_block(merge);
        b.position_at_end(merge);
        let sum = b.binary(BinaryOp::Add, Value::i64(1), Value::i64(2));
        let phi = b.phi(IrType::I64, vec![(Value::i64(3), entry)]);

        let func = module.function(f);
        let insts = &func.block(merge).insts;
        assert_eq!(Value::Inst(insts[0]), phi);
        assert_eq!(Value::Inst(insts[1]), sum);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn double_termination_is_an_ice() {
        let mut module = Module::new("test");
        let f = module.add_function(Function::new("f", vec![], IrType::Void, false));
        let mut b = FunctionBuilder::new(&mut module, f);
        let entry = b.create_block();
        b.append_block(entry);
        b.position_at_end(entry);
        b.ret(None);
        b.ret(None);
    }
}
