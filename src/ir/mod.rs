//! Backend IR: a small, LLVM-shaped, basic-block intermediate representation.
//!
//! - **[`Module`]** owns functions and globals.
//! - **[`Function`]** owns an instruction arena, a block arena, and a
//!   *layout*: blocks are created detached and only become part of the body
//!   once appended, so their order is the order they were emitted in.
//! - **[`Inst`]** is a single non-terminating instruction and
//!   **[`Terminator`]** is the single exit of a block.
//!
//! Aggregates (arrays and structs) are never loaded or stored whole: they live
//! in memory and are copied element by element.

pub mod builder;
pub mod interp;
pub mod print;
pub mod verify;

pub use builder::FunctionBuilder;

use crate::ice;

macro_rules! id_newtype {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or_else(|_| {
                    panic!(concat!(stringify!($name), " count exceeds u32::MAX"))
                }))
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_newtype!(
    /// Function within a [`Module`].
    FuncId
);
id_newtype!(
    /// Global variable within a [`Module`].
    GlobalId
);
id_newtype!(
    /// Basic block within a [`Function`].
    BlockId
);
id_newtype!(
    /// Instruction within a [`Function`].
    InstId
);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    I1,
    I8,
    I64,
    Ptr,
    Void,
    Array(u64, Box<IrType>),
    Struct(Box<[IrType]>),
}

impl IrType {
    /// Whether a value of this type fits in a register and can be loaded or
    /// stored with a single instruction.
    pub fn is_single_value(&self) -> bool {
        !matches!(self, IrType::Array(..) | IrType::Struct(_))
    }

    /// Number of scalar cells occupied in memory.
    pub fn cells(&self) -> u64 {
        match self {
            IrType::Void => 0,
            IrType::I1 | IrType::I8 | IrType::I64 | IrType::Ptr => 1,
            IrType::Array(n, element) => n * element.cells(),
            IrType::Struct(fields) => fields.iter().map(IrType::cells).sum(),
        }
    }

    /// The sub-type reached by stepping one index into an aggregate, along
    /// with the cell offset of that index.
    pub fn step(&self, index: i64) -> Option<(&IrType, i64)> {
        match self {
            IrType::Array(_, element) => {
                let stride = i64::try_from(element.cells()).ok()?;
                Some((element, index.checked_mul(stride)?))
            }
            IrType::Struct(fields) => {
                let index = usize::try_from(index).ok()?;
                let field = fields.get(index)?;
                let offset: u64 = fields[..index].iter().map(IrType::cells).sum();
                Some((field, i64::try_from(offset).ok()?))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    /// An integer of any of the integer types (`i1`, `i8`, `i64`).
    Int(IrType, i64),
    Aggregate(IrType, Box<[Constant]>),
}

impl Constant {
    pub fn i64(value: i64) -> Constant {
        Constant::Int(IrType::I64, value)
    }

    pub fn bool(value: bool) -> Constant {
        Constant::Int(IrType::I1, i64::from(value))
    }

    pub fn ty(&self) -> &IrType {
        match self {
            Constant::Int(ty, _) | Constant::Aggregate(ty, _) => ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Value {
    Inst(InstId),
    Param(u32),
    Const(Constant),
    /// The address of a global.
    Global(GlobalId),
    /// The address of a function.
    Func(FuncId),
}

impl Value {
    pub fn i64(value: i64) -> Value {
        Value::Const(Constant::i64(value))
    }

    pub fn bool(value: bool) -> Value {
        Value::Const(Constant::bool(value))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    And,
    Or,
    Xor,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IcmpPred {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstKind {
    Alloca(IrType),
    Load {
        ty: IrType,
        ptr: Value,
    },
    Store {
        value: Value,
        ptr: Value,
    },
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
    },
    Icmp {
        pred: IcmpPred,
        lhs: Value,
        rhs: Value,
    },
    /// Address computation. The first index scales `ptr` by the size of
    /// `base`; each following index steps into the aggregate reached so far.
    Gep {
        base: IrType,
        ptr: Value,
        indices: Vec<Value>,
    },
    ZExt {
        value: Value,
        to: IrType,
    },
    Call {
        callee: Value,
        args: Vec<Value>,
        /// The callee returns through a hidden first pointer argument.
        sret: bool,
    },
    Phi {
        incoming: Vec<(Value, BlockId)>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inst {
    pub kind: InstKind,
    /// Result type; `Void` for instructions which produce nothing.
    pub ty: IrType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Br(BlockId),
    CondBr {
        cond: Value,
        then_block: BlockId,
        else_block: BlockId,
    },
    Ret(Option<Value>),
    /// Terminates the whole process with the given exit code.
    Exit(Value),
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Terminator::Ret(_) | Terminator::Exit(_) => vec![],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    pub insts: Vec<InstId>,
    pub terminator: Option<Terminator>,
}

#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    /// Aggregate results are written through the first parameter.
    pub sret: bool,
    pub insts: Vec<Inst>,
    pub blocks: Vec<Block>,
    /// Appended blocks, in emission order. `layout[0]` is the entry block.
    pub layout: Vec<BlockId>,
    /// Number of allocas hoisted to the head of the entry block.
    pub(crate) allocas: usize,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<IrType>, ret: IrType, sret: bool) -> Function {
        Function {
            name: name.into(),
            params,
            ret,
            sret,
            insts: Vec::new(),
            blocks: Vec::new(),
            layout: Vec::new(),
            allocas: 0,
        }
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.layout.first().copied()
    }

    pub fn inst(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn is_appended(&self, id: BlockId) -> bool {
        self.layout.contains(&id)
    }

    /// Type of a value as seen from inside this function.
    pub fn value_type(&self, value: &Value) -> IrType {
        match value {
            Value::Inst(id) => self.inst(*id).ty.clone(),
            Value::Param(i) => match self.params.get(*i as usize) {
                Some(ty) => ty.clone(),
                None => ice!("parameter {i} of `{}` does not exist", self.name),
            },
            Value::Const(c) => c.ty().clone(),
            Value::Global(_) | Value::Func(_) => IrType::Ptr,
        }
    }

    /// Predecessors of an appended block, in layout order.
    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.layout
            .iter()
            .copied()
            .filter(|b| {
                self.block(*b)
                    .terminator
                    .as_ref()
                    .is_some_and(|t| t.successors().contains(&id))
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct Global {
    pub name: String,
    pub ty: IrType,
    pub init: Constant,
}

#[derive(Clone, Debug, Default)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
    pub globals: Vec<Global>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Module {
        Module {
            name: name.into(),
            functions: Vec::new(),
            globals: Vec::new(),
        }
    }

    pub fn add_function(&mut self, function: Function) -> FuncId {
        let id = FuncId::from_index(self.functions.len());
        self.functions.push(function);
        id
    }

    pub fn add_global(&mut self, name: impl Into<String>, init: Constant) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        self.globals.push(Global {
            name: name.into(),
            ty: init.ty().clone(),
            init,
        });
        id
    }

    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn find_function(&self, name: &str) -> Option<FuncId> {
        self.functions
            .iter()
            .position(|f| f.name == name)
            .map(FuncId::from_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_and_steps() {
        let pair = IrType::Struct(Box::new([IrType::I64, IrType::Array(3, Box::new(IrType::I1))]));
        assert_eq!(pair.cells(), 4);
        assert!(!pair.is_single_value());
        assert!(IrType::Ptr.is_single_value());

        let (field, offset) = pair.step(1).unwrap();
        assert_eq!(field, &IrType::Array(3, Box::new(IrType::I1)));
        assert_eq!(offset, 1);
        assert_eq!(field.step(2).unwrap().1, 2);
        assert!(pair.step(2).is_none());
        assert!(IrType::I64.step(0).is_none());

        let grid = IrType::Array(2, Box::new(pair));
        assert_eq!(grid.cells(), 8);
        assert_eq!(grid.step(1).unwrap().1, 4);
    }

    #[test]
    fn value_types() {
        let func = Function::new("f", vec![IrType::I8], IrType::Void, false);
        assert_eq!(func.value_type(&Value::Param(0)), IrType::I8);
        assert_eq!(func.value_type(&Value::i64(3)), IrType::I64);
    }

    #[test]
    #[should_panic(expected = "internal compiler error: parameter 1 of `f` does not exist")]
    fn missing_parameter_is_an_internal_error() {
        let func = Function::new("f", vec![IrType::I8], IrType::Void, false);
        func.value_type(&Value::Param(1));
    }
}
