//! Reference interpreter for the IR.
//!
//! Memory is a flat vector of scalar cells; a pointer is an index into it.
//! Globals live at the bottom, and each call frame releases the cells of its
//! stack slots when it returns.

use tracing::{debug, trace};

use super::{
    BinaryOp, BlockId, Constant, FuncId, Function, IcmpPred, InstKind, IrType, Module,
    Terminator, Value,
};

/// Exit code of a program that indexes an array or slice out of bounds.
pub const OUT_OF_BOUNDS_EXIT_CODE: i64 = 255;

/// Default bound on nested calls. Frames live on the heap, so the bound only
/// guards against runaway recursion.
pub const MAX_CALL_DEPTH: usize = 100_000;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Trap {
    #[error("module has no `main` function")]
    NoMain,
    #[error("call stack exhausted after {0} nested calls")]
    StackOverflow(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("access to invalid address {0}")]
    BadAddress(i64),
    #[error("read of uninitialized memory at address {0}")]
    Uninitialized(usize),
    #[error("read of parameter {0}, which was not passed")]
    MissingArgument(u32),
    #[error("call through a value which is not a function")]
    BadCallee,
    #[error("reached unreachable code")]
    Unreachable,
    #[error("`main` returned instead of exiting")]
    MainReturned,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Val {
    Int(i64),
    Ptr(usize),
    Func(FuncId),
}

impl Val {
    fn int(self) -> i64 {
        match self {
            Val::Int(v) => v,
            Val::Ptr(p) => p as i64,
            Val::Func(f) => f.index() as i64,
        }
    }
}

/// Why the current frame stopped running.
enum Flow {
    Call(FuncId, Vec<Val>),
    Return(Option<Val>),
    Exit(i64),
}

/// Outcome of a single instruction.
enum Effect {
    Value(Option<Val>),
    Call(FuncId, Vec<Val>),
    Exit(i64),
}

/// Runs the `main` function of the module, returning its exit code.
pub fn run(module: &Module) -> Result<i64, Trap> {
    run_with_max_depth(module, MAX_CALL_DEPTH)
}

/// Like [`run`], trapping once more than `max_depth` calls are nested.
pub fn run_with_max_depth(module: &Module, max_depth: usize) -> Result<i64, Trap> {
    let main = module.find_function("main").ok_or(Trap::NoMain)?;
    let mut machine = Machine {
        module,
        memory: Vec::new(),
        globals: Vec::with_capacity(module.globals.len()),
    };
    for global in &module.globals {
        let base = machine.memory.len();
        machine.globals.push(base);
        machine.memory.resize(base + global.ty.cells() as usize, None);
        machine.init_constant(base, &global.init);
    }
    debug!(globals = module.globals.len(), max_depth, "running `main`");
    machine.run(main, max_depth)
}

struct Machine<'m> {
    module: &'m Module,
    memory: Vec<Option<Val>>,
    globals: Vec<usize>,
}

struct Frame<'m> {
    func: &'m Function,
    args: Vec<Val>,
    values: Vec<Option<Val>>,
    block: BlockId,
    /// Position in `block` of the next instruction to run. While a callee
    /// runs, it is the position of the call.
    cursor: usize,
    /// First memory cell owned by the frame.
    stack_base: usize,
}

impl<'m> Machine<'m> {
    fn init_constant(&mut self, at: usize, constant: &Constant) {
        match constant {
            Constant::Int(_, v) => self.memory[at] = Some(Val::Int(*v)),
            Constant::Aggregate(_, elements) => {
                let mut offset = at;
                for element in elements.iter() {
                    self.init_constant(offset, element);
                    offset += element.ty().cells() as usize;
                }
            }
        }
    }

    fn run(&mut self, main: FuncId, max_depth: usize) -> Result<i64, Trap> {
        let mut stack = vec![self.frame(main, Vec::new())?];
        while let Some(frame) = stack.last_mut() {
            match self.advance(frame)? {
                Flow::Call(callee, args) => {
                    if stack.len() >= max_depth {
                        return Err(Trap::StackOverflow(max_depth));
                    }
                    let frame = self.frame(callee, args)?;
                    trace!(function = %frame.func.name, depth = stack.len() + 1, "call");
                    stack.push(frame);
                }
                Flow::Return(value) => {
                    if let Some(done) = stack.pop() {
                        self.memory.truncate(done.stack_base);
                    }
                    let Some(caller) = stack.last_mut() else {
                        return Err(Trap::MainReturned);
                    };
                    let call = caller.func.block(caller.block).insts[caller.cursor];
                    caller.values[call.index()] = value;
                    caller.cursor += 1;
                }
                // Exiting from a nested call ends the whole program.
                Flow::Exit(code) => return Ok(code),
            }
        }
        Err(Trap::MainReturned)
    }

    fn frame(&self, id: FuncId, args: Vec<Val>) -> Result<Frame<'m>, Trap> {
        let func = self.module.function(id);
        let block = func.entry().ok_or(Trap::Unreachable)?;
        Ok(Frame {
            func,
            args,
            values: vec![None; func.insts.len()],
            block,
            cursor: 0,
            stack_base: self.memory.len(),
        })
    }

    /// Runs the frame until it calls, returns or exits.
    fn advance(&mut self, frame: &mut Frame<'m>) -> Result<Flow, Trap> {
        let func = frame.func;
        loop {
            let data = func.block(frame.block);
            while let Some(&inst) = data.insts.get(frame.cursor) {
                match self.step(frame, &func.inst(inst).kind)? {
                    Effect::Value(result) => frame.values[inst.index()] = result,
                    Effect::Call(callee, args) => return Ok(Flow::Call(callee, args)),
                    Effect::Exit(code) => return Ok(Flow::Exit(code)),
                }
                frame.cursor += 1;
            }

            let next = match &data.terminator {
                Some(Terminator::Br(target)) => *target,
                Some(Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                }) => {
                    if self.eval(frame, cond)?.int() != 0 {
                        *then_block
                    } else {
                        *else_block
                    }
                }
                Some(Terminator::Ret(value)) => {
                    let value = value.as_ref().map(|v| self.eval(frame, v)).transpose()?;
                    return Ok(Flow::Return(value));
                }
                Some(Terminator::Exit(code)) => {
                    return Ok(Flow::Exit(self.eval(frame, code)?.int()));
                }
                None => return Err(Trap::Unreachable),
            };
            self.enter(frame, next)?;
        }
    }

    /// Takes the edge from the current block of the frame to `target`,
    /// resolving the phis at its head.
    fn enter(&self, frame: &mut Frame<'m>, target: BlockId) -> Result<(), Trap> {
        let func = frame.func;
        // Phis read their operands as of the edge just taken, so they are all
        // evaluated before any of them is written.
        let mut phis = Vec::new();
        for &inst in &func.block(target).insts {
            let InstKind::Phi { incoming } = &func.inst(inst).kind else {
                break;
            };
            let value = incoming
                .iter()
                .find(|(_, from)| *from == frame.block)
                .map(|(value, _)| value)
                .ok_or(Trap::Unreachable)?;
            phis.push((inst, self.eval(frame, value)?));
        }
        frame.cursor = phis.len();
        for (inst, value) in phis {
            frame.values[inst.index()] = Some(value);
        }
        frame.block = target;
        Ok(())
    }

    fn step(&mut self, frame: &Frame<'_>, kind: &InstKind) -> Result<Effect, Trap> {
        let value = match kind {
            InstKind::Alloca(ty) => {
                let base = self.memory.len();
                self.memory.resize(base + ty.cells() as usize, None);
                Val::Ptr(base)
            }
            InstKind::Load { ptr, .. } => {
                let at = self.address(frame, ptr)?;
                self.memory[at].ok_or(Trap::Uninitialized(at))?
            }
            InstKind::Store { value, ptr } => {
                let value = self.eval(frame, value)?;
                let at = self.address(frame, ptr)?;
                self.memory[at] = Some(value);
                return Ok(Effect::Value(None));
            }
            InstKind::Binary { op, lhs, rhs } => {
                let (l, r) = (self.eval(frame, lhs)?.int(), self.eval(frame, rhs)?.int());
                Val::Int(binary(*op, l, r)?)
            }
            InstKind::Icmp { pred, lhs, rhs } => {
                let (l, r) = (self.eval(frame, lhs)?.int(), self.eval(frame, rhs)?.int());
                let holds = match pred {
                    IcmpPred::Eq => l == r,
                    IcmpPred::Ne => l != r,
                    IcmpPred::Slt => l < r,
                    IcmpPred::Sle => l <= r,
                    IcmpPred::Sgt => l > r,
                    IcmpPred::Sge => l >= r,
                };
                Val::Int(i64::from(holds))
            }
            InstKind::Gep { base, ptr, indices } => {
                let Val::Ptr(start) = self.eval(frame, ptr)? else {
                    return Err(Trap::BadAddress(-1));
                };
                let mut offset = 0i64;
                let mut ty = base;
                for (i, index) in indices.iter().enumerate() {
                    let index = self.eval(frame, index)?.int();
                    if i == 0 {
                        offset += index.wrapping_mul(ty.cells() as i64);
                    } else {
                        let (inner, step) = ty.step(index).ok_or(Trap::BadAddress(index))?;
                        offset += step;
                        ty = inner;
                    }
                }
                let at = start as i64 + offset;
                Val::Ptr(usize::try_from(at).map_err(|_| Trap::BadAddress(at))?)
            }
            InstKind::ZExt { value, .. } => Val::Int(self.eval(frame, value)?.int()),
            InstKind::Call { callee, args, .. } => {
                let callee = match self.eval(frame, callee)? {
                    Val::Func(f) => f,
                    _ => return Err(Trap::BadCallee),
                };
                let args = args
                    .iter()
                    .map(|a| self.eval(frame, a))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Effect::Call(callee, args));
            }
            // Phis are resolved when their block is entered.
            InstKind::Phi { .. } => return Err(Trap::Unreachable),
        };
        Ok(Effect::Value(Some(value)))
    }

    fn address(&self, frame: &Frame<'_>, ptr: &Value) -> Result<usize, Trap> {
        match self.eval(frame, ptr)? {
            Val::Ptr(at) if at < self.memory.len() => Ok(at),
            other => Err(Trap::BadAddress(other.int())),
        }
    }

    fn eval(&self, frame: &Frame<'_>, value: &Value) -> Result<Val, Trap> {
        Ok(match value {
            Value::Inst(id) => frame.values[id.index()].ok_or(Trap::Unreachable)?,
            Value::Param(i) => *frame
                .args
                .get(*i as usize)
                .ok_or(Trap::MissingArgument(*i))?,
            Value::Const(Constant::Int(_, v)) => Val::Int(*v),
            Value::Const(_) => return Err(Trap::Unreachable),
            Value::Global(g) => Val::Ptr(self.globals[g.index()]),
            Value::Func(f) => Val::Func(*f),
        })
    }
}

fn binary(op: BinaryOp, l: i64, r: i64) -> Result<i64, Trap> {
    Ok(match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::SDiv if r == 0 => return Err(Trap::DivisionByZero),
        BinaryOp::SDiv => l.wrapping_div(r),
        BinaryOp::SRem if r == 0 => return Err(Trap::DivisionByZero),
        BinaryOp::SRem => l.wrapping_rem(r),
        BinaryOp::And => l & r,
        BinaryOp::Or => l | r,
        BinaryOp::Xor => l ^ r,
    })
}
