//! Structural checks over a finished function. A function which fails to
//! verify is always the result of a code generation bug.

use rustc_hash::FxHashSet;

use super::{BlockId, FuncId, Function, InstKind, IrType, Module, Terminator, Value};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("function `{0}` has no body")]
    NoBody(String),
    #[error("block bb{} appears twice in the layout", .0.index())]
    DuplicateBlock(BlockId),
    #[error("block bb{} is not terminated", .0.index())]
    Unterminated(BlockId),
    #[error("block bb{} branches to detached block bb{}", .from.index(), .to.index())]
    DetachedTarget { from: BlockId, to: BlockId },
    #[error("phi in block bb{} is not at the head of the block", .0.index())]
    MisplacedPhi(BlockId),
    #[error("phi in block bb{} lists {actual} incoming values for {expected} predecessors", .block.index())]
    PhiArity {
        block: BlockId,
        expected: usize,
        actual: usize,
    },
    #[error("phi in block bb{} names bb{}, which is not a predecessor", .block.index(), .pred.index())]
    PhiNotPredecessor { block: BlockId, pred: BlockId },
    #[error("{what} of aggregate type {ty:?}")]
    AggregateAccess { what: &'static str, ty: IrType },
    #[error("operands of {what} have different types: {lhs:?} and {rhs:?}")]
    OperandMismatch {
        what: &'static str,
        lhs: IrType,
        rhs: IrType,
    },
    #[error("return of {actual:?} from a function returning {expected:?}")]
    ReturnMismatch { expected: IrType, actual: IrType },
    #[error("branch condition has type {0:?}")]
    NonBooleanCondition(IrType),
}

pub fn verify_function(module: &Module, id: FuncId) -> Result<(), VerifyError> {
    let func = module.function(id);
    if func.layout.is_empty() {
        return Err(VerifyError::NoBody(func.name.clone()));
    }

    let mut seen = FxHashSet::default();
    for &block in &func.layout {
        if !seen.insert(block) {
            return Err(VerifyError::DuplicateBlock(block));
        }
    }

    for &block in &func.layout {
        verify_block(func, block)?;
    }
    Ok(())
}

fn verify_block(func: &Function, block: BlockId) -> Result<(), VerifyError> {
    let data = func.block(block);
    let Some(terminator) = &data.terminator else {
        return Err(VerifyError::Unterminated(block));
    };

    let mut in_phi_prefix = true;
    for &inst_id in &data.insts {
        let inst = func.inst(inst_id);
        match &inst.kind {
            InstKind::Phi { incoming } => {
                if !in_phi_prefix {
                    return Err(VerifyError::MisplacedPhi(block));
                }
                verify_phi(func, block, incoming)?;
            }
            InstKind::Load { ty, .. } if !ty.is_single_value() => {
                return Err(VerifyError::AggregateAccess {
                    what: "load",
                    ty: ty.clone(),
                });
            }
            InstKind::Store { value, .. } => {
                let ty = func.value_type(value);
                if !ty.is_single_value() {
                    return Err(VerifyError::AggregateAccess { what: "store", ty });
                }
            }
            InstKind::Binary { lhs, rhs, .. } => same_type(func, "binary operator", lhs, rhs)?,
            InstKind::Icmp { lhs, rhs, .. } => same_type(func, "comparison", lhs, rhs)?,
            _ => {}
        }
        if !matches!(inst.kind, InstKind::Phi { .. }) {
            in_phi_prefix = false;
        }
    }

    for target in terminator.successors() {
        if !func.is_appended(target) {
            return Err(VerifyError::DetachedTarget {
                from: block,
                to: target,
            });
        }
    }

    match terminator {
        Terminator::CondBr { cond, .. } => {
            let ty = func.value_type(cond);
            if ty != IrType::I1 {
                return Err(VerifyError::NonBooleanCondition(ty));
            }
        }
        Terminator::Ret(value) => {
            let actual = value
                .as_ref()
                .map_or(IrType::Void, |v| func.value_type(v));
            if actual != func.ret {
                return Err(VerifyError::ReturnMismatch {
                    expected: func.ret.clone(),
                    actual,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn verify_phi(
    func: &Function,
    block: BlockId,
    incoming: &[(Value, BlockId)],
) -> Result<(), VerifyError> {
    let preds = func.predecessors(block);
    if preds.len() != incoming.len() {
        return Err(VerifyError::PhiArity {
            block,
            expected: preds.len(),
            actual: incoming.len(),
        });
    }
    for (_, pred) in incoming {
        if !preds.contains(pred) {
            return Err(VerifyError::PhiNotPredecessor { block, pred: *pred });
        }
    }
    Ok(())
}

fn same_type(
    func: &Function,
    what: &'static str,
    lhs: &Value,
    rhs: &Value,
) -> Result<(), VerifyError> {
    let (lhs, rhs) = (func.value_type(lhs), func.value_type(rhs));
    if lhs == rhs {
        Ok(())
    } else {
        Err(VerifyError::OperandMismatch { what, lhs, rhs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FunctionBuilder;

    fn with_function(
        ret: IrType,
        build: impl FnOnce(&mut FunctionBuilder<'_>),
    ) -> Result<(), VerifyError> {
        let mut module = Module::new("test");
        let f = module.add_function(Function::new("f", vec![IrType::I1], ret, false));
        let mut b = FunctionBuilder::new(&mut module, f);
        let entry = b.create_block();
        b.append_block(entry);
        b.position_at_end(entry);
        build(&mut b);
        verify_function(&module, f)
    }

    #[test]
    fn accepts_diamond() {
        let result = with_function(IrType::I64, |b| {
            let (then_b, else_b, merge) = (b.create_block(), b.create_block(), b.create_block());
            b.cond_br(Value::Param(0), then_b, else_b);
            b.append_block(then_b);
            b.position_at_end(then_b);
            b.br(merge);
            b.append_block(else_b);
            b.position_at_end(else_b);
            b.br(merge);
            b.append_block(merge);
            b.position_at_end(merge);
            let v = b.phi(
                IrType::I64,
                vec![(Value::i64(1), then_b), (Value::i64(2), else_b)],
            );
            b.ret(Some(v));
        });
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn rejects_unterminated_block() {
        let result = with_function(IrType::Void, |_| {});
        assert!(matches!(result, Err(VerifyError::Unterminated(_))));
    }

    #[test]
    fn rejects_branch_to_detached_block() {
        let result = with_function(IrType::Void, |b| {
            let detached = b.create_block();
            b.br(detached);
        });
        assert!(matches!(result, Err(VerifyError::DetachedTarget { .. })));
    }

    #[test]
    fn rejects_phi_with_missing_edge() {
        let result = with_function(IrType::I64, |b| {
            let merge = b.create_block();
            b.cond_br(Value::Param(0), merge, merge);
            b.append_block(merge);
            b.position_at_end(merge);
            let v = b.phi(IrType::I64, vec![]);
            b.ret(Some(v));
        });
        assert!(matches!(result, Err(VerifyError::PhiArity { .. })));
    }

    #[test]
    fn rejects_wrong_return_type() {
        let result = with_function(IrType::I64, |b| b.ret(Some(Value::bool(true))));
        assert_eq!(
            result,
            Err(VerifyError::ReturnMismatch {
                expected: IrType::I64,
                actual: IrType::I1,
            })
        );
    }
}
