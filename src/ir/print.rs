//! Textual form of the IR, loosely following LLVM assembly.

use std::fmt::{self, Display, Formatter, Write};

use super::{
    BinaryOp, Constant, Function, IcmpPred, InstKind, IrType, Module, Terminator, Value,
};

impl Display for IrType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IrType::I1 => f.write_str("i1"),
            IrType::I8 => f.write_str("i8"),
            IrType::I64 => f.write_str("i64"),
            IrType::Ptr => f.write_str("ptr"),
            IrType::Void => f.write_str("void"),
            IrType::Array(n, element) => write!(f, "[{n} x {element}]"),
            IrType::Struct(fields) => {
                f.write_str("{ ")?;
                comma_separated(f, fields.iter())?;
                f.write_str(" }")
            }
        }
    }
}

impl Display for Constant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(IrType::I1, v) => f.write_str(if *v == 0 { "false" } else { "true" }),
            Constant::Int(_, v) => write!(f, "{v}"),
            Constant::Aggregate(ty, elements) => {
                let (open, close) = match ty {
                    IrType::Struct(_) => ("{ ", " }"),
                    _ => ("[", "]"),
                };
                f.write_str(open)?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} {element}", element.ty())?;
                }
                f.write_str(close)
            }
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::SDiv => "sdiv",
            BinaryOp::SRem => "srem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        })
    }
}

impl Display for IcmpPred {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IcmpPred::Eq => "eq",
            IcmpPred::Ne => "ne",
            IcmpPred::Slt => "slt",
            IcmpPred::Sle => "sle",
            IcmpPred::Sgt => "sgt",
            IcmpPred::Sge => "sge",
        })
    }
}

fn comma_separated<T: Display>(
    f: &mut Formatter<'_>,
    items: impl Iterator<Item = T>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Prints values in the context of the function that uses them.
struct Printer<'a> {
    module: &'a Module,
    func: &'a Function,
}

impl Printer<'_> {
    fn value(&self, value: &Value) -> String {
        match value {
            Value::Inst(id) => format!("%{}", id.index()),
            Value::Param(i) => format!("%arg{i}"),
            Value::Const(c) => c.to_string(),
            Value::Global(g) => format!("@{}", self.module.global(*g).name),
            Value::Func(f) => format!("@{}", self.module.function(*f).name),
        }
    }

    fn typed(&self, value: &Value) -> String {
        format!("{} {}", self.func.value_type(value), self.value(value))
    }

    fn function(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let func = self.func;
        write!(f, "define {} @{}(", func.ret, func.name)?;
        for (i, param) in func.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if i == 0 && func.sret {
                write!(f, "{param} sret %arg{i}")?;
            } else {
                write!(f, "{param} %arg{i}")?;
            }
        }
        f.write_str(") {\n")?;
        for &block in &func.layout {
            writeln!(f, "bb{}:", block.index())?;
            let data = func.block(block);
            for &inst in &data.insts {
                let mut line = String::new();
                self.inst(&mut line, inst.index())?;
                writeln!(f, "  {line}")?;
            }
            match &data.terminator {
                Some(t) => writeln!(f, "  {}", self.terminator(t))?,
                None => writeln!(f, "  <unterminated>")?,
            }
        }
        f.write_str("}\n")
    }

    fn inst(&self, w: &mut String, index: usize) -> fmt::Result {
        let inst = &self.func.insts[index];
        if inst.ty != IrType::Void {
            write!(w, "%{index} = ")?;
        }
        match &inst.kind {
            InstKind::Alloca(ty) => write!(w, "alloca {ty}"),
            InstKind::Load { ty, ptr } => write!(w, "load {ty}, {}", self.typed(ptr)),
            InstKind::Store { value, ptr } => {
                write!(w, "store {}, {}", self.typed(value), self.typed(ptr))
            }
            InstKind::Binary { op, lhs, rhs } => {
                write!(w, "{op} {}, {}", self.typed(lhs), self.value(rhs))
            }
            InstKind::Icmp { pred, lhs, rhs } => {
                write!(w, "icmp {pred} {}, {}", self.typed(lhs), self.value(rhs))
            }
            InstKind::Gep { base, ptr, indices } => {
                write!(w, "getelementptr {base}, {}", self.typed(ptr))?;
                for index in indices {
                    write!(w, ", {}", self.typed(index))?;
                }
                Ok(())
            }
            InstKind::ZExt { value, to } => write!(w, "zext {} to {to}", self.typed(value)),
            InstKind::Call { callee, args, sret } => {
                write!(w, "call {} {}(", inst.ty, self.value(callee))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        w.push_str(", ");
                    }
                    if i == 0 && *sret {
                        write!(w, "ptr sret {}", self.value(arg))?;
                    } else {
                        w.push_str(&self.typed(arg));
                    }
                }
                w.push(')');
                Ok(())
            }
            InstKind::Phi { incoming } => {
                write!(w, "phi {} ", inst.ty)?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        w.push_str(", ");
                    }
                    write!(w, "[ {}, bb{} ]", self.value(value), block.index())?;
                }
                Ok(())
            }
        }
    }

    fn terminator(&self, terminator: &Terminator) -> String {
        match terminator {
            Terminator::Br(target) => format!("br label bb{}", target.index()),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => format!(
                "br {}, label bb{}, label bb{}",
                self.typed(cond),
                then_block.index(),
                else_block.index()
            ),
            Terminator::Ret(None) => "ret void".to_owned(),
            Terminator::Ret(Some(value)) => format!("ret {}", self.typed(value)),
            Terminator::Exit(code) => format!("exit {}", self.typed(code)),
        }
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for global in &self.globals {
            writeln!(f, "@{} = global {} {}", global.name, global.ty, global.init)?;
        }
        for func in &self.functions {
            f.write_str("\n")?;
            Printer { module: self, func }.function(f)?;
        }
        Ok(())
    }
}
