//! Operator tables.
//!
//! Binary and unary operators are not part of the grammar: the lexer only
//! knows that some text is operator-like, and the parser asks the binop table
//! for its precedence and associativity. Typechecking resolves an overload by
//! operand types, and code generation calls the overload's lowering function.
//!
//! Overloads are always keyed by unqualified types, so a literal operand
//! (`1 + x`) resolves to the same overload as a non-literal one.

use rustc_hash::FxHashMap;

use crate::{
    ir::{BinaryOp, FunctionBuilder, IcmpPred, Value},
    types::{TypeId, TypeInterner},
    util::intern::{Interner, Symbol},
};

/// Emits the instructions that implement a binary overload.
pub type BinopLowering = fn(&mut FunctionBuilder<'_>, Value, Value) -> Value;

/// Emits the instructions that implement a unary overload.
pub type UnopLowering = fn(&mut FunctionBuilder<'_>, Value) -> Value;

/// Binding strength of a binary operator. Higher binds tighter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Precedence(pub u8);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Assoc {
    Left,
    Right,
}

#[derive(Copy, Clone, Debug)]
pub struct BinopOverload {
    pub result: TypeId,
    pub lower: BinopLowering,
}

#[derive(Clone, Debug)]
pub struct BinopEntry {
    pub precedence: Precedence,
    pub assoc: Assoc,
    overloads: FxHashMap<(TypeId, TypeId), BinopOverload>,
}

impl BinopEntry {
    /// Finds the overload for the given operand types, ignoring annotations.
    pub fn lookup(
        &self,
        types: &mut TypeInterner,
        left: TypeId,
        right: TypeId,
    ) -> Option<BinopOverload> {
        let key = (types.unqualified(left), types.unqualified(right));
        self.overloads.get(&key).copied()
    }

    pub fn overloads(&self) -> usize {
        self.overloads.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BinopTable {
    entries: FxHashMap<Symbol, BinopEntry>,
}

impl BinopTable {
    /// Registers an overload.
    ///
    /// The first registration of an operator fixes its precedence and
    /// associativity; later registrations only add (or replace) overloads.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        types: &mut TypeInterner,
        op: Symbol,
        precedence: Precedence,
        assoc: Assoc,
        (left, right): (TypeId, TypeId),
        result: TypeId,
        lower: BinopLowering,
    ) {
        let key = (types.unqualified(left), types.unqualified(right));
        let entry = self.entries.entry(op).or_insert_with(|| BinopEntry {
            precedence,
            assoc,
            overloads: FxHashMap::default(),
        });
        entry.overloads.insert(key, BinopOverload { result, lower });
    }

    pub fn get(&self, op: Symbol) -> Option<&BinopEntry> {
        self.entries.get(&op)
    }

    pub fn lookup(
        &self,
        types: &mut TypeInterner,
        op: Symbol,
        left: TypeId,
        right: TypeId,
    ) -> Option<BinopOverload> {
        self.get(op)?.lookup(types, left, right)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct UnopOverload {
    pub operand: TypeId,
    pub result: TypeId,
    pub lower: UnopLowering,
}

#[derive(Clone, Debug, Default)]
pub struct UnopTable {
    entries: FxHashMap<Symbol, Vec<UnopOverload>>,
}

impl UnopTable {
    /// Registers an overload, replacing a previous one for the same operand
    /// type.
    pub fn register(
        &mut self,
        types: &mut TypeInterner,
        op: Symbol,
        operand: TypeId,
        result: TypeId,
        lower: UnopLowering,
    ) {
        let operand = types.unqualified(operand);
        let overloads = self.entries.entry(op).or_default();
        let overload = UnopOverload {
            operand,
            result,
            lower,
        };
        match overloads.iter_mut().find(|o| o.operand == operand) {
            Some(existing) => *existing = overload,
            None => overloads.push(overload),
        }
    }

    pub fn contains(&self, op: Symbol) -> bool {
        self.entries.contains_key(&op)
    }

    pub fn lookup(
        &self,
        types: &mut TypeInterner,
        op: Symbol,
        operand: TypeId,
    ) -> Option<UnopOverload> {
        let overloads = self.entries.get(&op)?;
        overloads
            .iter()
            .find(|o| types.same(o.operand, operand))
            .copied()
    }
}

fn add(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::Add, l, r)
}

fn sub(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::Sub, l, r)
}

fn mul(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::Mul, l, r)
}

fn div(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::SDiv, l, r)
}

fn rem(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::SRem, l, r)
}

fn and(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::And, l, r)
}

fn or(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
    b.binary(BinaryOp::Or, l, r)
}

macro_rules! comparisons {
    ($($name:ident => $pred:ident,)*) => {$(
        fn $name(b: &mut FunctionBuilder<'_>, l: Value, r: Value) -> Value {
            b.icmp(IcmpPred::$pred, l, r)
        }
    )*};
}

comparisons! {
    eq => Eq,
    ne => Ne,
    lt => Slt,
    le => Sle,
    gt => Sgt,
    ge => Sge,
}

fn neg(b: &mut FunctionBuilder<'_>, v: Value) -> Value {
    b.binary(BinaryOp::Sub, Value::i64(0), v)
}

fn not(b: &mut FunctionBuilder<'_>, v: Value) -> Value {
    b.binary(BinaryOp::Xor, v, Value::bool(true))
}

/// Registers the builtin operators.
///
/// | precedence | operators            |
/// |------------|----------------------|
/// | 1          | `\|`                 |
/// | 2          | `&`                  |
/// | 3          | `==` `!=`            |
/// | 4          | `<` `<=` `>` `>=`    |
/// | 5          | `+` `-`              |
/// | 6          | `*` `/` `%`          |
///
/// All of them are left-associative. `&` and `|` are bitwise on integers and
/// logical on booleans.
pub fn register_builtins(
    strings: &mut Interner<str>,
    types: &mut TypeInterner,
    binops: &mut BinopTable,
    unops: &mut UnopTable,
) {
    let integer = types.integer();
    let boolean = types.boolean();
    let character = types.character();

    let mut binop = |op: &str, precedence: u8, operands, result, lower: BinopLowering| {
        let op = strings.intern(op);
        binops.register(
            types,
            op,
            Precedence(precedence),
            Assoc::Left,
            operands,
            result,
            lower,
        );
    };

    for ty in [integer, boolean] {
        binop("|", 1, (ty, ty), ty, or);
        binop("&", 2, (ty, ty), ty, and);
    }
    for ty in [integer, boolean, character] {
        binop("==", 3, (ty, ty), boolean, eq);
        binop("!=", 3, (ty, ty), boolean, ne);
    }
    for ty in [integer, character] {
        binop("<", 4, (ty, ty), boolean, lt);
        binop("<=", 4, (ty, ty), boolean, le);
        binop(">", 4, (ty, ty), boolean, gt);
        binop(">=", 4, (ty, ty), boolean, ge);
    }
    let int_pair = (integer, integer);
    binop("+", 5, int_pair, integer, add);
    binop("-", 5, int_pair, integer, sub);
    binop("*", 6, int_pair, integer, mul);
    binop("/", 6, int_pair, integer, div);
    binop("%", 6, int_pair, integer, rem);

    let minus = strings.intern("-");
    unops.register(types, minus, integer, integer, neg);
    let bang = strings.intern("!");
    unops.register(types, bang, boolean, boolean, not);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Annotations;

    fn setup() -> (Interner<str>, TypeInterner, BinopTable, UnopTable) {
        let mut strings = Interner::default();
        let mut types = TypeInterner::default();
        let mut binops = BinopTable::default();
        let mut unops = UnopTable::default();
        register_builtins(&mut strings, &mut types, &mut binops, &mut unops);
        (strings, types, binops, unops)
    }

    #[test]
    fn precedence_is_fixed_by_first_registration() {
        let (mut strings, mut types, mut binops, _) = setup();
        let plus = strings.intern("+");
        let boolean = types.boolean();
        binops.register(
            &mut types,
            plus,
            Precedence(1),
            Assoc::Right,
            (boolean, boolean),
            boolean,
            or,
        );
        let entry = binops.get(plus).unwrap();
        assert_eq!(entry.precedence, Precedence(5));
        assert_eq!(entry.assoc, Assoc::Left);
        assert_eq!(entry.overloads(), 2);
        assert_eq!(
            entry.lookup(&mut types, boolean, boolean).unwrap().result,
            boolean
        );
    }

    #[test]
    fn later_registration_replaces_overload() {
        let (mut strings, mut types, mut binops, _) = setup();
        let plus = strings.intern("+");
        let integer = types.integer();
        let boolean = types.boolean();
        binops.register(
            &mut types,
            plus,
            Precedence(5),
            Assoc::Left,
            (integer, integer),
            boolean,
            lt,
        );
        let entry = binops.get(plus).unwrap();
        assert_eq!(entry.overloads(), 1);
        assert_eq!(
            entry.lookup(&mut types, integer, integer).unwrap().result,
            boolean
        );
    }

    #[test]
    fn lookup_ignores_annotations() {
        let (mut strings, mut types, binops, unops) = setup();
        let integer = types.integer();
        let literal = types.annotated(integer, Annotations::LITERAL);

        let star = strings.intern("*");
        let found = binops.lookup(&mut types, star, literal, integer).unwrap();
        assert_eq!(found.result, integer);

        let minus = strings.intern("-");
        assert!(unops.lookup(&mut types, minus, literal).is_some());
    }

    #[test]
    fn missing_overloads() {
        let (mut strings, mut types, binops, unops) = setup();
        let integer = types.integer();
        let boolean = types.boolean();
        let plus = strings.intern("+");
        assert!(binops.lookup(&mut types, plus, integer, boolean).is_none());
        let bang = strings.intern("!");
        assert!(unops.lookup(&mut types, bang, integer).is_none());
        let caret = strings.intern("^");
        assert!(binops.get(caret).is_none());
        assert!(!unops.contains(caret));
    }
}
