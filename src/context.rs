use crate::{
    ir::{FuncId, GlobalId, Value},
    ops::{self, BinopTable, UnopTable},
    scope::ScopeStack,
    types::{TypeId, TypeInterner},
    util::{fmt, intern::Interner},
};

/// Where the value of a name lives once code has been generated for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    /// Bound during typechecking; no code exists yet.
    Unresolved,
    /// A function declaration bound during typechecking.
    UnresolvedFunction,
    /// Address of a stack slot (or of a temporary aggregate).
    Local(Value),
    Global(GlobalId),
    Function(FuncId),
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub ty: TypeId,
    pub storage: Storage,
}

impl Binding {
    /// Whether the name denotes a function declaration, as opposed to a
    /// variable which may hold a function value.
    pub fn is_function(&self) -> bool {
        matches!(
            self.storage,
            Storage::Function(_) | Storage::UnresolvedFunction
        )
    }
}

/// State shared by every pass of a compilation unit.
pub struct Context {
    pub strings: Interner<str>,
    pub types: TypeInterner,
    pub binops: BinopTable,
    pub unops: UnopTable,
    pub scopes: ScopeStack<Binding>,
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    /// Creates a context with the builtin operators registered.
    pub fn new() -> Context {
        let mut cx = Context {
            strings: Interner::with_capacity(128),
            types: TypeInterner::default(),
            binops: BinopTable::default(),
            unops: UnopTable::default(),
            scopes: ScopeStack::new(),
        };
        ops::register_builtins(
            &mut cx.strings,
            &mut cx.types,
            &mut cx.binops,
            &mut cx.unops,
        );
        cx
    }

    pub fn fmt(&self) -> fmt::Context<'_> {
        fmt::Context {
            strings: &self.strings,
            types: &self.types,
        }
    }
}
