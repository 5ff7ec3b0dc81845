use rustc_hash::FxHashMap;

use crate::{ice, util::intern::Symbol};

/// A stack of lexical scopes. The outermost (global) scope is never popped.
#[derive(Debug)]
pub struct ScopeStack<T> {
    scopes: Vec<FxHashMap<Symbol, T>>,
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        ScopeStack::new()
    }
}

impl<T> ScopeStack<T> {
    pub fn new() -> ScopeStack<T> {
        ScopeStack {
            scopes: vec![FxHashMap::default()],
        }
    }

    pub fn push(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop(&mut self) {
        if self.scopes.len() == 1 {
            ice!("popped the global scope");
        }
        self.scopes.pop();
    }

    /// Number of open scopes, including the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_global(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Binds `name` in the innermost scope, returning the binding it replaced
    /// in that same scope, if any.
    pub fn bind(&mut self, name: Symbol, value: T) -> Option<T> {
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name, value),
            None => ice!("scope stack is empty"),
        }
    }

    /// Finds the innermost binding of `name`.
    pub fn lookup(&self, name: Symbol) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&name))
    }

    /// Finds a binding of `name` in the innermost scope only.
    pub fn lookup_local(&self, name: Symbol) -> Option<&T> {
        self.scopes.last().and_then(|scope| scope.get(&name))
    }

    /// Drops every binding, leaving a single empty global scope.
    pub fn reset(&mut self) {
        self.scopes.truncate(1);
        self.scopes[0].clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::intern::Interner;

    #[test]
    fn shadowing_is_undone_by_pop() {
        let mut strings = Interner::<str>::default();
        let x = strings.intern("x");
        let y = strings.intern("y");

        let mut scopes = ScopeStack::new();
        scopes.bind(x, 1);
        scopes.push();
        assert_eq!(scopes.lookup(x), Some(&1));
        assert_eq!(scopes.lookup_local(x), None);
        scopes.bind(x, 2);
        scopes.bind(y, 3);
        assert_eq!(scopes.lookup(x), Some(&2));
        assert_eq!(scopes.depth(), 2);
        scopes.pop();
        assert_eq!(scopes.lookup(x), Some(&1));
        assert_eq!(scopes.lookup(y), None);
        assert!(scopes.is_global());
    }

    #[test]
    fn rebinding_in_same_scope_returns_previous() {
        let mut strings = Interner::<str>::default();
        let x = strings.intern("x");
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.bind(x, 'a'), None);
        assert_eq!(scopes.bind(x, 'b'), Some('a'));
    }

    #[test]
    fn reset_clears_everything() {
        let mut strings = Interner::<str>::default();
        let x = strings.intern("x");
        let mut scopes = ScopeStack::new();
        scopes.bind(x, ());
        scopes.push();
        scopes.push();
        scopes.reset();
        assert_eq!(scopes.depth(), 1);
        assert_eq!(scopes.lookup(x), None);
    }

    #[test]
    #[should_panic(expected = "internal compiler error")]
    fn popping_global_scope_is_an_ice() {
        ScopeStack::<()>::new().pop();
    }
}
