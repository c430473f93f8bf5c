//! Lexical scope stacks. A compilation keeps one table per namespace
//! (variables and functions are looked up independently, so a name may
//! denote both).

use std::collections::HashMap;

/// One scope frame: the symbols declared at a single nesting level.
#[derive(Debug)]
pub struct Scope<T> {
    symbols: HashMap<String, T>,
}

impl<T> Scope<T> {
    fn add(&mut self, name: &str, info: T) {
        self.symbols.insert(name.to_owned(), info);
    }

    fn find(&self, name: &str) -> Option<&T> {
        self.symbols.get(name)
    }
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Scope {
            symbols: HashMap::new(),
        }
    }
}

/// A stack of scope frames plus a monotonically increasing symbol
/// index. Indices are never reused within the table's lifetime; later
/// stages use them to identify storage locations independent of names.
#[derive(Debug)]
pub struct SymbolTable<T> {
    scopes: Vec<Scope<T>>,
    sym_idx: usize,
}

impl<T> SymbolTable<T> {
    /// A table with the module frame already in place.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
            sym_idx: 0,
        }
    }

    /// The index the next `add` will hand out.
    pub fn sym_idx(&self) -> usize {
        self.sym_idx
    }

    /// Bind `name` in the innermost frame and advance the index.
    pub fn add(&mut self, name: &str, info: T) {
        self.scopes
            .last_mut()
            .expect("symbol table has no scopes")
            .add(name, info);
        self.sym_idx += 1;
    }

    /// Search every frame, innermost first.
    pub fn find(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.find(name))
    }

    /// Search the innermost frame only. Redefinition checks go through
    /// here so shadowing an outer binding stays legal.
    pub fn find_in_current(&self, name: &str) -> Option<&T> {
        self.scopes.last().and_then(|scope| scope.find(name))
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost frame. The module frame outlives every pass
    /// and must never be popped.
    pub fn exit_scope(&mut self) {
        assert!(self.scopes.len() > 1, "attempted to pop the module scope");
        self.scopes.pop();
    }
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
