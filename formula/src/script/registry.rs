//! Symbol registry: operators, functions and variables.
//!
//! All three tables preserve insertion order.  For operators the order is
//! semantic: the flat reducer exhausts each operator, left to right, in
//! table order, so registration order *is* precedence.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{EvalError, Result};

/// Binary reducer registered under an operator symbol.
pub type Operator = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Variadic reducer registered under a function name.
pub type Function = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Characters that are structural punctuation, never operators.
pub const RESERVED: [&str; 3] = ["(", ")", ","];

// ── SymbolTable ───────────────────────────────────────────────────────────────

/// An insertion-ordered map from names to values.
///
/// Entries live in a `Vec` (iteration order) with a `HashMap` index for
/// lookups.  Replacing an existing name keeps its position.
#[derive(Clone)]
pub struct SymbolTable<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        SymbolTable {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> SymbolTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.  Returns `true` if the name was new.
    pub fn insert(&mut self, name: impl Into<String>, value: V) -> bool {
        let name = name.into();
        if let Some(&i) = self.index.get(&name) {
            self.entries[i].1 = value;
            false
        } else {
            self.index.insert(name.clone(), self.entries.len());
            self.entries.push((name, value));
            true
        }
    }

    /// Insert a new entry directly before `anchor`, or move an existing one
    /// there.  Appends when `anchor` is not present.
    pub fn insert_before(&mut self, anchor: &str, name: impl Into<String>, value: V) {
        let name = name.into();
        self.remove(&name);
        let at = self.position(anchor).unwrap_or(self.entries.len());
        self.entries.insert(at, (name, value));
        self.reindex();
    }

    /// Remove an entry, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<V> {
        let i = self.index.remove(name)?;
        let (_, value) = self.entries.remove(i);
        self.reindex();
        Some(value)
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        let i = *self.index.get(name)?;
        Some(&mut self.entries[i].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Position of `name` in iteration order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
    }
}

impl<V: fmt::Debug> fmt::Debug for SymbolTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

// ── OperatorTable ─────────────────────────────────────────────────────────────

/// The ordered operator table.
///
/// Wraps a [`SymbolTable`] so that reserved punctuation can never become an
/// operator key.
#[derive(Clone, Default)]
pub struct OperatorTable {
    table: SymbolTable<Operator>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace in place) an operator.  New symbols go last,
    /// i.e. they bind loosest.
    pub fn insert<F>(&mut self, symbol: impl Into<String>, f: F) -> Result<bool>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let symbol = checked_symbol(symbol.into())?;
        Ok(self.table.insert(symbol, Arc::new(f)))
    }

    /// Register an operator so that it is reduced just before `anchor`.
    pub fn insert_before<F>(&mut self, anchor: &str, symbol: impl Into<String>, f: F) -> Result<()>
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let symbol = checked_symbol(symbol.into())?;
        self.table.insert_before(anchor, symbol, Arc::new(f));
        Ok(())
    }

    /// Register a symbol known not to be reserved.
    pub(crate) fn insert_builtin<F>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let symbol = symbol.into();
        debug_assert!(!RESERVED.contains(&symbol.as_str()));
        self.table.insert(symbol, Arc::new(f));
    }

    pub fn remove(&mut self, symbol: &str) -> Option<Operator> {
        self.table.remove(symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&Operator> {
        self.table.get(symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.table.contains(symbol)
    }

    /// Entries in reduction order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Operator)> {
        self.table.iter()
    }

    /// Symbols in reduction order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.table.names()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.symbols()).finish()
    }
}

fn checked_symbol(symbol: String) -> Result<String> {
    if symbol.is_empty() || RESERVED.contains(&symbol.as_str()) {
        return Err(EvalError::ReservedSymbol(symbol));
    }
    Ok(symbol)
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// The three tables owned by one evaluator instance.
#[derive(Clone, Default)]
pub struct Registry {
    pub operators: OperatorTable,
    pub functions: SymbolTable<Function>,
    pub variables: SymbolTable<f64>,
}

impl Registry {
    /// An empty registry: no operators, functions or variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a function.
    pub fn add_function<F>(&mut self, name: impl Into<String>, f: F) -> bool
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.functions.insert(name, Arc::new(f))
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    pub fn is_operator(&self, symbol: &str) -> bool {
        self.operators.contains(symbol)
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) -> bool {
        self.variables.insert(name, value)
    }

    pub fn variable(&self, name: &str) -> Option<f64> {
        self.variables.get(name).copied()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("operators", &self.operators)
            .field("functions", &self.functions.names().collect::<Vec<_>>())
            .field("variables", &self.variables)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
