// MetaClass Symbol Table
//
// Interns member names so member tables and dispatch contexts compare names
// with O(1) id equality.

use std::collections::HashMap;

/// Unique identifier for an interned name (index into the symbol table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// An interned name
#[derive(Debug, Clone)]
pub struct Symbol {
    /// The name as declared (member names are case-sensitive)
    pub name: String,
    /// Reserved names are installed by the runtime itself (`_init`, `toString`)
    pub is_reserved: bool,
}

impl Symbol {
    pub fn new(name: String) -> Self {
        Self {
            name,
            is_reserved: false,
        }
    }
}

/// The runtime-wide symbol table
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// All symbols indexed by SymbolId
    symbols: Vec<Symbol>,
    /// Name -> SymbolId lookup
    names: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the existing id when already present.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol::new(name.to_string()));
        self.names.insert(name.to_string(), id);
        id
    }

    /// Intern a name owned by the runtime's bootstrap members.
    pub fn intern_reserved(&mut self, name: &str) -> SymbolId {
        let id = self.intern(name);
        self.symbols[id.0 as usize].is_reserved = true;
        id
    }

    /// Look up a name without interning it.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Name of a symbol, or `"?"` for ids from a foreign table.
    pub fn name(&self, id: SymbolId) -> &str {
        self.get(id).map(|s| s.name.as_str()).unwrap_or("?")
    }

    pub fn is_reserved(&self, id: SymbolId) -> bool {
        self.get(id).map(|s| s.is_reserved).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
