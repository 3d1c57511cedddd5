//! String arena for catalog entities
//!
//! Schema and table names repeat across thousands of columns. The arena stores
//! each distinct string once and hands out compact [`Sym`] handles.

use rustc_hash::FxHashMap;

/// Handle to a string interned in a [`StringArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sym(u32);

impl Sym {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only string interner
#[derive(Debug, Default)]
pub struct StringArena {
    strings: Vec<Box<str>>,
    lookup: FxHashMap<Box<str>, Sym>,
}

impl StringArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing handle if it was seen before
    pub fn intern(&mut self, s: &str) -> Sym {
        if let Some(&sym) = self.lookup.get(s) {
            return sym;
        }
        let sym = Sym(self.strings.len() as u32);
        self.strings.push(s.into());
        self.lookup.insert(s.into(), sym);
        sym
    }

    pub fn resolve(&self, sym: Sym) -> &str {
        &self.strings[sym.index()]
    }

    /// Number of distinct strings held
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.lookup.clear();
    }
}
