use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// An interned identifier. Two `Symbol`s are equal iff their ids match;
/// all identifier comparisons in the compiler go through this type
/// instead of comparing strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize)]
pub struct Symbol(u32);

impl Symbol {
    pub const EMPTY: Symbol = Symbol(0);

    pub fn id(self) -> u32 {
        self.0
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::EMPTY
    }
}

struct InternerInner {
    map: HashMap<String, Symbol>,
    vec: Vec<String>,
}

impl InternerInner {
    fn new() -> Self {
        InternerInner {
            map: HashMap::new(),
            vec: vec![String::new()],
        }
    }

    fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.vec.len() as u32);
        self.vec.push(s.to_string());
        self.map.insert(s.to_string(), sym);
        sym
    }
}

/// Process-wide (per compilation session) identifier interner.
/// `intern` is idempotent and safe to call from multiple threads -
/// tests may drive several compilations concurrently, per the
/// concurrency & resource model.
#[derive(Clone)]
pub struct Interner {
    inner: Arc<Mutex<InternerInner>>,
}

impl Interner {
    pub fn new() -> Self {
        Interner {
            inner: Arc::new(Mutex::new(InternerInner::new())),
        }
    }

    pub fn intern(&self, s: &str) -> Symbol {
        self.inner.lock().unwrap().intern(s)
    }

    pub fn resolve(&self, sym: Symbol) -> String {
        self.inner.lock().unwrap().vec[sym.0 as usize].clone()
    }

    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.inner.lock().unwrap().map.get(s).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_symbol_for_same_string() {
        let interner = Interner::new();
        let s1 = interner.intern("hello");
        let s2 = interner.intern("hello");
        assert_eq!(s1, s2);
    }

    #[test]
    fn intern_returns_different_symbols_for_different_strings() {
        let interner = Interner::new();
        let s1 = interner.intern("hello");
        let s2 = interner.intern("world");
        assert_ne!(s1, s2);
    }

    #[test]
    fn resolve_returns_original_string() {
        let interner = Interner::new();
        let sym = interner.intern("test");
        assert_eq!(interner.resolve(sym), "test");
    }

    #[test]
    fn empty_symbol_resolves_to_empty_string() {
        let interner = Interner::new();
        assert_eq!(interner.resolve(Symbol::EMPTY), "");
    }

    #[test]
    fn lookup_does_not_create_new_entries() {
        let interner = Interner::new();
        assert_eq!(interner.lookup("missing"), None);
        assert_eq!(interner.len(), 1);
        interner.intern("missing");
        assert_eq!(interner.lookup("missing"), Some(Symbol(1)));
    }

    #[test]
    fn concurrent_interning_is_consistent() {
        use std::thread;
        let interner = Interner::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let interner = interner.clone();
                thread::spawn(move || interner.intern("shared"))
            })
            .collect();
        let symbols: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(symbols.windows(2).all(|w| w[0] == w[1]));
    }
}
