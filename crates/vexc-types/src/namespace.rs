use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use vexc_base::Symbol;

use crate::ty::Type;

/// A name's association with a type in a specific namespace. `bind`
/// overwrites any prior binding for the same name in the same scope,
/// which lets inference refine a binding's type as more constraints
/// are solved.
#[derive(Debug, Clone)]
pub struct Binding {
    pub symbol: Symbol,
    pub ty: Type,
    pub is_mutable: bool,
    pub is_function: bool,
    pub owning_namespace: Weak<RefCell<Namespace>>,
}

/// A lexical scope with an optional parent. The root namespace is
/// `global`.
#[derive(Debug)]
pub struct Namespace {
    pub name: String,
    pub parent: Option<Rc<RefCell<Namespace>>>,
    bindings: HashMap<Symbol, Binding>,
}

impl Namespace {
    pub fn new_root(name: impl Into<String>) -> Rc<RefCell<Namespace>> {
        Rc::new(RefCell::new(Namespace { name: name.into(), parent: None, bindings: HashMap::new() }))
    }

    pub fn new_child(parent: &Rc<RefCell<Namespace>>, name: impl Into<String>) -> Rc<RefCell<Namespace>> {
        Rc::new(RefCell::new(Namespace {
            name: name.into(),
            parent: Some(parent.clone()),
            bindings: HashMap::new(),
        }))
    }

    /// Unconditionally records a binding, overwriting any existing
    /// binding for `symbol` in this scope.
    pub fn bind(this: &Rc<RefCell<Namespace>>, symbol: Symbol, ty: Type, is_mutable: bool, is_function: bool) {
        let binding = Binding { symbol, ty, is_mutable, is_function, owning_namespace: Rc::downgrade(this) };
        this.borrow_mut().bindings.insert(symbol, binding);
    }

    /// Inspects only this namespace, not its parents.
    pub fn local_resolve(this: &Rc<RefCell<Namespace>>, symbol: Symbol) -> Option<Binding> {
        this.borrow().bindings.get(&symbol).cloned()
    }

    /// Walks parents until a match or the root.
    pub fn resolve(this: &Rc<RefCell<Namespace>>, symbol: Symbol) -> Option<Binding> {
        let mut current = this.clone();
        loop {
            if let Some(binding) = current.borrow().bindings.get(&symbol).cloned() {
                return Some(binding);
            }
            let parent = current.borrow().parent.clone();
            match parent {
                Some(p) => current = p,
                None => return None,
            }
        }
    }
}

/// Owns the `global` namespace and any additional named namespaces
/// (one per resolved package) so that `pkg/name` qualified lookups can
/// resolve in the named namespace only, per the interner & namespaces
/// contract.
pub struct NamespaceManager {
    pub global: Rc<RefCell<Namespace>>,
    named: HashMap<String, Rc<RefCell<Namespace>>>,
}

impl NamespaceManager {
    /// Constructs a manager with built-ins bound once in `global`:
    /// scalar type names, `true`/`false`, and primitive arithmetic
    /// operators typed `(int, int) -> int`.
    pub fn new(interner: &vexc_base::Interner) -> Self {
        let global = Namespace::new_root("global");
        for name in ["int", "float", "string", "bool", "symbol"] {
            let sym = interner.intern(name);
            Namespace::bind(&global, sym, Type::Named(name.to_string()), false, false);
        }
        let bool_true = interner.intern("true");
        Namespace::bind(&global, bool_true, Type::Bool, false, false);
        let bool_false = interner.intern("false");
        Namespace::bind(&global, bool_false, Type::Bool, false, false);

        let arith_ty = Type::Function(vec![Type::Int, Type::Int], Box::new(Type::Int));
        for op in ["+", "-", "*", "/"] {
            let sym = interner.intern(op);
            Namespace::bind(&global, sym, arith_ty.clone(), false, true);
        }

        NamespaceManager { global, named: HashMap::new() }
    }

    pub fn register_named(&mut self, name: impl Into<String>, namespace: Rc<RefCell<Namespace>>) {
        self.named.insert(name.into(), namespace);
    }

    pub fn named(&self, name: &str) -> Option<Rc<RefCell<Namespace>>> {
        self.named.get(name).cloned()
    }

    /// Splits `name` on the first `/`: unqualified names resolve in
    /// `current`'s namespace chain; qualified names resolve in the
    /// named namespace only (not its parents).
    pub fn resolve_qualified(
        &self,
        current: &Rc<RefCell<Namespace>>,
        interner: &vexc_base::Interner,
        name: &str,
    ) -> Option<Binding> {
        if let Some((pkg, rest)) = name.split_once('/') {
            let ns = self.named(pkg)?;
            let sym = interner.lookup(rest)?;
            Namespace::local_resolve(&ns, sym)
        } else {
            let sym = interner.lookup(name)?;
            Namespace::resolve(current, sym)
        }
    }
}
