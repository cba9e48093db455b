use std::collections::HashMap;

use vexc_syntax::Node;
use vexc_types::{NamespaceManager, Scheme, Type, UnificationTable};

/// Identifies a CST node by its address for the lifetime of one
/// analysis run. The Program is owned by the caller and never mutated
/// or reallocated between pass 2 and pass 3, so a node's address is a
/// stable, cheap key for the side-table of inferred types - simpler
/// than threading a parallel annotated tree through every pass given
/// `Node` carries no type slot of its own.
pub fn node_key(node: &Node) -> usize {
    node as *const Node as usize
}

/// Shared state threaded through passes 2-4: the union-find
/// substitution, a namespace manager seeded with built-ins, the
/// per-node inferred types recorded during pass 2, and the
/// cross-package data handed down from the resolver.
pub struct AnalysisContext {
    pub table: UnificationTable,
    pub interner: vexc_base::Interner,
    pub namespaces: NamespaceManager,
    pub node_types: HashMap<usize, Type>,
    pub exports: HashMap<String, std::collections::HashSet<String>>,
    pub pkg_schemes: HashMap<String, HashMap<String, Scheme>>,
    pub ignore_imports: std::collections::HashSet<String>,
}

impl AnalysisContext {
    pub fn new(
        interner: vexc_base::Interner,
        exports: HashMap<String, std::collections::HashSet<String>>,
        pkg_schemes: HashMap<String, HashMap<String, Scheme>>,
        ignore_imports: std::collections::HashSet<String>,
    ) -> Self {
        let namespaces = NamespaceManager::new(&interner);
        AnalysisContext {
            table: UnificationTable::new(),
            interner,
            namespaces,
            node_types: HashMap::new(),
            exports,
            pkg_schemes,
            ignore_imports,
        }
    }

    pub fn record_type(&mut self, node: &Node, ty: Type) {
        self.node_types.insert(node_key(node), ty);
    }

    pub fn type_of(&self, node: &Node) -> Type {
        self.node_types.get(&node_key(node)).cloned().unwrap_or(Type::Unknown(u32::MAX))
    }
}
