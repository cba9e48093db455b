use std::fmt;

/// A type term. `Unknown` is a type variable minted during inference;
/// `Named` is a user-declared type, compared by name only (the spec
/// treats it as a placeholder - no structural decomposition).
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    SymbolType,
    List(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Function(Vec<Type>, Box<Type>),
    Unknown(u32),
    Named(String),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Collects the `Unknown` ids free in this type, in first-occurrence
    /// order - used both by the occurs check and by scheme
    /// generalization.
    pub fn free_vars(&self, out: &mut Vec<u32>) {
        match self {
            Type::Unknown(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            Type::List(elem) => elem.free_vars(out),
            Type::Map(k, v) => {
                k.free_vars(out);
                v.free_vars(out);
            }
            Type::Function(params, result) => {
                for p in params {
                    p.free_vars(out);
                }
                result.free_vars(out);
            }
            Type::Int | Type::Float | Type::String | Type::Bool | Type::SymbolType | Type::Named(_) => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Bool => write!(f, "bool"),
            Type::SymbolType => write!(f, "symbol"),
            Type::List(elem) => write!(f, "list<{}>", elem),
            Type::Map(k, v) => write!(f, "map<{}, {}>", k, v),
            Type::Function(params, result) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ") -> {}", result)
            }
            Type::Unknown(id) => write!(f, "?{}", id),
            Type::Named(name) => write!(f, "{}", name),
        }
    }
}

/// A type with quantified type variables, instantiated afresh per use
/// site - the vehicle for rank-1 let-polymorphism on package exports.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    pub quantified: Vec<u32>,
    pub body: Type,
}

impl Scheme {
    pub fn monomorphic(ty: Type) -> Self {
        Scheme { quantified: Vec::new(), body: ty }
    }

    /// Generalizes `ty` over every `Unknown` it contains, i.e. a
    /// top-level `def (fn ...)` export gets the broadest scheme its
    /// inferred type supports.
    pub fn generalize(ty: Type) -> Self {
        let mut vars = Vec::new();
        ty.free_vars(&mut vars);
        Scheme { quantified: vars, body: ty }
    }
}
