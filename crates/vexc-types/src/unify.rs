use std::collections::HashMap;

use crate::ty::Type;

/// A type error surfaced by unification, independent of any particular
/// diagnostic code - the analyzer translates these into `VEX-TYPE-...`
/// diagnostics with source positions attached.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeError {
    Mismatch { expected: Type, found: Type, context: String },
    InfiniteType { var: u32, ty: Type },
    ArityMismatch { expected: usize, found: usize },
    NotAFunction { found: Type },
}

/// Union-find-backed substitution plus a fresh-variable counter. One
/// instance per compilation session (owned by the analyzer's pass 2).
#[derive(Debug, Default)]
pub struct UnificationTable {
    subst: HashMap<u32, Type>,
    next_id: u32,
}

impl UnificationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self) -> Type {
        let id = self.next_id;
        self.next_id += 1;
        Type::Unknown(id)
    }

    /// Fully resolves `ty` against the current substitution. Recursing
    /// through chained bindings at apply-time (rather than mutating
    /// stored entries) keeps `apply` idempotent: `apply(apply(t)) ==
    /// apply(t)` holds because a second pass finds nothing left to
    /// resolve.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Unknown(id) => match self.subst.get(id) {
                Some(bound) => self.apply(bound),
                None => ty.clone(),
            },
            Type::List(elem) => Type::List(Box::new(self.apply(elem))),
            Type::Map(k, v) => Type::Map(Box::new(self.apply(k)), Box::new(self.apply(v))),
            Type::Function(params, result) => Type::Function(
                params.iter().map(|p| self.apply(p)).collect(),
                Box::new(self.apply(result)),
            ),
            other => other.clone(),
        }
    }

    /// Unifies two types under the given context string (used only for
    /// error messages, e.g. "if-branch", "call argument 2").
    pub fn unify(&mut self, left: &Type, right: &Type, context: &str) -> Result<(), TypeError> {
        let left = self.apply(left);
        let right = self.apply(right);
        match (&left, &right) {
            (a, b) if a == b => Ok(()),
            (Type::Unknown(id), other) | (other, Type::Unknown(id)) => self.bind(*id, other.clone()),
            (Type::List(a), Type::List(b)) => self.unify(a, b, context),
            (Type::Map(ak, av), Type::Map(bk, bv)) => {
                self.unify(ak, bk, context)?;
                self.unify(av, bv, context)
            }
            (Type::Function(aps, ar), Type::Function(bps, br)) => {
                if aps.len() != bps.len() {
                    return Err(TypeError::ArityMismatch { expected: aps.len(), found: bps.len() });
                }
                for (a, b) in aps.iter().zip(bps.iter()) {
                    self.unify(a, b, context)?;
                }
                self.unify(ar, br, context)
            }
            (Type::Int, Type::Float) | (Type::Float, Type::Int) => {
                // Int-to-float promotion: the common type is Float, but
                // unify doesn't rewrite either side here - callers that
                // need the promoted common type compute it explicitly
                // (see analyze's arithmetic rule).
                Ok(())
            }
            _ => Err(TypeError::Mismatch {
                expected: left.clone(),
                found: right.clone(),
                context: context.to_string(),
            }),
        }
    }

    fn bind(&mut self, id: u32, ty: Type) -> Result<(), TypeError> {
        if let Type::Unknown(other) = ty {
            if other == id {
                return Ok(());
            }
        }
        if occurs(id, &ty, self) {
            return Err(TypeError::InfiniteType { var: id, ty });
        }
        self.subst.insert(id, ty);
        Ok(())
    }

    /// Replaces every `Unknown` left unresolved in `ty` with nothing -
    /// i.e. returns the fully-applied type as-is. Unsolved variables
    /// stay as `Unknown`; callers (codegen) treat those as `any`.
    pub fn zonk(&self, ty: &Type) -> Type {
        self.apply(ty)
    }
}

fn occurs(id: u32, ty: &Type, table: &UnificationTable) -> bool {
    match table.apply(ty) {
        Type::Unknown(other) => other == id,
        Type::List(elem) => occurs(id, &elem, table),
        Type::Map(k, v) => occurs(id, &k, table) || occurs(id, &v, table),
        Type::Function(params, result) => {
            params.iter().any(|p| occurs(id, p, table)) || occurs(id, &result, table)
        }
        _ => false,
    }
}
