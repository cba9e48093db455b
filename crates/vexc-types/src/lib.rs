pub mod namespace;
pub mod ty;
pub mod unify;

pub use namespace::{Binding, Namespace, NamespaceManager};
pub use ty::{Scheme, Type};
pub use unify::{TypeError, UnificationTable};
