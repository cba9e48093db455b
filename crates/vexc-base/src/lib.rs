pub mod diagnostic;
pub mod intern;
pub mod position;
pub mod style;

pub use diagnostic::{Diagnostic, DiagnosticSink, Severity};
pub use intern::{Interner, Symbol};
pub use position::Position;
