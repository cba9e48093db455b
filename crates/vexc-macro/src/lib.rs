pub mod expander;
pub mod registry;
pub mod stdlib;

pub use expander::{expand_program, substitute_params};
pub use registry::{is_reserved, Macro, MacroRegistry, RESERVED_WORDS};
pub use stdlib::{load_core_macros, load_stdlib_module, CORE_MODULE};
