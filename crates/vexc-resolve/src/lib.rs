pub mod combined;
pub mod discovery;
pub mod graph;
pub mod manifest;
pub mod schemes;

pub use combined::{resolve_program, CombinedProgram};
pub use discovery::{find_project_root, ImportItem, Package};
pub use manifest::Manifest;
pub use schemes::infer_package_schemes;
