//! Repository layer — entity-scoped database operations.

mod audit;
mod visit;

// Re-export all public items from sub-modules
pub use audit::*;
pub use visit::*;
