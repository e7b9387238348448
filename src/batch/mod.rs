pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, BatchError, BatchFormat};
pub use schema::{Batch, Operation, OperationKind, ValidationError, ValidationIssue};
