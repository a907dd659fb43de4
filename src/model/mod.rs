//! The build-evaluation engine seen from the document side.
//!
//! The engine turns a project file into evaluated objects (properties, items,
//! targets...) that remember where in the source they came from. This crate
//! never evaluates anything itself; it only asks the engine to load, reconcile
//! and unload, then reads [`EvaluatedObject`]s back.

mod engine;
mod object;

pub use engine::{EvaluatedProject, EvaluationEngine, EvaluationError};
pub use object::{EvaluatedObject, ObjectHandle, ObjectKind, SourceLocation};
