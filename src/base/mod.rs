//! Foundation types.
//!
//! - [`Position`], [`Range`] - line/column locations with an explicit numbering base
//! - [`LineIndex`] - offset ↔ position conversion for one text snapshot
//! - [`TextRange`], [`TextSize`] - absolute spans (byte offsets)
//!
//! This module has NO dependencies on other crate modules.

mod line_index;
mod position;

pub use line_index::{LineIndex, PositionError};
pub use position::{Position, PositionBase, Range};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
