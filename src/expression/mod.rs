//! Expressions embedded in attribute and element text values
//!
//! ```text
//! "@(Compile->'%(Filename)');$(Extra) ; B"
//!     ↓ scan (one pass, never fails)
//! List
//! ├── ListItem ── ItemReference ── ItemTransform
//! ├── ListSeparator
//! ├── ListItem ── PropertyReference
//! ├── ListSeparator (" ; ")
//! └── ListItem ── Literal
//! ```
//!
//! All spans are absolute document offsets: the caller passes the offset of
//! the value's first character when parsing.

mod parser;
mod tree;

pub use parser::parse_expression;
pub use tree::{Descendants, Expression, ExpressionKind, ExpressionNode, NodeId};
