//! Lossless, error-tolerant XML syntax tree for project documents
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos, content/tag modes) → Tokens with SyntaxKind
//!     ↓
//! Parser → GreenNode tree (immutable, cheap to clone, Send + Sync)
//!     ↓
//! SyntaxNode (rowan) → CST with parent pointers and absolute ranges
//!     ↓
//! ast → typed wrappers (Element, Attribute, Text)
//! ```
//!
//! Edits never mutate a tree; every revision is a fresh parse.

pub mod ast;
mod lexer;
mod parser;
mod syntax_kind;

pub use lexer::{Lexer, Token, tokenize};
pub use parser::{Parse, SyntaxError, parse};
pub use syntax_kind::{NodeKind, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, XmlLanguage};

use rowan::{TextSize, TokenAtOffset};

/// The innermost node at an offset.
///
/// On a boundary between two tokens the one starting at the offset wins,
/// unless it is whitespace (the cursor then belongs to what precedes it).
pub fn node_at_offset(root: &SyntaxNode, offset: TextSize) -> Option<SyntaxNode> {
    if offset > root.text_range().end() {
        return None;
    }
    let token = match root.token_at_offset(offset) {
        TokenAtOffset::None => return Some(root.clone()),
        TokenAtOffset::Single(token) => token,
        TokenAtOffset::Between(left, right) => {
            if right.kind().is_trivia() {
                left
            } else {
                right
            }
        }
    };
    token.parent()
}
