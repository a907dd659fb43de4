//! Typed AST wrappers over the untyped rowan CST.
//!
//! Each struct wraps a SyntaxNode and provides methods to access children.

use rowan::{TextRange, TextSize};
use smol_str::SmolStr;

use super::syntax_kind::SyntaxKind;
use super::{SyntaxNode, SyntaxToken};

/// Trait for AST nodes that wrap a SyntaxNode
pub trait AstNode: Sized {
    fn can_cast(kind: SyntaxKind) -> bool;
    fn cast(node: SyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &SyntaxNode;
}

// ============================================================================
// Helper macros
// ============================================================================

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                kind == SyntaxKind::$kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn first_token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

// ============================================================================
// Document
// ============================================================================

ast_node!(Document, DOCUMENT);

impl Document {
    /// The first top-level element (`<Project>` in a well-formed file).
    pub fn root_element(&self) -> Option<Element> {
        self.0.children().find_map(Element::cast)
    }
}

// ============================================================================
// Elements
// ============================================================================

ast_node!(Element, ELEMENT);

impl Element {
    pub fn start_tag(&self) -> Option<SyntaxNode> {
        self.0
            .children()
            .find(|n| n.kind() == SyntaxKind::START_TAG)
    }

    pub fn end_tag(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind() == SyntaxKind::END_TAG)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        first_token(&self.start_tag()?, SyntaxKind::NAME)
    }

    pub fn name(&self) -> Option<SmolStr> {
        self.name_token().map(|t| SmolStr::new(t.text()))
    }

    /// `<Foo />` rather than `<Foo></Foo>`.
    pub fn is_empty_element(&self) -> bool {
        self.start_tag()
            .and_then(|tag| tag.last_token())
            .is_some_and(|t| t.kind() == SyntaxKind::SLASH_R_ANGLE)
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + use<> {
        self.start_tag()
            .into_iter()
            .flat_map(|tag| tag.children().filter_map(Attribute::cast))
    }

    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attributes()
            .find(|a| a.name().as_deref() == Some(name))
    }

    pub fn child_elements(&self) -> impl Iterator<Item = Element> + use<> {
        self.0.children().filter_map(Element::cast)
    }

    /// Text content directly inside this element.
    pub fn text(&self) -> Option<Text> {
        self.0.children().find_map(Text::cast)
    }

    pub fn parent_element(&self) -> Option<Element> {
        self.0.ancestors().skip(1).find_map(Element::cast)
    }
}

// ============================================================================
// Attributes
// ============================================================================

ast_node!(Attribute, ATTRIBUTE);

impl Attribute {
    pub fn name(&self) -> Option<SmolStr> {
        first_token(&self.0, SyntaxKind::NAME).map(|t| SmolStr::new(t.text()))
    }

    pub fn value(&self) -> Option<AttributeValue> {
        self.0.children().find_map(AttributeValue::cast)
    }

    pub fn element(&self) -> Option<Element> {
        self.0.ancestors().find_map(Element::cast)
    }
}

ast_node!(AttributeValue, ATTRIBUTE_VALUE);

impl AttributeValue {
    /// The value without its quotes.
    pub fn text(&self) -> String {
        let raw = self.0.text().to_string();
        let range = unquoted(&raw);
        raw[range].to_string()
    }

    /// Absolute range of the value without its quotes.
    pub fn content_range(&self) -> TextRange {
        let raw = self.0.text().to_string();
        let inner = unquoted(&raw);
        let start = self.0.text_range().start();
        TextRange::new(
            start + TextSize::new(inner.start as u32),
            start + TextSize::new(inner.end as u32),
        )
    }
}

/// Byte range of a quoted value's content, tolerating a missing close quote.
fn unquoted(raw: &str) -> std::ops::Range<usize> {
    let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return 0..raw.len();
    };
    let end = if raw.len() > 1 && raw.ends_with(quote) {
        raw.len() - 1
    } else {
        raw.len()
    };
    1..end
}

// ============================================================================
// Text
// ============================================================================

ast_node!(Text, TEXT);

impl Text {
    pub fn value(&self) -> String {
        self.0.text().to_string()
    }

    pub fn range(&self) -> TextRange {
        self.0.text_range()
    }
}
