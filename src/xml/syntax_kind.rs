//! Syntax kinds for the Rowan-based XML CST
//!
//! Tokens are leaf nodes (names, quoted values, text, punctuation).
//! Nodes are composite (elements, tags, attributes).

/// All syntax kinds (tokens and nodes) in a project document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // =========================================================================
    // TOKENS
    // =========================================================================
    WHITESPACE = 0,
    TEXT_CHUNK,         // character data between tags
    CDATA_CHUNK,        // <![CDATA[ ... ]]>
    COMMENT_CHUNK,      // <!-- ... -->
    PI_CHUNK,           // <? ... ?>
    NAME,               // element / attribute name
    QUOTED,             // "value" or 'value' (possibly unterminated)
    L_ANGLE,            // <
    L_ANGLE_SLASH,      // </
    R_ANGLE,            // >
    SLASH_R_ANGLE,      // />
    EQ,                 // =
    ERROR_TOKEN,

    // =========================================================================
    // NODES
    // =========================================================================
    DOCUMENT,
    ELEMENT,
    START_TAG,
    END_TAG,
    ATTRIBUTE,
    ATTRIBUTE_VALUE,
    TEXT,
    COMMENT,
    PROCESSING_INSTRUCTION,
    ERROR,

    #[doc(hidden)]
    __LAST,
}

impl SyntaxKind {
    /// Check if this is a trivia token
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE)
    }

    /// Check if this kind is a token (leaf) rather than a node
    pub fn is_token(self) -> bool {
        (self as u16) <= (Self::ERROR_TOKEN as u16)
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        Self(kind as u16)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        assert!(raw.0 < SyntaxKind::__LAST as u16);
        // Safety: we control all syntax kinds and check bounds above
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }
}

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XmlLanguage {}

impl rowan::Language for XmlLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<XmlLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<XmlLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<XmlLanguage>;

/// The broad category of a syntax node, as seen by positional consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    Comment,
    Other,
}

impl NodeKind {
    pub fn of(kind: SyntaxKind) -> Self {
        match kind {
            SyntaxKind::ELEMENT | SyntaxKind::START_TAG | SyntaxKind::END_TAG => Self::Element,
            SyntaxKind::ATTRIBUTE | SyntaxKind::ATTRIBUTE_VALUE => Self::Attribute,
            SyntaxKind::TEXT => Self::Text,
            SyntaxKind::COMMENT => Self::Comment,
            _ => Self::Other,
        }
    }
}
