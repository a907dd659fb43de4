//! Recursive descent parser for project documents
//!
//! Builds a rowan GreenNode tree from tokens. The parser never fails: every
//! token ends up in the tree, so the root's text is the input byte for byte,
//! and problems are collected as [`SyntaxError`]s.

use super::lexer::{Lexer, Token};
use super::syntax_kind::SyntaxKind;
use rowan::{GreenNode, GreenNodeBuilder, TextRange, TextSize};
use smol_str::SmolStr;

/// A lossless tree for the whole input and the problems found on the way.
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    /// Root `DOCUMENT` node.
    pub fn syntax(&self) -> super::SyntaxNode {
        super::SyntaxNode::new_root(self.green.clone())
    }

    /// Whether the input was well-formed.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A well-formedness problem and where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// Parse document text into a CST
pub fn parse(input: &str) -> Parse {
    let tokens: Vec<_> = Lexer::new(input).collect();
    let mut parser = Parser::new(&tokens, TextSize::of(input));
    parser.parse_document();
    parser.finish()
}

/// Cursor over the token stream plus the tree under construction.
struct Parser<'a> {
    tokens: &'a [Token<'a>],
    pos: usize,
    end: TextSize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    /// Names of the elements currently open, outermost first.
    open: Vec<Option<SmolStr>>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token<'a>], end: TextSize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            open: Vec::new(),
        }
    }

    fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> SyntaxKind {
        self.current()
            .map(|t| t.kind)
            .unwrap_or(SyntaxKind::ERROR_TOKEN)
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.current().is_some_and(|t| t.kind == kind)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Kind of the next non-trivia token at or after the cursor.
    fn peek_non_trivia(&self) -> Option<SyntaxKind> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .map(|t| t.kind)
            .find(|k| !k.is_trivia())
    }

    fn current_range(&self) -> TextRange {
        self.current()
            .map(|t| TextRange::at(t.offset, TextSize::of(t.text)))
            .unwrap_or_else(|| TextRange::empty(self.end))
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) {
        if let Some(token) = self.current() {
            self.builder.token(token.kind.into(), token.text);
            self.pos += 1;
        }
    }

    fn skip_trivia(&mut self) {
        while self.current().is_some_and(|t| t.kind.is_trivia()) {
            self.bump();
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        self.errors.push(SyntaxError::new(message, range));
    }

    fn error_token(&mut self, message: impl Into<String>) {
        self.error(message);
        self.start_node(SyntaxKind::ERROR);
        self.bump();
        self.finish_node();
    }

    fn start_node(&mut self, kind: SyntaxKind) {
        self.builder.start_node(kind.into());
    }

    fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_document(&mut self) {
        self.start_node(SyntaxKind::DOCUMENT);
        while !self.at_eof() {
            if self.at(SyntaxKind::L_ANGLE_SLASH) {
                self.parse_stray_end_tag();
            } else {
                self.parse_content_item();
            }
        }
        self.finish_node();
    }

    /// One item of element content (or document prolog / epilog).
    fn parse_content_item(&mut self) {
        match self.current_kind() {
            SyntaxKind::WHITESPACE => self.bump(),
            SyntaxKind::TEXT_CHUNK | SyntaxKind::CDATA_CHUNK => {
                self.start_node(SyntaxKind::TEXT);
                while self.at(SyntaxKind::TEXT_CHUNK) || self.at(SyntaxKind::CDATA_CHUNK) {
                    self.bump();
                }
                self.finish_node();
            }
            SyntaxKind::COMMENT_CHUNK => {
                if !self.current().is_some_and(|t| t.text.ends_with("-->")) {
                    self.error("unterminated comment");
                }
                self.start_node(SyntaxKind::COMMENT);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::PI_CHUNK => {
                self.start_node(SyntaxKind::PROCESSING_INSTRUCTION);
                self.bump();
                self.finish_node();
            }
            SyntaxKind::L_ANGLE => self.parse_element(),
            _ => self.error_token("unexpected input"),
        }
    }

    fn parse_element(&mut self) {
        let element_start = self.current_range();
        self.start_node(SyntaxKind::ELEMENT);
        self.start_node(SyntaxKind::START_TAG);
        self.bump(); // '<'

        let name = if self.at(SyntaxKind::NAME) {
            let name = self.current().map(|t| SmolStr::new(t.text));
            self.bump();
            name
        } else {
            self.error("expected element name");
            None
        };

        loop {
            self.skip_trivia();
            match self.current_kind() {
                _ if self.at_eof() => {
                    self.error("expected '>'");
                    self.finish_node();
                    self.finish_node();
                    return;
                }
                SyntaxKind::NAME => self.parse_attribute(),
                SyntaxKind::R_ANGLE => {
                    self.bump();
                    self.finish_node();
                    break;
                }
                SyntaxKind::SLASH_R_ANGLE => {
                    self.bump();
                    self.finish_node();
                    self.finish_node();
                    return;
                }
                SyntaxKind::L_ANGLE | SyntaxKind::L_ANGLE_SLASH => {
                    // A new tag begins before this one was closed.
                    self.error("expected '>'");
                    self.finish_node();
                    self.finish_node();
                    return;
                }
                _ => self.error_token("unexpected input in tag"),
            }
        }

        self.open.push(name.clone());
        loop {
            if self.at_eof() {
                self.errors.push(SyntaxError::new(
                    format!("element '{}' is not closed", name.as_deref().unwrap_or("")),
                    element_start,
                ));
                break;
            }
            if self.at(SyntaxKind::L_ANGLE_SLASH) {
                let end_name = self.end_tag_name();
                let matches_self = name.is_none() || end_name.is_none() || end_name == name;
                if matches_self {
                    self.parse_end_tag();
                    break;
                }
                let closes_ancestor = self.open[..self.open.len() - 1]
                    .iter()
                    .any(|open| open.is_some() && *open == end_name);
                if closes_ancestor {
                    self.errors.push(SyntaxError::new(
                        format!("element '{}' is not closed", name.as_deref().unwrap_or("")),
                        element_start,
                    ));
                    break;
                }
                self.parse_stray_end_tag();
                continue;
            }
            self.parse_content_item();
        }
        self.open.pop();
        self.finish_node();
    }

    fn end_tag_name(&self) -> Option<SmolStr> {
        self.tokens
            .get(self.pos + 1)
            .filter(|t| t.kind == SyntaxKind::NAME)
            .map(|t| SmolStr::new(t.text))
    }

    fn parse_attribute(&mut self) {
        self.start_node(SyntaxKind::ATTRIBUTE);
        self.bump(); // name

        if self.peek_non_trivia() == Some(SyntaxKind::EQ) {
            self.skip_trivia();
            self.bump(); // '='
            if self.peek_non_trivia() == Some(SyntaxKind::QUOTED) {
                self.skip_trivia();
                self.start_node(SyntaxKind::ATTRIBUTE_VALUE);
                let unterminated = self.current().is_some_and(|t| !is_terminated_quote(t.text));
                if unterminated {
                    self.error("unterminated attribute value");
                }
                self.bump();
                self.finish_node();
            } else {
                self.error("expected attribute value");
            }
        } else {
            self.error("expected '='");
        }

        self.finish_node();
    }

    fn parse_end_tag(&mut self) {
        self.start_node(SyntaxKind::END_TAG);
        self.bump(); // '</'
        if self.at(SyntaxKind::NAME) {
            self.bump();
        }
        if self.peek_non_trivia() == Some(SyntaxKind::R_ANGLE) {
            self.skip_trivia();
            self.bump();
        } else {
            self.error("expected '>'");
        }
        self.finish_node();
    }

    fn parse_stray_end_tag(&mut self) {
        self.error("end tag without matching start tag");
        self.start_node(SyntaxKind::ERROR);
        self.parse_end_tag();
        self.finish_node();
    }
}

fn is_terminated_quote(text: &str) -> bool {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) => open == close,
        _ => false,
    }
}
