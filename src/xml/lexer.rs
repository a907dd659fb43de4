//! Logos-based lexer for project documents
//!
//! XML is context sensitive: the same characters mean different things inside
//! a tag and between tags. The lexer keeps a mode and runs the matching logos
//! automaton for each token.

use super::syntax_kind::SyntaxKind;
use logos::Logos;
use rowan::TextSize;

/// A token with its kind, text, and position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Content,
    Tag,
}

/// Lexer wrapping the logos-generated tokenizers
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
    mode: Mode,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            offset: 0,
            mode: Mode::Content,
        }
    }

    fn lex_content(rest: &str) -> Option<(SyntaxKind, usize)> {
        let mut lex = ContentToken::lexer(rest);
        let token = lex.next()?;
        let kind = match token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR_TOKEN,
        };
        Some((kind, lex.span().end))
    }

    fn lex_tag(rest: &str) -> Option<(SyntaxKind, usize)> {
        let mut lex = TagToken::lexer(rest);
        let token = lex.next()?;
        let kind = match token {
            Ok(t) => t.into(),
            Err(()) => SyntaxKind::ERROR_TOKEN,
        };
        Some((kind, lex.span().end))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.input[self.offset..];
        if rest.is_empty() {
            return None;
        }

        let (kind, mut len) = match self.mode {
            Mode::Content => Self::lex_content(rest)?,
            Mode::Tag => Self::lex_tag(rest)?,
        };
        // Always make progress, even on an empty error match.
        if len == 0 {
            len = rest.chars().next().map(char::len_utf8).unwrap_or(1);
        }
        while !rest.is_char_boundary(len) {
            len += 1;
        }

        self.mode = match (self.mode, kind) {
            (Mode::Content, SyntaxKind::L_ANGLE | SyntaxKind::L_ANGLE_SLASH) => Mode::Tag,
            (Mode::Tag, SyntaxKind::R_ANGLE | SyntaxKind::SLASH_R_ANGLE) => Mode::Content,
            (mode, _) => mode,
        };

        let text = &rest[..len];
        let offset = TextSize::new(self.offset as u32);
        self.offset += len;

        Some(Token { kind, text, offset })
    }
}

/// Tokenize an entire string into a Vec
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Consume up to and including `terminator`, or the rest of the input when it
/// never appears (unterminated constructs swallow the remainder).
fn bump_until(remainder: &str, terminator: &str) -> usize {
    remainder
        .find(terminator)
        .map(|at| at + terminator.len())
        .unwrap_or(remainder.len())
}

fn comment(lex: &mut logos::Lexer<ContentToken>) -> bool {
    let n = bump_until(lex.remainder(), "-->");
    lex.bump(n);
    true
}

fn processing_instruction(lex: &mut logos::Lexer<ContentToken>) -> bool {
    let n = bump_until(lex.remainder(), "?>");
    lex.bump(n);
    true
}

fn cdata(lex: &mut logos::Lexer<ContentToken>) -> bool {
    let n = bump_until(lex.remainder(), "]]>");
    lex.bump(n);
    true
}

/// Tokens between tags
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum ContentToken {
    #[regex(r"[ \t\r\n]+", priority = 10)]
    Whitespace,

    #[regex(r"[^<]+", allow_greedy = true)]
    Text,

    #[token("<!--", comment)]
    Comment,

    #[token("<?", processing_instruction)]
    ProcessingInstruction,

    #[token("<![CDATA[", cdata)]
    CData,

    #[token("</")]
    LAngleSlash,

    #[token("<")]
    LAngle,
}

impl From<ContentToken> for SyntaxKind {
    fn from(token: ContentToken) -> Self {
        match token {
            ContentToken::Whitespace => SyntaxKind::WHITESPACE,
            ContentToken::Text => SyntaxKind::TEXT_CHUNK,
            ContentToken::Comment => SyntaxKind::COMMENT_CHUNK,
            ContentToken::ProcessingInstruction => SyntaxKind::PI_CHUNK,
            ContentToken::CData => SyntaxKind::CDATA_CHUNK,
            ContentToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            ContentToken::LAngle => SyntaxKind::L_ANGLE,
        }
    }
}

/// Tokens inside a start or end tag
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum TagToken {
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r#"[^ \t\r\n<>/="']+"#, allow_greedy = true)]
    Name,

    #[token("=")]
    Eq,

    #[token(">")]
    RAngle,

    #[token("/>")]
    SlashRAngle,

    #[token("</")]
    LAngleSlash,

    #[token("<")]
    LAngle,

    #[regex(r#""[^"<]*""#, allow_greedy = true)]
    #[regex(r#"'[^'<]*'"#, allow_greedy = true)]
    Quoted,

    // A value still being typed: runs up to the next `<` or end of input.
    #[regex(r#""[^"<]*"#, allow_greedy = true)]
    #[regex(r#"'[^'<]*"#, allow_greedy = true)]
    UnterminatedQuoted,
}

impl From<TagToken> for SyntaxKind {
    fn from(token: TagToken) -> Self {
        match token {
            TagToken::Whitespace => SyntaxKind::WHITESPACE,
            TagToken::Name => SyntaxKind::NAME,
            TagToken::Eq => SyntaxKind::EQ,
            TagToken::RAngle => SyntaxKind::R_ANGLE,
            TagToken::SlashRAngle => SyntaxKind::SLASH_R_ANGLE,
            TagToken::LAngleSlash => SyntaxKind::L_ANGLE_SLASH,
            TagToken::LAngle => SyntaxKind::L_ANGLE,
            TagToken::Quoted | TagToken::UnterminatedQuoted => SyntaxKind::QUOTED,
        }
    }
}
