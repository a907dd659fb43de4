//! Single left-to-right scan over a value string.
//!
//! The scanner never fails. A `$(`, `@(` or `%(` only opens a reference when
//! its closing `)` can be found; otherwise the characters are literal text.

use std::ops::Range;

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::tree::{Expression, ExpressionKind, ExpressionNode, NodeId};

/// Flat pieces produced by the scanner, all in value-local byte offsets.
#[derive(Debug)]
enum Segment {
    Literal(Range<usize>),
    Property {
        range: Range<usize>,
        name: SmolStr,
    },
    Item {
        range: Range<usize>,
        name: SmolStr,
        transform: Option<(Range<usize>, SmolStr)>,
        separator: Option<SmolStr>,
    },
    Metadata {
        range: Range<usize>,
        item: Option<SmolStr>,
        name: SmolStr,
    },
    Separator {
        range: Range<usize>,
        semicolon: usize,
    },
}

impl Segment {
    fn range(&self) -> Range<usize> {
        match self {
            Segment::Literal(range)
            | Segment::Property { range, .. }
            | Segment::Item { range, .. }
            | Segment::Metadata { range, .. }
            | Segment::Separator { range, .. } => range.clone(),
        }
    }
}

impl Expression {
    /// Parse a value whose first character sits at `base` in the document.
    pub fn parse(text: &str, base: TextSize) -> Expression {
        parse_expression(text, base)
    }
}

/// Parse an attribute or text value into an [`Expression`].
///
/// The root is a `Literal` when the value holds neither `;` nor a reference,
/// and a `List` otherwise. Every span is absolute (`base` + local offset).
pub fn parse_expression(text: &str, base: TextSize) -> Expression {
    let segments = scan(text);
    let mut builder = Builder {
        base,
        nodes: Vec::new(),
    };

    let is_plain = segments.iter().all(|s| matches!(s, Segment::Literal(_)));
    if is_plain {
        let root = builder.alloc(ExpressionKind::Literal, 0..text.len(), None);
        return builder.finish(text, root);
    }

    let root = builder.alloc(ExpressionKind::List, 0..text.len(), None);
    let mut item: Option<NodeId> = None;
    let mut item_start = 0;

    for segment in segments {
        if let Segment::Separator { ref range, semicolon } = segment {
            if item.take().is_none() {
                builder.alloc(ExpressionKind::ListItem, item_start..item_start, Some(root));
            }
            let separator_offset = (semicolon - range.start) as u32;
            item_start = range.end;
            builder.alloc(
                ExpressionKind::ListSeparator { separator_offset },
                range.clone(),
                Some(root),
            );
            continue;
        }

        let range = segment.range();
        let owner = match item {
            Some(id) => id,
            None => {
                let id = builder.alloc(ExpressionKind::ListItem, range.start..range.start, Some(root));
                item = Some(id);
                id
            }
        };
        builder.extend_to(owner, range.end);
        builder.push_segment(segment, owner);
    }

    if item.is_none() {
        builder.alloc(ExpressionKind::ListItem, item_start..item_start, Some(root));
    }

    builder.finish(text, root)
}

struct Builder {
    base: TextSize,
    nodes: Vec<ExpressionNode>,
}

impl Builder {
    fn absolute(&self, range: Range<usize>) -> TextRange {
        TextRange::new(
            self.base + TextSize::new(range.start as u32),
            self.base + TextSize::new(range.end as u32),
        )
    }

    fn alloc(&mut self, kind: ExpressionKind, range: Range<usize>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let span = self.absolute(range);
        self.nodes.push(ExpressionNode {
            kind,
            span,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        id
    }

    fn extend_to(&mut self, id: NodeId, end: usize) {
        let end = self.base + TextSize::new(end as u32);
        let node = &mut self.nodes[id.index()];
        node.span = node.span.cover_offset(end);
    }

    fn push_segment(&mut self, segment: Segment, parent: NodeId) {
        match segment {
            Segment::Literal(range) => {
                self.alloc(ExpressionKind::Literal, range, Some(parent));
            }
            Segment::Property { range, name } => {
                self.alloc(ExpressionKind::PropertyReference { name }, range, Some(parent));
            }
            Segment::Metadata { range, item, name } => {
                self.alloc(ExpressionKind::MetadataReference { item, name }, range, Some(parent));
            }
            Segment::Item {
                range,
                name,
                transform,
                separator,
            } => {
                let kind = ExpressionKind::ItemReference {
                    name,
                    transform: transform.as_ref().map(|(_, template)| template.clone()),
                    separator,
                };
                let id = self.alloc(kind, range, Some(parent));
                if let Some((range, template)) = transform {
                    self.alloc(ExpressionKind::ItemTransform { template }, range, Some(id));
                }
            }
            // Separators are attached to the list by the caller.
            Segment::Separator { .. } => {}
        }
    }

    fn finish(self, text: &str, root: NodeId) -> Expression {
        Expression {
            source: text.to_string(),
            base: self.base,
            nodes: self.nodes,
            root,
        }
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn scan(text: &str) -> Vec<Segment> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start: Option<usize> = None;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' | b'@' | b'%' if bytes.get(i + 1) == Some(&b'(') => {
                if let Some(close) = closing_paren(bytes, i + 2) {
                    if let Some(start) = literal_start.take() {
                        segments.push(Segment::Literal(start..i));
                    }
                    segments.push(reference(text, i, close));
                    i = close + 1;
                    continue;
                }
            }
            b';' => {
                // Whitespace on both sides of `;` belongs to the separator run.
                let pending = literal_start.take();
                let run_start = match pending {
                    Some(start) => {
                        let trailing = bytes[start..i].iter().rev().take_while(|b| is_ws(**b)).count();
                        i - trailing
                    }
                    None => i,
                };
                if let Some(start) = pending.filter(|&start| start < run_start) {
                    segments.push(Segment::Literal(start..run_start));
                }
                let leading = bytes[i + 1..].iter().take_while(|b| is_ws(**b)).count();
                let run_end = i + 1 + leading;
                segments.push(Segment::Separator {
                    range: run_start..run_end,
                    semicolon: i,
                });
                i = run_end;
                continue;
            }
            _ => {}
        }
        literal_start.get_or_insert(i);
        i += 1;
    }

    if let Some(start) = literal_start {
        segments.push(Segment::Literal(start..bytes.len()));
    }
    segments
}

/// Index of the `)` closing a reference whose body starts at `from`.
///
/// Parentheses nest and quoted strings are skipped. An unquoted `;` ends the
/// search: it can never appear inside a reference.
fn closing_paren(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b';' => return None,
            _ => {}
        }
    }
    None
}

fn reference(text: &str, start: usize, close: usize) -> Segment {
    let range = start..close + 1;
    let inner = &text[start + 2..close];
    match text.as_bytes()[start] {
        b'$' => Segment::Property {
            range,
            name: SmolStr::new(inner.trim()),
        },
        b'%' => {
            let inner = inner.trim();
            let (item, name) = match inner.split_once('.') {
                Some((item, name)) => (Some(SmolStr::new(item.trim())), name.trim()),
                None => (None, inner),
            };
            Segment::Metadata {
                range,
                item,
                name: SmolStr::new(name),
            }
        }
        _ => item_reference(text, start, close),
    }
}

/// `@(Name)`, `@(Name->'transform')`, `@(Name, 'sep')`, `@(Name->'t', 'sep')`.
fn item_reference(text: &str, start: usize, close: usize) -> Segment {
    let inner_start = start + 2;
    let inner = &text[inner_start..close];

    let name_end = [inner.find("->"), inner.find(',')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(inner.len());
    let name = SmolStr::new(inner[..name_end].trim());

    let mut rest = name_end;
    let mut transform = None;
    if inner[rest..].starts_with("->") {
        rest += 2;
        rest += inner[rest..].bytes().take_while(|b| is_ws(*b)).count();
        let (len, template) = quoted_or_bare(&inner[rest..]);
        transform = Some((inner_start + rest..inner_start + rest + len, template));
        rest += len;
    }

    let separator = inner[rest..]
        .trim_start()
        .strip_prefix(',')
        .map(|s| SmolStr::new(unquote(s.trim())));

    Segment::Item {
        range: start..close + 1,
        name,
        transform,
        separator,
    }
}

/// Length consumed and content of a quoted string, or of bare text up to the
/// next `,` when no quote opens it.
fn quoted_or_bare(s: &str) -> (usize, SmolStr) {
    if let Some(body) = s.strip_prefix('\'') {
        return match body.find('\'') {
            Some(end) => (end + 2, SmolStr::new(&body[..end])),
            None => (s.len(), SmolStr::new(body)),
        };
    }
    let len = s.find(',').unwrap_or(s.len());
    let bare = s[..len].trim_end();
    (bare.len(), SmolStr::new(bare))
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('\'')
        .map(|body| body.strip_suffix('\'').unwrap_or(body))
        .unwrap_or(s)
}
