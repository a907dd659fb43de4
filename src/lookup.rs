//! Correlation index: document spans ↔ evaluated objects.
//!
//! Built from the objects of an evaluated project and the syntax tree of the
//! same text revision. Each engine location in this document is anchored to
//! the element or attribute that starts there; the entry covers that whole
//! node. Entries are kept sorted by span start.

use std::cmp::Reverse;
use std::path::Path;
use std::sync::Arc;

use text_size::{TextRange, TextSize};
use tracing::trace;

use crate::base::{LineIndex, Position, PositionError};
use crate::model::{EvaluatedObject, EvaluatedProject};
use crate::xml::{self, SyntaxKind, SyntaxNode};

#[derive(Clone, Debug)]
pub struct LookupEntry {
    pub span: TextRange,
    /// `ELEMENT` or `ATTRIBUTE`.
    pub node_kind: SyntaxKind,
    pub object: Arc<EvaluatedObject>,
}

impl LookupEntry {
    /// Half-open containment; an empty span contains only its own offset.
    fn contains(&self, offset: TextSize) -> bool {
        if self.span.is_empty() {
            self.span.start() == offset
        } else {
            self.span.contains(offset)
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CorrelationIndex {
    entries: Vec<LookupEntry>,
}

impl CorrelationIndex {
    /// Index every object location that falls inside `document`.
    ///
    /// Locations in other files, without a line, or outside the text are
    /// skipped.
    pub fn build<P: EvaluatedProject + ?Sized>(
        project: &P,
        document: &Path,
        root: &SyntaxNode,
        line_index: &LineIndex,
    ) -> Self {
        let mut entries = Vec::new();
        for object in project.objects() {
            let shared = Arc::new(object.clone());
            for location in object.locations.iter().filter(|l| l.is_in(document)) {
                let offset = match line_index.position_to_offset(location.position()) {
                    Ok(offset) => offset,
                    Err(err) => {
                        trace!(name = %object.name, %err, "skipping object location");
                        continue;
                    }
                };
                match anchor(root, offset) {
                    Some((span, node_kind)) => entries.push(LookupEntry {
                        span,
                        node_kind,
                        object: Arc::clone(&shared),
                    }),
                    None => trace!(name = %object.name, ?offset, "no element at object location"),
                }
            }
        }
        entries.sort_by_key(|e| (e.span.start(), Reverse(e.span.len())));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The innermost entry containing `offset`.
    ///
    /// Smallest span wins; equal lengths go to the later start.
    pub fn find(&self, offset: TextSize) -> Option<&LookupEntry> {
        let candidates = self.entries.partition_point(|e| e.span.start() <= offset);
        self.entries[..candidates]
            .iter()
            .filter(|e| e.contains(offset))
            .min_by_key(|e| (e.span.len(), Reverse(e.span.start())))
    }

    /// [`find`](Self::find) for a line/column position.
    pub fn find_at(
        &self,
        position: Position,
        line_index: &LineIndex,
    ) -> Result<Option<&LookupEntry>, PositionError> {
        let offset = line_index.position_to_offset(position)?;
        Ok(self.find(offset))
    }

}

/// Span of the element or attribute anchored at `offset`: the innermost one
/// starting exactly there, else the innermost element containing it.
pub(crate) fn anchor(root: &SyntaxNode, offset: TextSize) -> Option<(TextRange, SyntaxKind)> {
    let node = xml::node_at_offset(root, offset)?;
    let mut enclosing = None;
    for ancestor in node.ancestors() {
        let kind = ancestor.kind();
        if !matches!(kind, SyntaxKind::ELEMENT | SyntaxKind::ATTRIBUTE) {
            continue;
        }
        let range = ancestor.text_range();
        if range.start() == offset {
            return Some((range, kind));
        }
        if enclosing.is_none() && kind == SyntaxKind::ELEMENT {
            enclosing = Some((range, kind));
        }
    }
    enclosing
}
