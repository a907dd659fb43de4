//! Arena-backed expression tree.
//!
//! Nodes live in one `Vec` owned by [`Expression`]; children are listed by
//! [`NodeId`] and parents are plain ids pointing back into the same arena.
//! A tree is never mutated after parsing, so ids stay valid for its lifetime.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// Index of a node inside its [`Expression`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(super) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpressionKind {
    /// Plain text.
    Literal,
    /// `$(Name)`; property functions keep their full body as the name.
    PropertyReference { name: SmolStr },
    /// `@(Name)`, `@(Name->'transform')`, `@(Name, 'separator')`.
    ItemReference {
        name: SmolStr,
        transform: Option<SmolStr>,
        separator: Option<SmolStr>,
    },
    /// The quoted transform of an item reference.
    ItemTransform { template: SmolStr },
    /// `%(Name)` or `%(Item.Name)`.
    MetadataReference {
        item: Option<SmolStr>,
        name: SmolStr,
    },
    /// Semicolon-delimited list.
    List,
    /// One entry of a list (possibly empty).
    ListItem,
    /// A `;` with its surrounding whitespace. `separator_offset` is where the
    /// `;` sits within the run.
    ListSeparator { separator_offset: u32 },
}

impl ExpressionKind {
    /// Containers are the only nodes with children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::List | Self::ListItem | Self::ItemReference { .. }
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionNode {
    pub kind: ExpressionKind,
    /// Absolute span in the document.
    pub span: TextRange,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// A parsed attribute or text value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub(super) source: String,
    pub(super) base: TextSize,
    pub(super) nodes: Vec<ExpressionNode>,
    pub(super) root: NodeId,
}

impl Expression {
    /// The text that was parsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Absolute offset of the first character of the source.
    pub fn base(&self) -> TextSize {
        self.base
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &ExpressionKind {
        &self.node(id).kind
    }

    pub fn span(&self, id: NodeId) -> TextRange {
        self.node(id).span
    }

    /// Source text covered by a node.
    pub fn text(&self, id: NodeId) -> &str {
        let local = self.span(id) - self.base;
        &self.source[local]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn sibling(&self, id: NodeId, delta: isize) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|&s| s == id)?;
        let target = at.checked_add_signed(delta)?;
        siblings.get(target).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, -1)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.sibling(id, 1)
    }

    /// Parents of a node up to the root, nearest first. Each call starts a
    /// fresh walk.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Depth-first, pre-order walk of everything below a node.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Items of a list, in order.
    pub fn list_items(&self, list: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(list)
            .iter()
            .copied()
            .filter(|&c| matches!(self.kind(c), ExpressionKind::ListItem))
    }

    /// Separators of a list, in order.
    pub fn list_separators(&self, list: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(list)
            .iter()
            .copied()
            .filter(|&c| matches!(self.kind(c), ExpressionKind::ListSeparator { .. }))
    }

    /// The list item at (or next to) an absolute offset.
    ///
    /// On a separator, an offset up to and including the `;` belongs to the
    /// item before it; anything after belongs to the item that follows.
    pub fn find_item_at(&self, list: NodeId, offset: TextSize) -> Option<NodeId> {
        if !matches!(self.kind(list), ExpressionKind::List) {
            return None;
        }
        let span = self.span(list);
        if offset < span.start() || offset > span.end() {
            return None;
        }

        let at = self
            .children(list)
            .iter()
            .copied()
            .rfind(|&c| self.span(c).start() <= offset)?;

        match *self.kind(at) {
            ExpressionKind::ListItem => Some(at),
            ExpressionKind::ListSeparator { separator_offset } => {
                let separator_at = self.span(at).start() + TextSize::new(separator_offset);
                if offset <= separator_at {
                    self.previous_sibling(at)
                } else {
                    self.next_sibling(at)
                }
            }
            _ => None,
        }
    }

    /// The innermost node whose span contains an offset (end inclusive).
    pub fn node_at(&self, offset: TextSize) -> Option<NodeId> {
        if !self.span(self.root).contains_inclusive(offset) {
            return None;
        }
        let mut current = self.root;
        'descend: loop {
            for &child in self.children(current) {
                if self.span(child).contains_inclusive(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Value of a list item with surrounding whitespace removed.
    pub fn item_value(&self, item: NodeId) -> &str {
        self.text(item).trim()
    }
}

/// Pre-order iterator returned by [`Expression::descendants`].
pub struct Descendants<'a> {
    tree: &'a Expression,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
