use std::ops::Range;

use crate::document::{DocNode, Document};

/// Whether a position sits in leaf text or on a virtual block separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Text,
    Boundary,
}

/// One contiguous run of the plain-text projection: either a text leaf or
/// the single `\n` inserted at a block boundary. `path` addresses the leaf
/// (for `Text`) or the node the boundary follows (for `Boundary`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpan {
    pub plain_start: usize,
    pub len: usize,
    pub path: Vec<usize>,
    pub kind: SpanKind,
}

impl IndexSpan {
    pub fn plain_end(&self) -> usize {
        self.plain_start + self.len
    }

    pub fn contains(&self, plain_offset: usize) -> bool {
        plain_offset >= self.plain_start && plain_offset < self.plain_end()
    }
}

/// A position in the document tree: the path from the root plus a byte
/// offset inside the addressed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePos {
    pub path: Vec<usize>,
    pub offset: usize,
    pub kind: SpanKind,
}

/// Bidirectional map between plain-text offsets and tree positions.
///
/// Built in one depth-first traversal; spans are monotonic in plain offset,
/// so lookups binary-search the plain column. The index describes one
/// snapshot of the tree: rebuild after any mutation, never persist.
#[derive(Debug, Clone)]
pub struct OffsetIndex {
    spans: Vec<IndexSpan>,
    plain_text: String,
}

impl OffsetIndex {
    pub fn build(document: &Document) -> Self {
        let mut spans = Vec::new();
        let mut plain_text = String::new();
        let mut path = Vec::new();
        walk(&document.root, &mut path, &mut plain_text, &mut spans);
        Self { spans, plain_text }
    }

    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn into_plain_text(self) -> String {
        self.plain_text
    }

    pub fn plain_len(&self) -> usize {
        self.plain_text.len()
    }

    pub fn spans(&self) -> &[IndexSpan] {
        &self.spans
    }

    /// Map a plain-text offset to its tree position. `None` for offsets at
    /// or past the end of the projection; callers fall back to a different
    /// reconciliation strategy rather than treating this as fatal.
    pub fn to_tree_position(&self, plain_offset: usize) -> Option<TreePos> {
        let idx = self
            .spans
            .partition_point(|span| span.plain_start <= plain_offset)
            .checked_sub(1)?;
        let span = &self.spans[idx];
        if !span.contains(plain_offset) {
            return None;
        }
        Some(TreePos {
            path: span.path.clone(),
            offset: plain_offset - span.plain_start,
            kind: span.kind,
        })
    }

    /// Inverse of [`Self::to_tree_position`]. `None` when the position does
    /// not address a run of this snapshot (e.g. the tree changed).
    pub fn to_plain_offset(&self, position: &TreePos) -> Option<usize> {
        self.spans
            .iter()
            .find(|span| span.kind == position.kind && span.path == position.path)
            .filter(|span| position.offset < span.len)
            .map(|span| span.plain_start + position.offset)
    }

    /// All spans overlapping `range`, in plain-offset order.
    pub fn spans_in(&self, range: Range<usize>) -> &[IndexSpan] {
        let start = self
            .spans
            .partition_point(|span| span.plain_end() <= range.start);
        let end = self.spans.partition_point(|span| span.plain_start < range.end);
        &self.spans[start..end.max(start)]
    }
}

fn walk(node: &DocNode, path: &mut Vec<usize>, out: &mut String, spans: &mut Vec<IndexSpan>) {
    if let Some(text) = &node.text {
        if !text.is_empty() {
            spans.push(IndexSpan {
                plain_start: out.len(),
                len: text.len(),
                path: path.clone(),
                kind: SpanKind::Text,
            });
            out.push_str(text);
        }
        return;
    }

    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        path.push(i);
        walk(child, path, out, spans);
        // One separator per block boundary between adjacent siblings.
        let at_boundary =
            i + 1 < children.len() && (child.is_block() || children[i + 1].is_block());
        if at_boundary {
            spans.push(IndexSpan {
                plain_start: out.len(),
                len: 1,
                path: path.clone(),
                kind: SpanKind::Boundary,
            });
            out.push('\n');
        }
        path.pop();
    }
}
