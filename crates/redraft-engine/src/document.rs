use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::position::OffsetIndex;

/// One node of the external document tree: `{type, text?, content?[]}`.
/// Leaves carry `text`; everything else is a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<DocNode>>,
}

impl DocNode {
    pub fn leaf(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
            content: None,
        }
    }

    pub fn container(kind: impl Into<String>, content: Vec<DocNode>) -> Self {
        Self {
            kind: kind.into(),
            text: None,
            content: Some(content),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.text.is_some()
    }

    /// Inline containers (marks, links) group leaves without introducing a
    /// block boundary; every other container is block-level.
    pub fn is_block(&self) -> bool {
        if self.is_leaf() {
            return false;
        }
        !matches!(
            self.kind.as_str(),
            "link" | "span" | "em" | "strong" | "mark" | "underline" | "code" | "sub" | "sup"
        )
    }

    pub fn children(&self) -> &[DocNode] {
        self.content.as_deref().unwrap_or_default()
    }

    fn count_nodes(&self) -> usize {
        1 + self.children().iter().map(DocNode::count_nodes).sum::<usize>()
    }
}

/// The engine's view of one document: the node tree plus the user's
/// selection expressed as byte offsets into the plain-text projection.
///
/// The engine only reads the tree; the fix applicator is the single writer
/// and bumps `version` on every splice so callers can detect mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub root: DocNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Range<usize>>,
    #[serde(default)]
    pub version: u64,
}

impl Document {
    pub fn new(root: DocNode) -> Self {
        Self {
            root,
            selection: None,
            version: 0,
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: Range<usize>) -> Self {
        self.selection = Some(selection);
        self
    }

    /// The canonical plain-text projection: leaf text in tree order with one
    /// `\n` per block boundary. All analyzer offsets refer to this string.
    pub fn plain_text(&self) -> String {
        OffsetIndex::build(self).into_plain_text()
    }

    pub fn node_count(&self) -> usize {
        self.root.count_nodes()
    }

    pub fn word_count(&self) -> usize {
        self.plain_text().split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_paragraph_doc() -> Document {
        Document::new(DocNode::container(
            "doc",
            vec![
                DocNode::container("paragraph", vec![DocNode::leaf("First paragraph.")]),
                DocNode::container("paragraph", vec![DocNode::leaf("Second paragraph.")]),
            ],
        ))
    }

    #[test]
    fn projection_joins_blocks_with_single_separator() {
        assert_eq!(
            two_paragraph_doc().plain_text(),
            "First paragraph.\nSecond paragraph."
        );
    }

    #[test]
    fn inline_containers_do_not_introduce_separators() {
        let doc = Document::new(DocNode::container(
            "doc",
            vec![DocNode::container(
                "paragraph",
                vec![
                    DocNode::leaf("Read "),
                    DocNode::container("link", vec![DocNode::leaf("the docs")]),
                    DocNode::leaf(" carefully."),
                ],
            )],
        ));
        assert_eq!(doc.plain_text(), "Read the docs carefully.");
    }

    #[test]
    fn nested_blocks_separate_once_per_boundary() {
        let doc = Document::new(DocNode::container(
            "doc",
            vec![
                DocNode::container("heading", vec![DocNode::leaf("Title")]),
                DocNode::container(
                    "bulletList",
                    vec![
                        DocNode::container(
                            "listItem",
                            vec![DocNode::container("paragraph", vec![DocNode::leaf("one")])],
                        ),
                        DocNode::container(
                            "listItem",
                            vec![DocNode::container("paragraph", vec![DocNode::leaf("two")])],
                        ),
                    ],
                ),
            ],
        ));
        assert_eq!(doc.plain_text(), "Title\none\ntwo");
    }

    #[test]
    fn counts_cover_the_whole_tree() {
        let doc = two_paragraph_doc();
        assert_eq!(doc.node_count(), 5);
        assert_eq!(doc.word_count(), 4);
    }
}
