use std::collections::HashMap;

/// Index of a node inside a [`Document`] arena.
pub type NodeId = usize;

/// The kind of a block node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Document,
    BlockQuote,
    List(ListInfo),
    Item(ListInfo),
    Heading { level: u8 },
    Paragraph,
    CodeBlock { language: Option<String> },
    ThematicBreak,
    HtmlBlock,
}

impl Block {
    // Whether a node of this kind may hold `child` as a direct child.
    pub(crate) fn can_contain(&self, child: &Block) -> bool {
        match self {
            Block::Document | Block::BlockQuote | Block::Item(_) => {
                !matches!(child, Block::Item(_))
            }
            Block::List(_) => matches!(child, Block::Item(_)),
            _ => false,
        }
    }

    // Leaf blocks whose text is parsed into inline nodes.
    pub(crate) fn has_inlines(&self) -> bool {
        matches!(self, Block::Paragraph | Block::Heading { .. })
    }
}

/// Attributes of a list, fixed when the list is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListInfo {
    pub ordered: bool,
    pub start: u32,
    /// `-`, `*` or `+` for bullet lists, `.` or `)` for ordered lists.
    pub marker: char,
}

impl ListInfo {
    // Two markers belong to the same list only if type and marker character agree.
    pub(crate) fn continues(&self, other: &ListInfo) -> bool {
        self.ordered == other.ordered && self.marker == other.marker
    }
}

/// A node in the block tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: Block,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Raw text of a leaf block, before inline parsing.
    pub content: String,
    /// Inline content, filled after the block pass for paragraphs and headings.
    pub inlines: Vec<Inline>,
    /// Only meaningful for lists.
    pub tight: bool,
}

impl Node {
    pub(crate) fn new(kind: Block, parent: Option<NodeId>) -> Self {
        Node {
            kind,
            parent,
            children: vec![],
            content: String::new(),
            inlines: vec![],
            tight: true,
        }
    }
}

/// Span-level content of a leaf block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis {
        strength: u8,
        children: Vec<Inline>,
    },
    CodeSpan(String),
    Link {
        destination: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        destination: String,
        alt: String,
        title: Option<String>,
    },
    RawHtml(String),
    LineBreak {
        hard: bool,
    },
}

impl Inline {
    // Plain text of the node, used for image alt attributes.
    pub(crate) fn plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(s) | Inline::CodeSpan(s) | Inline::RawHtml(s) => out.push_str(s),
            Inline::Emphasis { children, .. } | Inline::Link { children, .. } => {
                children.iter().for_each(|c| c.plain_text(out))
            }
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::LineBreak { .. } => out.push('\n'),
        }
    }
}

/// A link reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub destination: String,
    pub title: Option<String>,
}

/// Normalized label to definition.
pub type ReferenceMap = HashMap<String, Reference>;

/// The parsed document: an arena of block nodes rooted at index 0.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    pub(crate) references: ReferenceMap,
}

impl Document {
    pub const ROOT: NodeId = 0;

    pub(crate) fn new() -> Self {
        Document {
            nodes: vec![Node::new(Block::Document, None)],
            references: ReferenceMap::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    /// Number of slots in the arena. Nodes detached while parsing, such as
    /// paragraphs that held only reference definitions, are counted too.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    // Append a new node under `parent` and return its id.
    pub(crate) fn append(&mut self, parent: NodeId, kind: Block) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(kind, Some(parent)));
        self.nodes[parent].children.push(id);
        id
    }

    // Unlink a node from its parent. The slot stays in the arena.
    pub(crate) fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|c| *c != id);
        }
    }

    pub(crate) fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].children.last().copied()
    }

    // Ids of every node reachable from the root, in document order.
    pub(crate) fn walk(&self) -> Vec<NodeId> {
        let mut order = vec![];
        let mut pending = vec![Self::ROOT];
        while let Some(id) = pending.pop() {
            order.push(id);
            pending.extend(self.nodes[id].children.iter().rev());
        }
        order
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment() {
        let item = Block::Item(ListInfo {
            ordered: false,
            start: 1,
            marker: '-',
        });
        let list = Block::List(ListInfo {
            ordered: false,
            start: 1,
            marker: '-',
        });
        assert!(list.can_contain(&item));
        assert!(!list.can_contain(&Block::Paragraph));
        assert!(!Block::Document.can_contain(&item));
        assert!(Block::BlockQuote.can_contain(&list));
        assert!(!Block::Paragraph.can_contain(&Block::Paragraph));
    }

    #[test]
    fn test_append_and_detach() {
        let mut doc = Document::new();
        let quote = doc.append(Document::ROOT, Block::BlockQuote);
        let para = doc.append(quote, Block::Paragraph);
        let hr = doc.append(Document::ROOT, Block::ThematicBreak);

        assert_eq!(doc.walk(), vec![0, quote, para, hr]);
        assert_eq!(doc.last_child(quote), Some(para));

        doc.detach(para);
        assert_eq!(doc.walk(), vec![0, quote, hr]);
        assert_eq!(doc.node(para).parent, None);
        assert_eq!(doc.arena_len(), 4);
        assert!(!doc.is_empty());

        doc.detach(quote);
        doc.detach(hr);
        assert!(doc.is_empty());
        assert_eq!(doc.arena_len(), 4);
    }

    #[test]
    fn test_plain_text() {
        let node = Inline::Emphasis {
            strength: 1,
            children: vec![
                Inline::Text("foo ".to_string()),
                Inline::CodeSpan("bar".to_string()),
            ],
        };
        let mut s = String::new();
        node.plain_text(&mut s);
        assert_eq!(s, "foo bar");
    }
}
