use std::ops::Range;

/// Markdown node variants, with the type-specific fields the decorators
/// consume. Spans are byte offsets local to the parsed slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Heading { level: u8 },
    Paragraph,
    BlockQuote,
    List { ordered: bool },
    Item { checked: Option<bool> },
    CodeBlock { language: Option<String> },
    Emphasis,
    Strong,
    Strikethrough,
    InlineCode,
    Math { display: bool },
    Link { url: String },
    Image { url: String, alt: String },
    Table,
    TableHead,
    TableRow,
    TableCell,
    Rule,
    Html,
    Text,
    SoftBreak,
    HardBreak,
}

/// Field-free discriminant of [`NodeKind`], used to key dispatch tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Document,
    Heading,
    Paragraph,
    BlockQuote,
    List,
    Item,
    CodeBlock,
    Emphasis,
    Strong,
    Strikethrough,
    InlineCode,
    Math,
    Link,
    Image,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Rule,
    Html,
    Text,
    SoftBreak,
    HardBreak,
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Document => NodeTag::Document,
            NodeKind::Heading { .. } => NodeTag::Heading,
            NodeKind::Paragraph => NodeTag::Paragraph,
            NodeKind::BlockQuote => NodeTag::BlockQuote,
            NodeKind::List { .. } => NodeTag::List,
            NodeKind::Item { .. } => NodeTag::Item,
            NodeKind::CodeBlock { .. } => NodeTag::CodeBlock,
            NodeKind::Emphasis => NodeTag::Emphasis,
            NodeKind::Strong => NodeTag::Strong,
            NodeKind::Strikethrough => NodeTag::Strikethrough,
            NodeKind::InlineCode => NodeTag::InlineCode,
            NodeKind::Math { .. } => NodeTag::Math,
            NodeKind::Link { .. } => NodeTag::Link,
            NodeKind::Image { .. } => NodeTag::Image,
            NodeKind::Table => NodeTag::Table,
            NodeKind::TableHead => NodeTag::TableHead,
            NodeKind::TableRow => NodeTag::TableRow,
            NodeKind::TableCell => NodeTag::TableCell,
            NodeKind::Rule => NodeTag::Rule,
            NodeKind::Html => NodeTag::Html,
            NodeKind::Text => NodeTag::Text,
            NodeKind::SoftBreak => NodeTag::SoftBreak,
            NodeKind::HardBreak => NodeTag::HardBreak,
        }
    }

    /// Block-level nodes get their trailing line terminator trimmed off the
    /// span, so a heading `# Title\n` spans the visible text only.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Heading { .. }
                | NodeKind::Paragraph
                | NodeKind::BlockQuote
                | NodeKind::List { .. }
                | NodeKind::Item { .. }
                | NodeKind::CodeBlock { .. }
                | NodeKind::Table
                | NodeKind::TableHead
                | NodeKind::TableRow
                | NodeKind::Rule
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Range<usize>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, span: Range<usize>) -> Self {
        Self {
            kind,
            span,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    /// Pre-order search for the first node with `tag`, self included.
    pub fn find(&self, tag: NodeTag) -> Option<&Node> {
        if self.tag() == tag {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(tag))
    }
}
