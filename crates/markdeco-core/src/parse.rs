use crate::tree::Node;
use crate::tree::NodeKind;
use pulldown_cmark::CodeBlockKind;
use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;

/// Parser options used for every decoration pass.
pub fn parse_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Parses `text` into an offset-bearing tree rooted at a
/// [`NodeKind::Document`] node.
///
/// All spans are byte offsets into `text`; block-level spans exclude the
/// trailing line terminator.
pub fn parse_tree(text: &str) -> Node {
    let parser = Parser::new_ext(text, parse_options());
    let mut root = Node::new(NodeKind::Document, 0..text.len());
    let mut stack: Vec<Node> = Vec::new();

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(tag) => stack.push(Node::new(container_kind(tag), range)),
            Event::End(_) => {
                if let Some(mut node) = stack.pop() {
                    finish_node(text, &mut node);
                    attach(&mut stack, &mut root, node);
                }
            }
            Event::Text(_) => {
                attach(&mut stack, &mut root, Node::new(NodeKind::Text, range));
            }
            Event::Code(_) => {
                attach(&mut stack, &mut root, Node::new(NodeKind::InlineCode, range));
            }
            Event::InlineMath(_) => {
                attach(
                    &mut stack,
                    &mut root,
                    Node::new(NodeKind::Math { display: false }, range),
                );
            }
            Event::DisplayMath(_) => {
                attach(
                    &mut stack,
                    &mut root,
                    Node::new(NodeKind::Math { display: true }, range),
                );
            }
            Event::Html(_) | Event::InlineHtml(_) => {
                attach(&mut stack, &mut root, Node::new(NodeKind::Html, range));
            }
            Event::Rule => {
                let mut node = Node::new(NodeKind::Rule, range);
                finish_node(text, &mut node);
                attach(&mut stack, &mut root, node);
            }
            Event::SoftBreak => {
                attach(&mut stack, &mut root, Node::new(NodeKind::SoftBreak, range));
            }
            Event::HardBreak => {
                attach(&mut stack, &mut root, Node::new(NodeKind::HardBreak, range));
            }
            Event::TaskListMarker(checked) => {
                for node in stack.iter_mut().rev() {
                    if let NodeKind::Item { checked: c } = &mut node.kind {
                        *c = Some(checked);
                        break;
                    }
                }
            }
            Event::FootnoteReference(_) => {}
        }
    }

    // Events are balanced, but never trust that with a truncated slice.
    while let Some(mut node) = stack.pop() {
        finish_node(text, &mut node);
        attach(&mut stack, &mut root, node);
    }
    root
}

fn attach(stack: &mut Vec<Node>, root: &mut Node, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.children.push(node),
    }
}

fn finish_node(text: &str, node: &mut Node) {
    if let NodeKind::Image { alt, .. } = &mut node.kind {
        for child in &node.children {
            if child.kind == NodeKind::Text {
                alt.push_str(&text[child.span.clone()]);
            }
        }
    }
    if node.kind.is_block() {
        let bytes = text.as_bytes();
        while node.span.end > node.span.start
            && matches!(bytes[node.span.end - 1], b'\n' | b'\r')
        {
            node.span.end -= 1;
        }
    }
}

fn container_kind(tag: Tag<'_>) -> NodeKind {
    match tag {
        Tag::Paragraph => NodeKind::Paragraph,
        Tag::Heading { level, .. } => NodeKind::Heading {
            level: heading_level(level),
        },
        Tag::BlockQuote(_) => NodeKind::BlockQuote,
        Tag::List(start) => NodeKind::List {
            ordered: start.is_some(),
        },
        Tag::Item => NodeKind::Item { checked: None },
        Tag::CodeBlock(kind) => NodeKind::CodeBlock {
            language: match kind {
                CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.into_string()),
                _ => None,
            },
        },
        Tag::Emphasis => NodeKind::Emphasis,
        Tag::Strong => NodeKind::Strong,
        Tag::Strikethrough => NodeKind::Strikethrough,
        Tag::Link { dest_url, .. } => NodeKind::Link {
            url: dest_url.into_string(),
        },
        Tag::Image { dest_url, .. } => NodeKind::Image {
            url: dest_url.into_string(),
            alt: String::new(),
        },
        Tag::Table(_) => NodeKind::Table,
        Tag::TableHead => NodeKind::TableHead,
        Tag::TableRow => NodeKind::TableRow,
        Tag::TableCell => NodeKind::TableCell,
        Tag::HtmlBlock => NodeKind::Html,
        _ => NodeKind::Text,
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
