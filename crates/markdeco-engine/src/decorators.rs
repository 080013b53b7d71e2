//! Stock decorator strategies. Visual choices here are deliberately plain;
//! hosts wanting different styling register their own [`Decorator`]s.
use crate::error::DecorateError;
use crate::host::DecorationKind;
use crate::visit::DecorateCx;
use crate::visit::Decorator;
use crate::visit::DecoratorTable;
use async_trait::async_trait;
use markdeco_core::Node;
use markdeco_core::NodeKind;
use markdeco_core::NodeTag;
use unicode_width::UnicodeWidthChar;

/// Column budget for the collapsed label of a math preview.
const MATH_LABEL_COLUMNS: usize = 24;

/// The full stock table: headings, inline markup hiding, bullets and
/// checkboxes, fenced code, rules, links, and image/math/table previews.
pub fn standard_table() -> DecoratorTable {
    let mut table = DecoratorTable::new();
    table.register(NodeTag::Heading, Box::new(HeadingDecorator));
    table.register(
        NodeTag::Emphasis,
        Box::new(InlineMarkupDecorator {
            kind: DecorationKind::EmphasisText,
            marker_len: 1,
        }),
    );
    table.register(
        NodeTag::Strong,
        Box::new(InlineMarkupDecorator {
            kind: DecorationKind::StrongText,
            marker_len: 2,
        }),
    );
    table.register(
        NodeTag::Strikethrough,
        Box::new(InlineMarkupDecorator {
            kind: DecorationKind::StrikethroughText,
            marker_len: 2,
        }),
    );
    table.register(NodeTag::InlineCode, Box::new(CodeSpanDecorator));
    table.register(NodeTag::Item, Box::new(ItemDecorator));
    table.register(NodeTag::CodeBlock, Box::new(CodeBlockDecorator));
    table.register(NodeTag::Rule, Box::new(RuleDecorator));
    table.register(NodeTag::Link, Box::new(LinkDecorator));
    table.register(NodeTag::Image, Box::new(ImageDecorator));
    table.register(NodeTag::Math, Box::new(MathDecorator));
    table.register(NodeTag::Table, Box::new(TableDecorator));
    table
}

/// Styles the whole heading line and hides the ATX marker. Setext headings
/// have no leading marker; they keep the heading style only.
struct HeadingDecorator;

#[async_trait(?Send)]
impl Decorator for HeadingDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError> {
        let NodeKind::Heading { level } = node.kind else {
            return Err(DecorateError::MalformedNode);
        };
        let span = cx.span();
        cx.push(DecorationKind::Heading(level), span.clone());
        let text = cx.text();
        let hashes = text.chars().take_while(|&c| c == '#').count();
        if hashes == level as usize && text[hashes..].starts_with(' ') {
            cx.push(DecorationKind::HiddenMarkup, span.start..span.start + hashes + 1);
        }
        Ok(())
    }
}

/// Hides fixed-width markers on both ends and styles the interior. Used for
/// emphasis, strong and strikethrough.
struct InlineMarkupDecorator {
    kind: DecorationKind,
    marker_len: usize,
}

#[async_trait(?Send)]
impl Decorator for InlineMarkupDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let text = cx.text();
        if text.len() < 2 * self.marker_len {
            return Err(DecorateError::MalformedNode);
        }
        let lead = &text[..self.marker_len];
        let tail = &text[text.len() - self.marker_len..];
        if lead != tail || !lead.chars().all(|c| matches!(c, '*' | '_' | '~')) {
            return Err(DecorateError::MalformedNode);
        }
        let span = cx.span();
        cx.push(
            DecorationKind::HiddenMarkup,
            span.start..span.start + self.marker_len,
        );
        cx.push(
            DecorationKind::HiddenMarkup,
            span.end - self.marker_len..span.end,
        );
        cx.push(
            self.kind,
            span.start + self.marker_len..span.end - self.marker_len,
        );
        Ok(())
    }
}

/// Inline code spans carry a variable-length backtick run on each side.
struct CodeSpanDecorator;

#[async_trait(?Send)]
impl Decorator for CodeSpanDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let text = cx.text();
        let run = text.chars().take_while(|&c| c == '`').count();
        if run == 0 || text.len() < 2 * run || !text[text.len() - run..].chars().all(|c| c == '`')
        {
            return Err(DecorateError::MalformedNode);
        }
        let span = cx.span();
        cx.push(DecorationKind::HiddenMarkup, span.start..span.start + run);
        cx.push(DecorationKind::HiddenMarkup, span.end - run..span.end);
        cx.push(DecorationKind::InlineCodeText, span.start + run..span.end - run);
        Ok(())
    }
}

/// Replaces the `-`/`*`/`+` marker with a bullet and task brackets with a
/// checkbox. Ordered items keep their visible numbers.
struct ItemDecorator;

#[async_trait(?Send)]
impl Decorator for ItemDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError> {
        if cx.inherited().in_ordered_list {
            return Ok(());
        }
        let text = cx.text();
        if !text.starts_with(['-', '*', '+']) {
            return Err(DecorateError::MalformedNode);
        }
        let checkbox = if let NodeKind::Item { checked: Some(_) } = node.kind {
            // Char-indexed scan: a fixed byte slice could split a multibyte
            // character.
            let bracket = text
                .char_indices()
                .take_while(|&(i, _)| i < 8)
                .find(|&(_, c)| c == '[')
                .map(|(i, _)| i)
                .ok_or(DecorateError::MalformedNode)?;
            if !text[bracket..].starts_with("[ ]")
                && !text[bracket..].starts_with("[x]")
                && !text[bracket..].starts_with("[X]")
            {
                return Err(DecorateError::MalformedNode);
            }
            Some(bracket)
        } else {
            None
        };
        let span = cx.span();
        cx.push(DecorationKind::Bullet, span.start..span.start + 1);
        if let Some(bracket) = checkbox {
            cx.push(
                DecorationKind::Checkbox,
                span.start + bracket..span.start + bracket + 3,
            );
        }
        Ok(())
    }
}

/// Styles the block and hides fence lines of fenced blocks.
struct CodeBlockDecorator;

#[async_trait(?Send)]
impl Decorator for CodeBlockDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let text = cx.text();
        let fenced = text.starts_with("```") || text.starts_with("~~~");
        let opening = fenced.then(|| text.find('\n')).flatten();
        // An empty block has adjacent fence lines, so the last break may be
        // the opening line's own terminator.
        let closing = opening.and_then(|_| {
            let last_break = text.rfind('\n')?;
            let tail = text[last_break + 1..].trim();
            (!tail.is_empty() && tail.chars().all(|c| c == '`' || c == '~'))
                .then_some(last_break)
        });
        let span = cx.span();
        cx.push(DecorationKind::CodeFence, span.clone());
        if let Some(first_break) = opening {
            cx.push(DecorationKind::HiddenMarkup, span.start..span.start + first_break);
        }
        if let Some(last_break) = closing {
            cx.push(
                DecorationKind::HiddenMarkup,
                span.start + last_break + 1..span.end,
            );
        }
        Ok(())
    }
}

struct RuleDecorator;

#[async_trait(?Send)]
impl Decorator for RuleDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let span = cx.span();
        cx.push(DecorationKind::HorizontalRule, span);
        Ok(())
    }
}

/// `[text](url)`: hides the brackets and destination, styles the text.
/// Autolinks and reference links do not match the sub-pattern and are left
/// alone.
struct LinkDecorator;

#[async_trait(?Send)]
impl Decorator for LinkDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let text = cx.text();
        if !text.starts_with('[') {
            return Err(DecorateError::MalformedNode);
        }
        let close = text.find("](").ok_or(DecorateError::MalformedNode)?;
        let span = cx.span();
        cx.push(DecorationKind::HiddenMarkup, span.start..span.start + 1);
        cx.push(DecorationKind::LinkText, span.start + 1..span.start + close);
        cx.push(DecorationKind::HiddenMarkup, span.start + close..span.end);
        Ok(())
    }
}

/// Hides the `![alt](url)` syntax and attaches a rendered preview.
struct ImageDecorator;

#[async_trait(?Send)]
impl Decorator for ImageDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError> {
        let NodeKind::Image { url, alt } = &node.kind else {
            return Err(DecorateError::MalformedNode);
        };
        let image = cx.render_image(url).await?;
        let span = cx.span();
        let label = if alt.is_empty() { url.clone() } else { alt.clone() };
        cx.push(DecorationKind::HiddenMarkup, span.clone());
        cx.annotate(span, url.clone(), label, image, false);
        Ok(())
    }
}

/// Renders `$...$` / `$$...$$` through the backend and attaches the result,
/// with a truncated copy of the formula as the collapsed label.
struct MathDecorator;

#[async_trait(?Send)]
impl Decorator for MathDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, node: &Node) -> Result<(), DecorateError> {
        let NodeKind::Math { display } = node.kind else {
            return Err(DecorateError::MalformedNode);
        };
        let marker = if display { "$$" } else { "$" };
        let text = cx.text();
        let source = text
            .strip_prefix(marker)
            .and_then(|t| t.strip_suffix(marker))
            .ok_or(DecorateError::MalformedNode)?
            .trim()
            .to_string();
        let image = cx.render_image(&source).await?;
        let span = cx.span();
        let label = truncate_columns(&source, MATH_LABEL_COLUMNS);
        cx.push(DecorationKind::HiddenMarkup, span.clone());
        cx.annotate(span, source, label, image, true);
        Ok(())
    }
}

/// Renders the whole table source as an image preview. The source text is
/// the reuse key, so an edited table re-renders and an untouched one keeps
/// its handle.
struct TableDecorator;

#[async_trait(?Send)]
impl Decorator for TableDecorator {
    async fn decorate(&self, cx: &mut DecorateCx<'_>, _: &Node) -> Result<(), DecorateError> {
        let source = cx.text().to_string();
        let image = cx.render_image(&source).await?;
        let span = cx.span();
        let label = truncate_columns(source.lines().next().unwrap_or(""), MATH_LABEL_COLUMNS);
        cx.annotate(span, source, label, image, false);
        Ok(())
    }
}

fn truncate_columns(s: &str, max: usize) -> String {
    let mut out = String::new();
    let mut columns = 0;
    for ch in s.chars() {
        let width = ch.width().unwrap_or(0);
        if columns + width > max {
            out.push('…');
            break;
        }
        columns += width;
        out.push(ch);
    }
    out
}
