//! Text renderings of a [`Document`]: an ASCII outline, Markdown, and the
//! reverse import from Markdown.

use super::{Document, NodeKind};

const TITLE: char = '■';
const SUBTITLE: char = '□';
const PARAGRAPH: char = '¶';

/// Longest paragraph excerpt shown in the outline.
const EXCERPT_CHARS: usize = 40;

fn kind_symbol(kind: NodeKind) -> char {
    match kind {
        NodeKind::Title => TITLE,
        NodeKind::Subtitle => SUBTITLE,
        NodeKind::Paragraph | NodeKind::Root => PARAGRAPH,
    }
}

/// Render the outline as ASCII art.
///
/// Example output:
/// ```text
/// Quarterly Review
/// ├── ■ Introduction
/// │   └── □ Methodology
/// │       └── ¶ details here
/// └── ■ Conclusions
/// ```
pub fn render_outline(doc: &Document, heading: &str) -> String {
    let mut output = String::new();
    output.push_str(heading);
    output.push('\n');

    if let Some(root) = doc.get(doc.root_id()) {
        for (i, child) in root.children.iter().enumerate() {
            let is_last = i == root.children.len() - 1;
            render_node(&mut output, doc, *child, "", is_last);
        }
    }
    output
}

fn render_node(output: &mut String, doc: &Document, id: uuid::Uuid, prefix: &str, is_last: bool) {
    let Some(node) = doc.get(id) else {
        return;
    };

    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(prefix);
    output.push_str(branch);
    output.push(kind_symbol(node.kind));
    output.push(' ');
    output.push_str(&excerpt(&node.text, node.kind));
    output.push('\n');

    let continuation = if is_last { "    " } else { "│   " };
    let child_prefix = format!("{}{}", prefix, continuation);

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, doc, *child, &child_prefix, child_is_last);
    }
}

fn excerpt(text: &str, kind: NodeKind) -> String {
    let line = text.lines().next().unwrap_or_default();
    if kind != NodeKind::Paragraph || line.chars().count() <= EXCERPT_CHARS {
        return line.to_string();
    }
    let cut: String = line.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// Render the document as Markdown: titles as `#`, subtitles as `##` or deeper
/// depending on nesting, paragraphs as plain blocks.
pub fn render_markdown(doc: &Document) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for node in doc.iter() {
        match node.kind {
            NodeKind::Root => {}
            NodeKind::Title => blocks.push(format!("# {}", node.text)),
            NodeKind::Subtitle => {
                let level = heading_level(doc, node.id).clamp(2, 6);
                blocks.push(format!("{} {}", "#".repeat(level), node.text));
            }
            NodeKind::Paragraph => {
                if !node.text.trim().is_empty() {
                    blocks.push(node.text.clone());
                }
            }
        }
    }
    let mut markdown = blocks.join("\n\n");
    if !markdown.is_empty() {
        markdown.push('\n');
    }
    markdown
}

/// Number of heading ancestors (inclusive) above a node.
fn heading_level(doc: &Document, id: uuid::Uuid) -> usize {
    let mut level = 0;
    let mut current = doc.get(id);
    while let Some(node) = current {
        if matches!(node.kind, NodeKind::Title | NodeKind::Subtitle) {
            level += 1;
        }
        current = node.parent.and_then(|p| doc.get(p));
    }
    level
}

fn flush_paragraph(doc: &mut Document, lines: &mut Vec<&str>, parent: Option<uuid::Uuid>) {
    if lines.is_empty() {
        return;
    }
    let text = lines.join("\n");
    lines.clear();
    if let Err(e) = doc.add_section(NodeKind::Paragraph, text, parent) {
        tracing::warn!(error = %e, "Dropped paragraph during Markdown import");
    }
}

/// Build a document from Markdown.
///
/// `#` starts a title under the root, `##` and deeper start a subtitle under the
/// current title, and every other blank-line separated block becomes a paragraph
/// under the most recent heading.
pub fn from_markdown(markdown: &str) -> Document {
    let mut doc = Document::new();
    let mut title = None;
    let mut subtitle = None;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in markdown.lines() {
        let trimmed = line.trim();
        let hashes = trimmed.chars().take_while(|c| *c == '#').count();
        let is_heading = hashes > 0 && trimmed[hashes..].starts_with(' ');

        if is_heading {
            flush_paragraph(&mut doc, &mut paragraph, subtitle.or(title));
            let text = trimmed[hashes..].trim().to_string();
            if hashes == 1 {
                title = doc.add_section(NodeKind::Title, text, None).ok();
                subtitle = None;
            } else {
                subtitle = doc.add_section(NodeKind::Subtitle, text, title).ok();
            }
        } else if trimmed.is_empty() {
            flush_paragraph(&mut doc, &mut paragraph, subtitle.or(title));
        } else {
            paragraph.push(trimmed);
        }
    }
    flush_paragraph(&mut doc, &mut paragraph, subtitle.or(title));
    doc
}
