use crate::arena::{DomArena, DomError};
use crate::types::{Namespace, NodeKey, NodeKind};

const INDENT_STEP: &str = "  ";
const PREVIEW_CHARS: usize = 40;

/// Render the subtree under `root` as indented lines, at most `cap` lines.
///
/// Claimed nodes carry their claim order as `@N`:
///
/// ```text
/// <body>
///   <p class="lead">@0
///     "hello"@1
///   <!-- note -->
/// ```
pub fn outline(arena: &DomArena, root: NodeKey, cap: usize) -> Result<Vec<String>, DomError> {
    let mut out = Vec::new();
    let mut left = cap;
    walk(arena, root, 0, &mut out, &mut left)?;
    Ok(out)
}

/// Outline of only the children of `container`, without indentation.
pub fn child_outline(arena: &DomArena, container: NodeKey) -> Result<Vec<String>, DomError> {
    arena
        .children(container)?
        .iter()
        .map(|&child| node_line(arena, child))
        .collect()
}

fn walk(
    arena: &DomArena,
    key: NodeKey,
    depth: usize,
    out: &mut Vec<String>,
    left: &mut usize,
) -> Result<(), DomError> {
    if *left == 0 {
        return Ok(());
    }
    *left -= 1;
    out.push(INDENT_STEP.repeat(depth) + &node_line(arena, key)?);
    for &child in arena.children(key)? {
        walk(arena, child, depth + 1, out, left)?;
    }
    Ok(())
}

fn node_line(arena: &DomArena, key: NodeKey) -> Result<String, DomError> {
    let mut line = String::with_capacity(64);
    let kind = arena.kind(key)?;
    match kind {
        NodeKind::Element {
            name, namespace, ..
        } => {
            line.push('<');
            if *namespace == Namespace::Svg {
                line.push_str("svg:");
            }
            line.push_str(name);
            for attr in ["id", "class"] {
                if let Some(value) = kind.attr(attr) {
                    line.push(' ');
                    line.push_str(attr);
                    line.push_str("=\"");
                    line.push_str(value);
                    line.push('"');
                }
            }
            line.push('>');
        }
        NodeKind::Text { text } => {
            line.push('"');
            push_preview(&mut line, text);
            line.push('"');
        }
        NodeKind::Comment { text } => {
            line.push_str("<!-- ");
            push_preview(&mut line, text.trim());
            line.push_str(" -->");
        }
    }
    if let Some(order) = arena.claim_order(key)? {
        line.push('@');
        line.push_str(&order.0.to_string());
    }
    Ok(line)
}

fn push_preview(out: &mut String, s: &str) {
    for (i, ch) in s.chars().enumerate() {
        if i == PREVIEW_CHARS {
            out.push('…');
            return;
        }
        out.push(if ch == '\n' { ' ' } else { ch });
    }
}
