use hydrate::DomPatch;

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    use std::fmt::Write;
    let max = expected.len().max(actual.len());
    fn line(lines: &[String], i: usize) -> &str {
        lines.get(i).map(String::as_str).unwrap_or("<missing>")
    }
    let mut out = String::new();
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for idx in start..end {
            let marker = if idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// One-line rendering of a patch, e.g. `insert #3 into #1 before #2`.
pub fn format_patch(patch: &DomPatch) -> String {
    match patch {
        DomPatch::CreateElement { key, name, .. } => format!("create {key} <{name}>"),
        DomPatch::CreateText { key, text } => format!("create {key} \"{}\"", escape_text(text)),
        DomPatch::CreateComment { key, text } => {
            format!("create {key} <!--{}-->", escape_text(text))
        }
        DomPatch::AppendChild { parent, child } => format!("append {child} to {parent}"),
        DomPatch::InsertBefore {
            parent,
            child,
            before,
        } => format!("insert {child} into {parent} before {before}"),
        DomPatch::Detach { key } => format!("detach {key}"),
        DomPatch::SetText { key, text } => format!("set-text {key} \"{}\"", escape_text(text)),
        DomPatch::SplitText {
            key,
            offset,
            new_key,
        } => format!("split {key} at {offset} into {new_key}"),
        DomPatch::SetAttribute { key, name, value } => match value {
            Some(value) => format!("set-attr {key} {name}=\"{}\"", escape_text(value)),
            None => format!("set-attr {key} {name}"),
        },
        DomPatch::RemoveAttribute { key, name } => format!("remove-attr {key} {name}"),
        other => format!("{other:?}"),
    }
}

pub mod scenario;
