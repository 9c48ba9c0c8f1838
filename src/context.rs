//! Context classification: decides whether a candidate span already sits
//! inside a link or code and must be left alone.
//!
//! These are bounded-window string heuristics, not a markdown parser. They
//! only look [`WINDOW`] bytes either side of the span, so deeply nested or
//! unusual markup can be misjudged.

use std::ops::Range;

/// Bytes inspected on each side of a candidate span.
pub const WINDOW: usize = 200;

/// Tail of the before-window searched for an open `href="`.
const HREF_LOOKBACK: usize = 80;

/// Tail of the before-window searched for a raw `http` URL.
const URL_LOOKBACK: usize = 60;

/// Byte regions of a buffer covered by fenced code blocks.
#[derive(Debug, Default)]
pub struct CodeFences {
    /// Regions in ascending order, each spanning from the opening fence line
    /// to the end of the closing fence line (or the end of the buffer).
    regions: Vec<Range<usize>>,
}

impl CodeFences {
    /// Whether `offset` lies inside a fenced block.
    pub fn contains(&self, offset: usize) -> bool {
        return self.regions.iter().any(|r| return r.contains(&offset));
    }

    /// Walk the buffer line by line, toggling at each fence line.
    pub fn scan(text: &str) -> Self {
        let mut regions = Vec::new();
        let mut open_at: Option<usize> = None;
        let mut offset = 0_usize;

        for line in text.split_inclusive('\n') {
            let line_end = offset.saturating_add(line.len());
            if is_fence_line(line) {
                match open_at.take() {
                    None => open_at = Some(offset),
                    Some(start) => regions.push(start..line_end),
                }
            }
            offset = line_end;
        }

        if let Some(start) = open_at {
            regions.push(start..text.len());
        }

        return Self { regions };
    }
}

/// A line whose trimmed content starts with a triple-backtick fence.
pub fn is_fence_line(line: &str) -> bool {
    return line.trim().starts_with("```");
}

/// Check whether the span `start..end` of `text` is already linked or in code.
/// Any single rule firing is enough to skip the span.
pub fn is_already_linked(text: &str, start: usize, end: usize) -> bool {
    let before = text.get(floor_boundary(text, start.saturating_sub(WINDOW))..start).unwrap_or("");
    let after = text.get(end..ceil_boundary(text, end.saturating_add(WINDOW))).unwrap_or("");

    return inside_anchor(before)
        || inside_href(before)
        || is_markdown_link_text(before, after)
        || inside_markdown_link_url(before, after)
        || inside_markdown_link_wrapper(before, after)
        || inside_raw_url(before)
        || inside_inline_code(before);
}

/// Largest char boundary at or below `idx`.
fn floor_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i = i.saturating_sub(1);
    }
    return i;
}

/// Smallest char boundary at or above `idx`.
fn ceil_boundary(text: &str, idx: usize) -> usize {
    let mut i = idx.min(text.len());
    while !text.is_char_boundary(i) {
        i = i.saturating_add(1);
    }
    return i;
}

/// An `<a ` opened more recently than the last `</a>`: we are in its attributes or content.
fn inside_anchor(before: &str) -> bool {
    return match (before.rfind("<a "), before.rfind("</a>")) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        (None, _) => false,
    };
}

/// An `href="` close behind the span whose quote has not been closed yet.
fn inside_href(before: &str) -> bool {
    let Some(pos) = before.rfind("href=\"") else {
        return false;
    };
    if pos < before.len().saturating_sub(HREF_LOOKBACK) {
        return false;
    }
    let value = before.get(pos.saturating_add("href=\"".len())..).unwrap_or("");
    return !value.contains('"');
}

/// Odd number of backticks behind the span means an inline code span is open.
fn inside_inline_code(before: &str) -> bool {
    let ticks = before.bytes().filter(|b| return *b == b'`').count();
    return ticks % 2 == 1;
}

/// `[ ... SPAN ... ](` where the span is part of longer display text.
fn inside_markdown_link_wrapper(before: &str, after: &str) -> bool {
    let Some(open) = before.rfind('[') else {
        return false;
    };
    if !after.contains(')') {
        return false;
    }
    let between = before.get(open.saturating_add(1)..).unwrap_or("");
    return !between.contains("](") && after.starts_with("](");
}

/// `](` precedes the span with no `)` since: we are in a markdown link URL.
fn inside_markdown_link_url(before: &str, after: &str) -> bool {
    let Some(open) = before.rfind("](") else {
        return false;
    };
    if !after.contains(')') {
        return false;
    }
    let between = before.get(open..).unwrap_or("");
    return !between.contains(')');
}

/// A raw `http…` URL is still running when the span starts.
fn inside_raw_url(before: &str) -> bool {
    let tail = before.get(floor_boundary(before, before.len().saturating_sub(URL_LOOKBACK))..).unwrap_or("");
    let Some(pos) = tail.rfind("http") else {
        return false;
    };
    let rest = tail.get(pos..).unwrap_or("");
    return !rest.contains(')');
}

/// `[SPAN](`: the span is exactly the display text of a markdown link.
fn is_markdown_link_text(before: &str, after: &str) -> bool {
    return before.ends_with('[') && after.starts_with("](");
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// Classify the first occurrence of `needle` in `text`.
    fn linked(text: &str, needle: &str) -> bool {
        let start = text.find(needle).unwrap();
        return is_already_linked(text, start, start + needle.len());
    }

    #[test]
    fn plain_text_is_not_linked() {
        assert!(!linked("See EFTA00027019 for details.", "EFTA00027019"));
    }

    #[test]
    fn anchor_content_and_attributes_are_linked() {
        let text = r#"<a href="https://x/EFTA00027019.pdf" target="_blank">EFTA00027019</a>"#;
        assert!(linked(text, "EFTA00027019"));
        let label = text.rfind("EFTA00027019").unwrap();
        assert!(is_already_linked(text, label, label + 12));
    }

    #[test]
    fn closed_anchor_does_not_shadow_later_text() {
        let text = r#"<a href="/a">one</a> and then EFTA00027019 plain"#;
        assert!(!linked(text, "EFTA00027019"));
    }

    #[test]
    fn href_value_is_linked() {
        assert!(linked(r#"<link href="/docs/EFTA00027019.pdf">"#, "EFTA00027019"));
    }

    #[test]
    fn markdown_link_text_and_url_are_linked() {
        assert!(linked("[EFTA00027019](https://example.org/x)", "EFTA00027019"));
        assert!(linked("[doc](/files/EFTA00027019.pdf)", "EFTA00027019"));
        assert!(linked("[see EFTA00027019](/files/x.pdf)", "EFTA00027019"));
    }

    #[test]
    fn raw_url_is_linked() {
        assert!(linked("https://example.org/EFTA00027019", "EFTA00027019"));
    }

    #[test]
    fn inline_code_is_linked() {
        assert!(linked("run `grep EFTA00027019` now", "EFTA00027019"));
        assert!(!linked("`code` then EFTA00027019", "EFTA00027019"));
    }

    #[test]
    fn window_is_bounded() {
        let text = format!("<a href=\"/x\">{}EFTA00027019", "y".repeat(WINDOW + 10));
        assert!(!linked(&text, "EFTA00027019"));
    }

    #[test]
    fn window_respects_char_boundaries() {
        let text = format!("{}EFTA00027019", "📄".repeat(WINDOW));
        assert!(!linked(&text, "EFTA00027019"));
    }

    #[test]
    fn fences_cover_block_and_run_to_end_when_unclosed() {
        let text = "intro\n```\ncode EFTA\n```\nafter\n```\nopen";
        let fences = CodeFences::scan(text);
        assert!(!fences.contains(text.find("intro").unwrap()));
        assert!(fences.contains(text.find("code").unwrap()));
        assert!(!fences.contains(text.find("after").unwrap()));
        assert!(fences.contains(text.find("open").unwrap()));
    }

    #[test]
    fn indented_fence_lines_toggle() {
        assert!(is_fence_line("   ```rust\n"));
        assert!(!is_fence_line("text ```"));
    }
}
