//! Explicit-link pass: turn external markdown links into new-tab anchors.

use std::sync::LazyLock;

use regex::Regex;

use crate::context::is_fence_line;
use crate::types::Rewrite;
use crate::urls::render_link;

/// `[display](http(s)://url)`. Image syntax is filtered after matching
/// because the regex crate has no lookbehind.
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").expect("valid regex");
});

/// Convert `[text](https://…)` to `<a href="…" target="_blank">text</a>`.
///
/// Lines inside fenced code blocks, fence lines themselves, and lines that
/// already carry a `target="_blank"` anchor are passed through untouched.
/// Relative and `#anchor` links never match.
///
/// # Panics
///
/// Panics if the hardcoded link regex is invalid (compile-time invariant).
pub fn convert_external_links(text: &str) -> Rewrite {
    let mut count = 0_usize;
    let mut in_code_block = false;
    let mut lines: Vec<String> = Vec::new();

    for line in text.split('\n') {
        if is_fence_line(line) {
            in_code_block = !in_code_block;
            lines.push(line.to_string());
            continue;
        }
        if in_code_block || has_new_tab_anchor(line) {
            lines.push(line.to_string());
            continue;
        }
        let (converted, n) = convert_line(line);
        count = count.saturating_add(n);
        lines.push(converted);
    }

    return Rewrite {
        count,
        text: lines.join("\n"),
    };
}

/// Rewrite every eligible link on one line.
///
/// An image match is retried one byte past its `[` so a link nested in the
/// alt text is still found.
fn convert_line(line: &str) -> (String, usize) {
    let mut count = 0_usize;
    let mut converted = String::with_capacity(line.len());
    let mut copied = 0_usize;
    let mut pos = 0_usize;

    while let Some(cap) = MD_LINK_RE.captures_at(line, pos) {
        let Some(whole) = cap.get(0) else {
            break;
        };
        if is_image(line, whole.start()) {
            pos = whole.start().saturating_add(1);
            continue;
        }
        converted.push_str(line.get(copied..whole.start()).unwrap_or_default());
        converted.push_str(&render_link(&cap[2], &cap[1]));
        count = count.saturating_add(1);
        copied = whole.end();
        pos = whole.end();
    }
    converted.push_str(line.get(copied..).unwrap_or_default());
    return (converted, count);
}

/// Line already converted by a previous run.
fn has_new_tab_anchor(line: &str) -> bool {
    return line.contains("<a href=") && line.contains("target=\"_blank\"");
}

/// The `[` at `start` is preceded by `!`, making this image syntax.
fn is_image(line: &str, start: usize) -> bool {
    return line.get(..start).is_some_and(|prefix| return prefix.ends_with('!'));
}
