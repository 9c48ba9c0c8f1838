//! Bare-reference pass: link plain EFTA IDs to their PDFs and dataset
//! mentions to their browse pages.
//!
//! Every pass collects its matches left to right, then splices from the
//! highest offset down so offsets of not-yet-processed matches stay valid.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::context::{CodeFences, is_already_linked};
use crate::ranges::DatasetIndex;
use crate::types::{DatasetReference, DocumentId, LinkifyOutcome, Rewrite, RewriteSpan, SpanKind};
use crate::urls::{dataset_browse_url, document_url, render_link};

/// `EFTA` followed by 7–8 digits and a word boundary, so a longer digit run
/// is not cut short.
static EFTA_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"EFTA\d{7,8}\b").expect("valid regex");
});

/// `Dataset 9`, `Data Set 10`. The trailing word boundary keeps `Dataset 123`
/// from being read as dataset 12.
static DATASET_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"(?i)(?:Dataset|Data\s+Set)\s+(\d{1,2})\b").expect("valid regex");
});

/// `DS8`, case-sensitive and word-bounded.
static DS_SHORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\bDS(\d{1,2})\b").expect("valid regex");
});

/// `Datasets 8, 9, and 11`, `Dataset 8 and 9`, `Data Sets 8, 9, 11`. Each
/// number is word-bounded so `8, 100` stops after the 8.
static DATASETS_COMPOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(
        r"(?i)((?:Datasets?|Data\s+Sets?)\s+)(\d{1,2}\b(?:\s*,\s*(?:and\s+)?\d{1,2}\b)*(?:\s*,?\s*and\s+\d{1,2}\b)?)",
    )
    .expect("valid regex");
});

/// Any run of digits inside a compound list.
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\d+").expect("valid regex");
});

/// Run the document pass, then the dataset pass.
///
/// # Panics
///
/// Panics if a hardcoded regex is invalid (compile-time invariant).
pub fn linkify_all(text: &str, index: &DatasetIndex<'_>) -> LinkifyOutcome {
    let documents = linkify_document_ids(text, index);
    let datasets = linkify_dataset_refs(&documents.text);
    return LinkifyOutcome {
        dataset_links: datasets.count,
        document_links: documents.count,
        text: datasets.text,
    };
}

/// Link compound and singular dataset references to their browse pages.
///
/// Compound lists are all-or-nothing: one number outside `1..=12` leaves the
/// whole list untouched, including a singular reference at its head. A
/// compound holding a single number is left for the singular pass.
///
/// # Panics
///
/// Panics if a hardcoded regex is invalid (compile-time invariant).
pub fn linkify_dataset_refs(text: &str) -> Rewrite {
    let compound = linkify_compound_dataset_refs(text);
    let mut text = compound.text;
    let mut count = compound.count;

    for pattern in [&*DATASET_SINGLE_RE, &*DS_SHORT_RE] {
        let rejected = rejected_compound_ranges(&text);
        let spans = collect_singular_dataset_spans(&text, pattern)
            .into_iter()
            .filter(|span| return !rejected.iter().any(|r| return r.contains(&span.range.start)))
            .collect();
        let pass = splice_spans(text, spans, |span| {
            let SpanKind::Dataset(ds) = &span.kind else {
                return None;
            };
            return Some(render_link(&dataset_browse_url(ds.get()), &span.matched_text));
        });
        text = pass.text;
        count = count.saturating_add(pass.count);
    }

    return Rewrite { count, text };
}

/// Link every bare EFTA ID whose serial maps to a dataset. IDs in gaps,
/// inside fenced blocks, or already linked are left as they are.
///
/// # Panics
///
/// Panics if the hardcoded EFTA regex is invalid (compile-time invariant).
pub fn linkify_document_ids(text: &str, index: &DatasetIndex<'_>) -> Rewrite {
    let spans: Vec<RewriteSpan> = EFTA_RE
        .find_iter(text)
        .filter_map(|m| {
            let id = DocumentId::parse(m.as_str())?;
            return Some(RewriteSpan {
                range: m.range(),
                kind: SpanKind::Document(id),
                matched_text: m.as_str().to_string(),
            });
        })
        .collect();

    return splice_spans(text.to_string(), spans, |span| {
        let SpanKind::Document(id) = &span.kind else {
            return None;
        };
        let url = document_url(Some(id.serial), index.resolve(id.serial))?;
        return Some(render_link(&url, &id.raw));
    });
}

/// Collect `Dataset N` / `DSN` spans whose number is a valid dataset.
fn collect_singular_dataset_spans(text: &str, pattern: &Regex) -> Vec<RewriteSpan> {
    return pattern
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let ds = DatasetReference::parse(cap.get(1)?.as_str())?;
            return Some(RewriteSpan {
                range: whole.range(),
                kind: SpanKind::Dataset(ds),
                matched_text: whole.as_str().to_string(),
            });
        })
        .collect();
}

/// Compound pass: wrap each number of a multi-number list in its own anchor,
/// keeping the `Datasets ` prefix and the separators verbatim.
fn linkify_compound_dataset_refs(text: &str) -> Rewrite {
    let matches: Vec<(Range<usize>, usize)> = DATASETS_COMPOUND_RE
        .captures_iter(text)
        .filter_map(|cap| return Some((cap.get(0)?.range(), cap.get(2)?.start())))
        .collect();

    let fences = CodeFences::scan(text);
    let mut text = text.to_string();
    let mut count = 0_usize;

    for (range, nums_start) in matches.into_iter().rev() {
        if fences.contains(range.start) || is_already_linked(&text, range.start, range.end) {
            continue;
        }
        let Some(nums_part) = text.get(nums_start..range.end) else {
            continue;
        };
        let Some(numbers) = parse_compound_numbers(nums_part) else {
            continue;
        };
        if numbers.len() <= 1 {
            continue;
        }

        let linked = DIGITS_RE.replace_all(nums_part, |m: &regex::Captures<'_>| {
            let digits = m.get(0).map_or("", |d| return d.as_str());
            return match DatasetReference::parse(digits) {
                Some(ds) => render_link(&dataset_browse_url(ds.get()), digits),
                None => digits.to_string(),
            };
        });
        let linked = linked.into_owned();
        text.replace_range(nums_start..range.end, &linked);
        count = count.saturating_add(numbers.len());
    }

    return Rewrite { count, text };
}

/// Every number in a compound list, or `None` if any is outside `1..=12`.
fn parse_compound_numbers(nums_part: &str) -> Option<Vec<DatasetReference>> {
    return DIGITS_RE
        .find_iter(nums_part)
        .map(|m| return DatasetReference::parse(m.as_str()))
        .collect();
}

/// Compound lists holding a number outside `1..=12`.
fn rejected_compound_ranges(text: &str) -> Vec<Range<usize>> {
    return DATASETS_COMPOUND_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let nums = cap.get(2)?;
            return parse_compound_numbers(nums.as_str()).is_none().then_some(whole.range());
        })
        .collect();
}

/// Apply spans right to left. `render` returns the replacement, or `None`
/// to leave the span as plain text. Spans in fenced blocks or already-linked
/// context are skipped; context is judged against the buffer as rewritten so far.
fn splice_spans<F>(mut text: String, spans: Vec<RewriteSpan>, render: F) -> Rewrite
where
    F: Fn(&RewriteSpan) -> Option<String>,
{
    let fences = CodeFences::scan(&text);
    let mut count = 0_usize;

    for span in spans.into_iter().rev() {
        let (start, end) = (span.range.start, span.range.end);
        if fences.contains(start) || is_already_linked(&text, start, end) {
            continue;
        }
        let Some(replacement) = render(&span) else {
            continue;
        };
        text.replace_range(start..end, &replacement);
        count = count.saturating_add(1);
    }

    return Rewrite { count, text };
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// Linkify with the production DOJ ranges.
    fn run(text: &str) -> LinkifyOutcome {
        return linkify_all(text, &DatasetIndex::doj());
    }

    /// Anchor for a dataset browse page.
    fn browse(ds: u8, label: &str) -> String {
        return render_link(&dataset_browse_url(ds), label);
    }

    #[test]
    fn links_document_id_to_pdf() {
        let out = run("See EFTA00027019 for details.");
        assert_eq!(
            out.text,
            "See <a href=\"https://www.justice.gov/epstein/files/DataSet%208/EFTA00027019.pdf\" target=\"_blank\">EFTA00027019</a> for details."
        );
        assert_eq!(out.document_links, 1);
        assert_eq!(out.dataset_links, 0);
    }

    #[test]
    fn gap_serial_stays_plain() {
        let out = run("EFTA00005587 is unverified.");
        assert_eq!(out.text, "EFTA00005587 is unverified.");
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn seven_digit_ids_are_linked_with_padded_url() {
        let out = run("EFTA0027019");
        assert!(out.text.contains("DataSet%208/EFTA00027019.pdf\" target=\"_blank\">EFTA0027019</a>"));
    }

    #[test]
    fn nine_digit_run_is_not_an_id() {
        let out = run("See EFTA000270190.");
        assert_eq!(out.text, "See EFTA000270190.");
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn multiple_ids_keep_offsets_stable() {
        let out = run("EFTA00027019, EFTA00065479 and EFTA02205655.");
        assert_eq!(out.document_links, 3);
        assert!(out.text.contains("DataSet%208/EFTA00027019.pdf"));
        assert!(out.text.contains("DataSet%209/EFTA00065479.pdf"));
        assert!(out.text.contains("DataSet%2011/EFTA02205655.pdf"));
        assert!(out.text.ends_with("</a>."));
    }

    #[test]
    fn compound_reference_links_each_number() {
        let out = run("Datasets 8, 9, and 11 are relevant.");
        let expected = format!(
            "Datasets {}, {}, and {} are relevant.",
            browse(8, "8"),
            browse(9, "9"),
            browse(11, "11")
        );
        assert_eq!(out.text, expected);
        assert_eq!(out.dataset_links, 3);
    }

    #[test]
    fn compound_with_out_of_range_number_is_untouched() {
        let out = run("Datasets 3, 19 were cited.");
        assert_eq!(out.text, "Datasets 3, 19 were cited.");
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn rejected_compound_does_not_link_its_head() {
        for input in ["Dataset 3, 19 were cited.", "Data Set 3 and 19 were cited."] {
            let out = run(input);
            assert_eq!(out.text, input);
            assert_eq!(out.total(), 0);
        }
    }

    #[test]
    fn compound_stops_before_three_digit_number() {
        let out = run("Datasets 8, 100 were cited.");
        assert_eq!(out.text, "Datasets 8, 100 were cited.");
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn spaced_data_sets_compound_is_linked() {
        let out = run("Data Sets 8 and 9");
        assert_eq!(out.text, format!("Data Sets {} and {}", browse(8, "8"), browse(9, "9")));
        assert_eq!(out.dataset_links, 2);
    }

    #[test]
    fn compound_with_valid_numbers_preserves_prefix() {
        let out = run("Datasets 3, 9");
        assert_eq!(out.text, format!("Datasets {}, {}", browse(3, "3"), browse(9, "9")));
        assert_eq!(out.dataset_links, 2);
    }

    #[test]
    fn single_number_compound_is_linked_once() {
        let first = run("Dataset 9 holds most files.");
        assert_eq!(first.text, format!("{} holds most files.", browse(9, "Dataset 9")));
        assert_eq!(first.dataset_links, 1);

        let second = run(&first.text);
        assert_eq!(second.total(), 0);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn singular_forms_and_short_form() {
        let out = run("Data Set 10, dataset 4 and DS8 but not DS13 or Dataset 0.");
        assert_eq!(out.dataset_links, 3);
        assert!(out.text.contains(&browse(10, "Data Set 10")));
        assert!(out.text.contains(&browse(4, "dataset 4")));
        assert!(out.text.contains(&browse(8, "DS8")));
        assert!(out.text.contains("DS13"));
        assert!(out.text.ends_with("or Dataset 0."));
    }

    #[test]
    fn three_digit_dataset_number_is_not_truncated() {
        let out = run("Dataset 123");
        assert_eq!(out.text, "Dataset 123");
    }

    #[test]
    fn already_linked_anchor_is_not_rewrapped() {
        let input = "<a href=\"https://www.justice.gov/x\" target=\"_blank\">EFTA00027019</a>";
        let out = run(input);
        assert_eq!(out.text, input);
        assert_eq!(out.total(), 0);
    }

    #[test]
    fn fenced_block_is_left_alone() {
        let input = "```\nEFTA00027019 in Dataset 8\n```\nEFTA00027019\n";
        let out = run(input);
        assert_eq!(out.document_links, 1);
        assert_eq!(out.dataset_links, 0);
        assert!(out.text.starts_with("```\nEFTA00027019 in Dataset 8\n```\n<a href="));
    }

    #[test]
    fn second_run_adds_nothing() {
        let input = "EFTA00027019 and EFTA00065479 from Datasets 8 and 9; see DS11 and Dataset 12.";
        let first = run(input);
        assert!(first.total() > 0);
        let second = run(&first.text);
        assert_eq!(second.total(), 0);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn converter_output_is_recognised_as_linked() {
        let converted = crate::convert::convert_external_links("[EFTA00027019](https://www.justice.gov/x)");
        assert_eq!(converted.count, 1);
        let out = run(&converted.text);
        assert_eq!(out.total(), 0);
    }
}
