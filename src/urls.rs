//! URL builders for DOJ document PDFs and dataset browse pages.

/// Base for direct PDF links.
const FILES_BASE: &str = "https://www.justice.gov/epstein/files";

/// Base for dataset browse pages.
const DISCLOSURES_BASE: &str = "https://www.justice.gov/epstein/doj-disclosures";

/// Browse page listing the files of one dataset.
pub fn dataset_browse_url(dataset: u8) -> String {
    return format!("{DISCLOSURES_BASE}/data-set-{dataset}-files");
}

/// Direct PDF link for a document. `None` when either the serial or its
/// dataset is unknown.
pub fn document_url(serial: Option<u32>, dataset: Option<u8>) -> Option<String> {
    let (serial, dataset) = (serial?, dataset?);
    return Some(format!(
        "{FILES_BASE}/DataSet%20{dataset}/{}{serial:08}.pdf",
        crate::types::EFTA_PREFIX
    ));
}

/// Anchor markup that opens in a new tab. The label is inserted verbatim.
pub fn render_link(url: &str, label: &str) -> String {
    return format!("<a href=\"{url}\" target=\"_blank\">{label}</a>");
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn document_url_pads_serial() {
        assert_eq!(
            document_url(Some(27_019), Some(8)).as_deref(),
            Some("https://www.justice.gov/epstein/files/DataSet%208/EFTA00027019.pdf")
        );
        assert_eq!(
            document_url(Some(2_205_655), Some(11)).as_deref(),
            Some("https://www.justice.gov/epstein/files/DataSet%2011/EFTA02205655.pdf")
        );
    }

    #[test]
    fn document_url_requires_both_parts() {
        assert_eq!(document_url(None, Some(8)), None);
        assert_eq!(document_url(Some(5_587), None), None);
    }

    #[test]
    fn browse_url_and_anchor() {
        let url = dataset_browse_url(9);
        assert_eq!(url, "https://www.justice.gov/epstein/doj-disclosures/data-set-9-files");
        assert_eq!(
            render_link(&url, "Dataset 9"),
            "<a href=\"https://www.justice.gov/epstein/doj-disclosures/data-set-9-files\" target=\"_blank\">Dataset 9</a>"
        );
    }
}
