use scraper::Html;

use crate::types::{SummaryLimits, Summarizer};

pub const NO_SUMMARY: &str = "No summary available.";
pub const ELLIPSIS: &str = "...";

/// Plain text of an HTML fragment: every text node, concatenated as is.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlSummarizer;

impl Summarizer for HtmlSummarizer {
    fn plain_text(&self, raw: &str) -> Option<String> {
        let fragment = Html::parse_fragment(raw);
        Some(fragment.root_element().text().collect())
    }
}

/// Apply the description bounds to already plain text. Lengths count
/// characters, not bytes.
pub fn limit_summary(text: &str, limits: SummaryLimits) -> String {
    if text.chars().count() > limits.check_len {
        let mut cut: String = text.chars().take(limits.slice_len).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        text.to_string()
    }
}

/// Item description for a raw entry summary.
pub fn describe<S>(summary: Option<&str>, summarizer: &S, limits: SummaryLimits) -> String
where
    S: Summarizer + ?Sized,
{
    match summary.and_then(|raw| summarizer.plain_text(raw)) {
        Some(text) => limit_summary(&text, limits),
        None => NO_SUMMARY.to_string(),
    }
}
