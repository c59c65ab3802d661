use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DEFAULT_PAGE_HEADER_PHRASE;

static TRAILING_PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+\d+\s*$").expect("TRAILING_PAGE_NUMBER is a valid regex pattern")
});

/// Strips repeating page furniture from extracted page text.
#[derive(Clone, Debug)]
pub struct PageNormalizer {
    header: Option<Regex>,
}

impl Default for PageNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_HEADER_PHRASE)
    }
}

impl PageNormalizer {
    /// Builds a normalizer for a header phrase. Matching ignores case, any
    /// whitespace between words, and trailing punctuation on each word, so
    /// "IT Certification Guaranteed, The Easy Way!" also removes
    /// "it certification guaranteed the easy way".
    pub fn new(header_phrase: &str) -> Self {
        let words: Vec<String> = header_phrase
            .split_whitespace()
            .map(|word| {
                let core = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
                let punct = &word[core.len()..];
                if punct.is_empty() {
                    regex::escape(core)
                } else {
                    format!("{}(?:{})?", regex::escape(core), regex::escape(punct))
                }
            })
            .collect();

        if words.is_empty() {
            return Self { header: None };
        }

        let header = match Regex::new(&format!(r"(?i){}", words.join(r"\s*"))) {
            Ok(re) => Some(re),
            Err(err) => {
                log::warn!("Header phrase produced an invalid pattern ({}); header stripping disabled", err);
                None
            }
        };

        Self { header }
    }

    /// Removes header occurrences and one trailing page number. Repeated
    /// application is stable unless the remaining body itself ends in a
    /// number, which a second pass would take for a page number.
    pub fn normalize_page(&self, page: &str) -> String {
        let without_header = match &self.header {
            Some(header) => header.replace_all(page, ""),
            None => page.into(),
        };
        TRAILING_PAGE_NUMBER
            .replace(&without_header, "")
            .into_owned()
    }

    /// Normalizes each page and joins them in page order, one newline per page.
    pub fn normalize_document<S: AsRef<str>>(&self, pages: &[S]) -> String {
        let mut document = String::new();
        for page in pages {
            document.push_str(&self.normalize_page(page.as_ref()));
            document.push('\n');
        }
        document
    }
}
