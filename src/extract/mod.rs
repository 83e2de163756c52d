use scraper::{Html, Selector};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::{ScraperError, ScraperResult};


// Role selectors for one review row on the host page. Each role is queried
// independently; rows are reconstructed by position (see `align_records`).
const REVIEWER_NAME: &str = "div.d4r55";
const REVIEW_RATING: &str = "span.kvMYJc";
const REVIEW_DATE: &str = "span.rsqaWe";
const REVIEW_TEXT: &str = "span.wiI7pd";

/// One extracted review. All fields are best-effort strings; a role missing
/// for this position yields an empty string, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub name: String,
    pub stars: String,
    pub date: String,
    pub text: String,
}

/// Ordered mapping of `"review{n}"` keys (1-based rendering order) to
/// records. Keys are stable only within one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSet {
    records: Vec<ReviewRecord>,
}

impl ReviewSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ReviewRecord> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (String, &ReviewRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| (format!("review{}", i + 1), record))
    }
}

impl From<Vec<ReviewRecord>> for ReviewSet {
    fn from(records: Vec<ReviewRecord>) -> Self {
        Self { records }
    }
}

// Serialized as a JSON object with keys in rendering order. serde_json's
// Value type would re-sort keys lexicographically ("review10" before
// "review2"), so the map is emitted directly.
impl Serialize for ReviewSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (key, record) in self.iter() {
            map.serialize_entry(&key, record)?;
        }
        map.end()
    }
}

/// Reconstructs review rows by position across four independently-queried
/// sequences. The sequences may have different lengths; absent positions
/// default to empty fields.
///
/// This positional join is only correct while all four selectors return
/// elements in the same document order per logical review; a markup change
/// that reorders one role relative to another misaligns records silently.
pub fn align_records(
    names: Vec<String>,
    stars: Vec<String>,
    dates: Vec<String>,
    texts: Vec<String>,
) -> ReviewSet {
    let max_len = [names.len(), stars.len(), dates.len(), texts.len()]
        .into_iter()
        .max()
        .unwrap_or(0);

    let field = |seq: &[String], i: usize| seq.get(i).cloned().unwrap_or_default();

    let records = (0..max_len)
        .map(|i| ReviewRecord {
            name: field(&names, i),
            stars: field(&stars, i),
            date: field(&dates, i),
            text: field(&texts, i),
        })
        .collect();

    ReviewSet { records }
}

/// Extracts all rendered reviews from a page snapshot.
///
/// Pure read over the HTML; the page is never touched. Must only be run once
/// loading has finished, on the final snapshot.
pub fn extract_reviews(html: &str) -> ScraperResult<ReviewSet> {
    let document = Html::parse_document(html);

    let names = collect_texts(&document, REVIEWER_NAME)?;
    let stars = collect_attrs(&document, REVIEW_RATING, "aria-label")?;
    let dates = collect_texts(&document, REVIEW_DATE)?;
    let texts = collect_texts(&document, REVIEW_TEXT)?;

    Ok(align_records(names, stars, dates, texts))
}

fn parse_selector(selector: &str) -> ScraperResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScraperError::Extraction(format!("invalid selector {selector}: {e}")))
}

fn collect_texts(document: &Html, selector: &str) -> ScraperResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect())
}

fn collect_attrs(document: &Html, selector: &str, attr: &str) -> ScraperResult<Vec<String>> {
    let selector = parse_selector(selector)?;
    Ok(document
        .select(&selector)
        .map(|element| element.value().attr(attr).unwrap_or_default().trim().to_string())
        .collect())
}
