use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::extract::ReviewSet;
use crate::ScraperResult;

// Whitespace runs in the business name collapse to a single underscore, so
// "Blue  Bottle Coffee" and "Blue Bottle Coffee" land in the same file.
fn sanitize_business_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

pub fn output_path(dir: impl AsRef<Path>, business: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("output_{}.json", sanitize_business_name(business)))
}

/// Writes the review set as pretty-printed JSON. Only called on a fully
/// successful run; a failed run never produces an output file.
pub fn write_review_set(
    dir: impl AsRef<Path>,
    business: &str,
    reviews: &ReviewSet,
) -> ScraperResult<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let path = output_path(dir, business);
    fs::write(&path, serde_json::to_string_pretty(reviews)?)?;

    info!("Wrote {} review(s) to {}", reviews.len(), path.display());
    Ok(path)
}
