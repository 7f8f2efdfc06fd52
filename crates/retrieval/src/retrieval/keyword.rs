//! Exhaustive keyword and metadata scans
//!
//! Counting and listing queries need completeness that top-k vector
//! search cannot give, so these run over the whole collection via the
//! store's scroll API. Matching is diacritic-insensitive; Latin-script
//! keywords are word-boundary matched (so "isa" never matches inside
//! "disaster") while Arabic keywords match by substring.

use crate::classifier::MetadataFilter;
use bayan_common::clients::VectorStore;
use bayan_common::errors::Result;
use bayan_common::types::{SearchFilter, SearchHit};

/// Arabic tashkeel / combining mark ranges
fn is_tashkeel(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06DC}'
        | '\u{06DF}'..='\u{06E4}'
        | '\u{06E7}'..='\u{06E8}'
        | '\u{06EA}'..='\u{06ED}'
    )
}

/// Remove Arabic diacritics for fuzzy matching
pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|c| !is_tashkeel(*c)).collect()
}

fn is_latin(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_ascii())
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut search_from = 0;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            return true;
        }
        search_from = start + needle.len().max(1);
    }
    false
}

/// True when any keyword appears in the text
pub fn text_matches(text: &str, keywords: &[String]) -> bool {
    let normalized = strip_diacritics(text).to_lowercase();
    for kw in keywords {
        let kw_normalized = strip_diacritics(kw).to_lowercase();
        if is_latin(&kw_normalized) {
            if contains_word(&normalized, &kw_normalized) {
                return true;
            }
        } else if normalized.contains(&kw_normalized) {
            return true;
        }
    }
    false
}

/// Scroll the whole collection and return hits matching any keyword,
/// in either the Arabic or the English text. Keyword hits carry a fixed
/// score of 1.0.
pub async fn keyword_search(
    store: &dyn VectorStore,
    keywords: &[String],
    category: Option<&str>,
    max_results: usize,
    batch_size: usize,
) -> Result<Vec<SearchHit>> {
    if keywords.is_empty() {
        return Ok(Vec::new());
    }

    let filter = match category {
        Some(cat) => SearchFilter::category(cat),
        None => SearchFilter::default(),
    };

    let mut matches: Vec<SearchHit> = Vec::new();
    let mut offset = None;

    loop {
        let page = store.scroll(&filter, offset, batch_size).await?;

        for mut hit in page.points {
            if text_matches(hit.payload.content_arabic(), keywords)
                || text_matches(hit.payload.content_english(), keywords)
            {
                hit.score = 1.0;
                matches.push(hit);
                if matches.len() >= max_results {
                    break;
                }
            }
        }

        if matches.len() >= max_results {
            break;
        }
        match page.next_offset {
            Some(next) => offset = Some(next),
            None => break,
        }
    }

    tracing::info!(
        matched = matches.len(),
        keywords = ?&keywords[..keywords.len().min(5)],
        "Keyword search complete"
    );
    Ok(matches)
}

/// Fetch hits by structural locator, sorted in canonical corpus order.
pub async fn metadata_search(
    store: &dyn VectorStore,
    metadata_filter: &MetadataFilter,
    max_results: usize,
    batch_size: usize,
) -> Result<Vec<SearchHit>> {
    let filter = SearchFilter {
        surah_number: metadata_filter.surah_number,
        ayah_number: metadata_filter.ayah_number,
        juz: metadata_filter.juz,
        ..SearchFilter::default()
    };
    if filter.is_empty() {
        return Ok(Vec::new());
    }

    let mut results: Vec<SearchHit> = Vec::new();
    let mut offset = None;

    loop {
        let page = store.scroll(&filter, offset, batch_size).await?;
        for mut hit in page.points {
            hit.score = 1.0;
            results.push(hit);
            if results.len() >= max_results {
                break;
            }
        }
        if results.len() >= max_results {
            break;
        }
        match page.next_offset {
            Some(next) => offset = Some(next),
            None => break,
        }
    }

    results.sort_by_key(|h| h.payload.canonical_key());

    tracing::info!(
        found = results.len(),
        surah = ?metadata_filter.surah_number,
        ayah = ?metadata_filter.ayah_number,
        juz = ?metadata_filter.juz,
        "Metadata search complete"
    );
    Ok(results)
}
