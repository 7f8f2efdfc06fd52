//! Query intent classification
//!
//! Maps a question string to a [`QueryIntent`] that drives the search
//! strategy:
//! - structural facts answered from constants (no search at all)
//! - metadata lookups by surah/ayah/juz locators (filtered scan)
//! - counting/listing queries (exhaustive keyword scan)
//! - everything else: top-k semantic search
//!
//! Classification is a total function; it never fails and defaults to
//! semantic.

pub mod entities;
pub mod tables;

use bayan_common::config::RetrievalConfig;
use regex_lite::Regex;

/// Search strategy selected for a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Semantic,
    Counting,
    Listing,
    Metadata,
}

/// Conjunctive structural locator; all present fields must match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub surah_number: Option<u32>,
    pub ayah_number: Option<u32>,
    pub juz: Option<u32>,
}

/// Classified intent, produced exactly once per question
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIntent {
    pub query_type: QueryType,
    pub keywords: Vec<String>,
    pub max_results: usize,
    pub metadata_filter: Option<MetadataFilter>,
    pub structural_context: Option<String>,
}

impl QueryIntent {
    fn semantic(max_results: usize) -> Self {
        Self {
            query_type: QueryType::Semantic,
            keywords: Vec::new(),
            max_results,
            metadata_filter: None,
            structural_context: None,
        }
    }
}

/// Compiled classification patterns, built once and shared read-only
pub struct QueryClassifier {
    ayah_ref: Regex,
    juz_ref: Regex,
    first_surah: Regex,
    last_surah: Regex,
    first_ayah: Regex,
    last_ayah: Regex,
    surah_by_number: Regex,
    surah_ordinal: Regex,
    ayah_by_number: Regex,
    ayah_ordinal: Regex,
    surah_name_prefix: Regex,
    fact_surah_count: Regex,
    fact_surah_count_excl: Regex,
    fact_ayah_count: Regex,
    fact_ayah_count_excl: Regex,
    fact_juz_count: Regex,
    counting: Vec<Regex>,
    listing: Vec<Regex>,
    semantic_max: usize,
    counting_max: usize,
    listing_max: usize,
}

const COUNTING_PATTERNS: &[&str] = &[
    r"\bhow many\b",
    r"\bhow often\b",
    r"\bcount\b",
    r"\bnumber of times\b",
    r"\bnumber of\b",
    r"\bhow frequently\b",
    r"\btotal\s+(?:number|count|times|mentions|occurrences)\b",
];

const LISTING_PATTERNS: &[&str] = &[
    r"\blist all\b",
    r"\ball mentions\b",
    r"\bevery verse\b",
    r"\bevery ayah\b",
    r"\bwhich verses\b",
    r"\bwhich ayah\b",
    r"\bwhich surahs?\b",
    r"\ball (?:the )?verses\b",
    r"\ball (?:the )?ayahs?\b",
    r"\bshow (?:me )?all\b",
    r"\beach (?:verse|ayah|mention)\b",
];

/// Ayahs in a juz can run to ~560; generous cap for juz-level lookups
const JUZ_MAX_RESULTS: usize = 600;

/// Fallback when a surah number falls outside the size table
const SURAH_MAX_FALLBACK: usize = 300;

impl QueryClassifier {
    pub fn new(cfg: &RetrievalConfig) -> Self {
        let compile = |p: &str| Regex::new(p).expect("static pattern");
        Self {
            ayah_ref: compile(r"\b(\d{1,3}):(\d{1,3})\b"),
            juz_ref: compile(r"\b(?:juz|para|juzz)\s+(\d{1,2})\b"),
            first_surah: compile(r"\bfirst\s+surah\b"),
            last_surah: compile(r"\blast\s+surah\b"),
            first_ayah: compile(r"\bfirst\s+ayah\b"),
            last_ayah: compile(r"\blast\s+ayah\b"),
            surah_by_number: compile(r"\b(?:surah|sura|chapter)\s+(?:number\s+)?(\d{1,3})\b"),
            surah_ordinal: compile(r"\b(\d{1,3})(?:st|nd|rd|th)\s+(?:surah|sura|chapter)\b"),
            ayah_by_number: compile(r"\b(?:ayah|ayat|verse)\s+(\d{1,3})\b"),
            ayah_ordinal: compile(r"\b(\d{1,3})(?:st|nd|rd|th)\s+(?:ayah|ayat|verse)\b"),
            surah_name_prefix: compile(r"\b(?:surah|sura|chapter)\s+(.+?)(?:\s*\?|$)"),
            fact_surah_count: compile(
                r"\b(?:how many|number of|total)\b.*\bsurah'?s?\b|\b(?:how many|number of|total)\b.*\b(?:suras|chapters)\b",
            ),
            fact_surah_count_excl: compile(
                r"\b(?:ayah|ayat|verse)s?\b.*\b(?:surah|sura|chapter)\b",
            ),
            fact_ayah_count: compile(r"\b(?:how many|number of|total)\b.*\b(?:ayah|ayat|verse)s?\b"),
            fact_ayah_count_excl: compile(r"\b(?:surah|sura|chapter)\s+\w"),
            fact_juz_count: compile(r"\b(?:how many|number of|total)\b.*\b(?:juz|para|part)s?\b"),
            counting: COUNTING_PATTERNS.iter().map(|p| compile(p)).collect(),
            listing: LISTING_PATTERNS.iter().map(|p| compile(p)).collect(),
            semantic_max: cfg.semantic_top_k,
            counting_max: cfg.counting_max_results,
            listing_max: cfg.listing_max_results,
        }
    }

    /// Classify query intent. Total function; always returns a
    /// best-effort classification.
    pub fn classify(&self, question: &str) -> QueryIntent {
        // Structural facts short-circuit all search
        if let Some(fact) = self.detect_structural_fact(question) {
            return QueryIntent {
                query_type: QueryType::Metadata,
                keywords: Vec::new(),
                max_results: 0,
                metadata_filter: None,
                structural_context: Some(fact.to_string()),
            };
        }

        if let Some(filter) = self.detect_metadata(question) {
            let max_results = if filter.ayah_number.is_some() {
                1
            } else if let Some(surah) = filter.surah_number {
                tables::ayah_count(surah)
                    .map(|c| c as usize)
                    .unwrap_or(SURAH_MAX_FALLBACK)
            } else {
                JUZ_MAX_RESULTS
            };
            return QueryIntent {
                query_type: QueryType::Metadata,
                keywords: Vec::new(),
                max_results,
                metadata_filter: Some(filter),
                structural_context: None,
            };
        }

        let keywords = entities::extract_keywords(question);

        if self.counting.iter().any(|p| matches_lower(p, question)) {
            return QueryIntent {
                query_type: QueryType::Counting,
                keywords,
                max_results: self.counting_max,
                metadata_filter: None,
                structural_context: None,
            };
        }

        if self.listing.iter().any(|p| matches_lower(p, question)) {
            return QueryIntent {
                query_type: QueryType::Listing,
                keywords,
                max_results: self.listing_max,
                metadata_filter: None,
                structural_context: None,
            };
        }

        QueryIntent::semantic(self.semantic_max)
    }

    fn detect_structural_fact(&self, question: &str) -> Option<&'static str> {
        let q = question.to_lowercase();

        // Surah count, unless ayahs-within-a-surah are the real subject
        if self.fact_surah_count.is_match(&q) && !self.fact_surah_count_excl.is_match(&q) {
            return Some(tables::SURAH_COUNT_FACT);
        }

        // Total ayah count; "ayahs in surah X" falls through to metadata
        if self.fact_ayah_count.is_match(&q) && !self.fact_ayah_count_excl.is_match(&q) {
            return Some(tables::AYAH_COUNT_FACT);
        }

        if self.fact_juz_count.is_match(&q) {
            return Some(tables::JUZ_COUNT_FACT);
        }

        None
    }

    fn detect_metadata(&self, question: &str) -> Option<MetadataFilter> {
        let q = question.to_lowercase();
        let mut filter = MetadataFilter::default();
        let mut matched = false;

        // 1. Exact ayah reference: "2:255"
        if let Some(caps) = self.ayah_ref.captures(question) {
            filter.surah_number = caps[1].parse().ok();
            filter.ayah_number = caps[2].parse().ok();
            return Some(filter);
        }

        // 2. Juz/para reference: "juz 30"
        if let Some(caps) = self.juz_ref.captures(&q) {
            filter.juz = caps[1].parse().ok();
            return Some(filter);
        }

        // 3. Ordinal/positional references
        if self.first_surah.is_match(&q) {
            filter.surah_number = Some(1);
            return Some(filter);
        }
        if self.last_surah.is_match(&q) {
            filter.surah_number = Some(114);
            return Some(filter);
        }
        if self.first_ayah.is_match(&q) {
            filter.surah_number = Some(1);
            filter.ayah_number = Some(1);
            return Some(filter);
        }
        if self.last_ayah.is_match(&q) {
            filter.surah_number = Some(114);
            filter.ayah_number = Some(6);
            return Some(filter);
        }

        // 4. Surah by number or ordinal: "surah 2", "18th surah"
        let surah_num = self
            .surah_by_number
            .captures(&q)
            .or_else(|| self.surah_ordinal.captures(&q));
        if let Some(caps) = surah_num {
            filter.surah_number = caps[1].parse().ok();
            matched = true;
        }

        // 5. Ayah by number or ordinal: "ayah 255", "5th verse"
        let ayah_num = self
            .ayah_by_number
            .captures(&q)
            .or_else(|| self.ayah_ordinal.captures(&q));
        if let Some(caps) = ayah_num {
            filter.ayah_number = caps[1].parse().ok();
            matched = true;
        }

        if matched {
            return Some(filter);
        }

        // 6. Surah by name after an explicit unit keyword
        if let Some(caps) = self.surah_name_prefix.captures(&q) {
            let name_part = caps[1].trim().trim_end_matches('?').trim();
            if let Some(number) = alias_lookup(name_part) {
                filter.surah_number = Some(number);
                return Some(filter);
            }
            let without_al = name_part
                .strip_prefix("al-")
                .or_else(|| name_part.strip_prefix("al "))
                .unwrap_or(name_part);
            if let Some(number) = alias_lookup(without_al) {
                filter.surah_number = Some(number);
                return Some(filter);
            }
        }

        // 7. Standalone surah name. Latin aliases need 5+ chars and word
        //    boundaries to avoid false positives ("tur" inside other
        //    words, "rum" as the drink); short names still match through
        //    step 6. Arabic aliases match by substring.
        for (name, number) in tables::SURAH_ALIASES {
            let is_arabic = name.chars().any(|c| c.is_alphabetic() && !c.is_ascii());
            if is_arabic {
                if name.chars().count() >= 2 && question.contains(name) {
                    filter.surah_number = Some(*number);
                    return Some(filter);
                }
            } else if name.len() >= 5 && contains_word(&q, name) {
                filter.surah_number = Some(*number);
                return Some(filter);
            }
        }

        None
    }
}

fn matches_lower(pattern: &Regex, question: &str) -> bool {
    pattern.is_match(&question.to_lowercase())
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Substring match with ASCII word boundaries on both sides
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

fn alias_lookup(name: &str) -> Option<u32> {
    tables::SURAH_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, number)| *number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(&RetrievalConfig::default())
    }

    #[test]
    fn test_ayah_reference_exact() {
        let intent = classifier().classify("What does 2:255 say?");
        assert_eq!(intent.query_type, QueryType::Metadata);
        let filter = intent.metadata_filter.unwrap();
        assert_eq!(filter.surah_number, Some(2));
        assert_eq!(filter.ayah_number, Some(255));
        assert_eq!(intent.max_results, 1);
    }

    #[test]
    fn test_structural_fact_surah_count() {
        let intent = classifier().classify("How many surahs does the Quran have?");
        assert_eq!(intent.query_type, QueryType::Metadata);
        assert!(intent.structural_context.is_some());
        assert_eq!(intent.max_results, 0);
        assert!(intent.metadata_filter.is_none());
    }

    #[test]
    fn test_ayahs_in_surah_is_metadata_not_fact() {
        let intent = classifier().classify("How many ayahs in surah Yasin?");
        assert_eq!(intent.query_type, QueryType::Metadata);
        assert!(intent.structural_context.is_none());
        let filter = intent.metadata_filter.unwrap();
        assert_eq!(filter.surah_number, Some(36));
        assert_eq!(intent.max_results, 83);
    }

    #[test]
    fn test_surah_by_name_with_prefix() {
        let intent = classifier().classify("Show me surah al-ikhlas");
        let filter = intent.metadata_filter.unwrap();
        assert_eq!(filter.surah_number, Some(112));
        assert_eq!(intent.max_results, 4);
    }

    #[test]
    fn test_short_alias_needs_unit_keyword() {
        // "rum" standalone must not resolve (below the length threshold)
        let intent = classifier().classify("Tell me about rum");
        assert_eq!(intent.query_type, QueryType::Semantic);

        // With the unit keyword it resolves through step 6
        let intent = classifier().classify("Tell me about surah rum");
        assert_eq!(intent.metadata_filter.unwrap().surah_number, Some(30));
    }

    #[test]
    fn test_standalone_long_name() {
        let intent = classifier().classify("What is al-ikhlas about?");
        assert_eq!(intent.metadata_filter.unwrap().surah_number, Some(112));
    }

    #[test]
    fn test_ordinal_surah() {
        let intent = classifier().classify("What is the 18th surah?");
        assert_eq!(intent.metadata_filter.unwrap().surah_number, Some(18));
    }

    #[test]
    fn test_first_and_last_locators() {
        let c = classifier();
        assert_eq!(
            c.classify("recite the first surah")
                .metadata_filter
                .unwrap()
                .surah_number,
            Some(1)
        );
        let last_ayah = c.classify("what is the last ayah").metadata_filter.unwrap();
        assert_eq!(last_ayah.surah_number, Some(114));
        assert_eq!(last_ayah.ayah_number, Some(6));
    }

    #[test]
    fn test_juz_reference() {
        let intent = classifier().classify("Summarize juz 30");
        assert_eq!(intent.metadata_filter.unwrap().juz, Some(30));
        assert_eq!(intent.max_results, 600);
    }

    #[test]
    fn test_counting_with_keywords() {
        let intent = classifier().classify("How many times is Moses mentioned?");
        assert_eq!(intent.query_type, QueryType::Counting);
        assert_eq!(intent.max_results, 100);
        assert!(intent.keywords.contains(&"musa".to_string()));
    }

    #[test]
    fn test_listing() {
        let intent = classifier().classify("List all verses about patience");
        assert_eq!(intent.query_type, QueryType::Listing);
        assert_eq!(intent.max_results, 50);
        assert!(intent.keywords.contains(&"sabr".to_string()));
    }

    #[test]
    fn test_semantic_fallback() {
        let intent = classifier().classify("What does the Quran teach about honesty?");
        assert_eq!(intent.query_type, QueryType::Semantic);
        assert!(intent.keywords.is_empty());
        assert_eq!(intent.max_results, 10);
    }

    #[test]
    fn test_classification_idempotent() {
        let c = classifier();
        let q = "How many times is Isa mentioned in the Quran?";
        assert_eq!(c.classify(q), c.classify(q));
    }

    #[test]
    fn test_contains_word_boundaries() {
        assert!(contains_word("about ikhlas today", "ikhlas"));
        assert!(!contains_word("disaster", "isa"));
        assert!(contains_word("al-ikhlas?", "al-ikhlas"));
    }
}
