//! Citation building, matching, and finalization
//!
//! Citations mirror the passage grouping used by the source formatter so
//! citation N always describes exactly the material rendered as
//! `[Source N]`. Two finalization modes:
//! - numbered: order is pinned to prompt numbering, no dedup/reorder
//! - unnumbered: dedup by label, keep only citations referenced in the
//!   answer text, reorder by first appearance
//!
//! Auto-translation of Arabic-only citations is best-effort; any failure
//! returns the citations unchanged.

use crate::classifier::{QueryIntent, QueryType};
use crate::format::{hadith_number, passage_groups, source_heading};
use crate::prompts::TRANSLATION_PROMPT;
use bayan_common::clients::LlmClient;
use bayan_common::types::{ChatMessage, ChunkPayload, Citation, SearchHit};
use regex_lite::Regex;

fn optional(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Build a citation from a single hit
pub fn build_citation(hit: &SearchHit) -> Citation {
    let payload = &hit.payload;
    let source = match payload {
        ChunkPayload::Ayah(p) => format!(
            "Quran {}:{} (Surah {})",
            p.surah_number, p.ayah_number, p.surah_name_english
        ),
        ChunkPayload::Hadith(p) => format!("{}, Hadith {}", p.book_title, hadith_number(payload)),
        // Tafsir and passage labels match their source headings
        _ => source_heading(payload),
    };

    let metadata = match payload {
        ChunkPayload::Hadith(p) => p.metadata.clone(),
        _ => None,
    };

    Citation {
        text_arabic: optional(payload.content_arabic()),
        text_english: optional(payload.content_english()),
        source,
        chunk_type: payload.type_name().to_string(),
        metadata,
        auto_translated: false,
    }
}

/// Build one citation from a group of same-ruku ayahs
pub fn build_passage_citation(group: &[SearchHit]) -> Citation {
    let (surah, first_ayah) = group[0].payload.canonical_key();
    let (_, last_ayah) = group[group.len() - 1].payload.canonical_key();
    let surah_name = match &group[0].payload {
        ChunkPayload::Ayah(p) => p.surah_name_english.as_str(),
        _ => "",
    };

    let source = format!("Quran {surah}:{first_ayah}-{last_ayah} (Surah {surah_name})");

    let mut arabic_parts: Vec<String> = Vec::new();
    let mut english_parts: Vec<String> = Vec::new();
    for hit in group {
        let (_, ayah) = hit.payload.canonical_key();
        let arabic = hit.payload.content_arabic();
        let english = hit.payload.content_english();
        if !arabic.is_empty() {
            arabic_parts.push(arabic.to_string());
        }
        if !english.is_empty() {
            english_parts.push(format!("({surah}:{ayah}) {english}"));
        }
    }

    Citation {
        text_arabic: optional(&arabic_parts.join("\n")),
        text_english: optional(&english_parts.join("\n")),
        source,
        chunk_type: "ayah".to_string(),
        metadata: None,
        auto_translated: false,
    }
}

/// Build citations aligned with the `[Source N]` blocks produced by the
/// formatter: per-hit for counting/listing, passage-grouped otherwise.
/// Index i describes block i.
pub fn build_citations(hits: &[SearchHit], intent: &QueryIntent) -> Vec<Citation> {
    if matches!(intent.query_type, QueryType::Counting | QueryType::Listing) {
        return hits.iter().map(build_citation).collect();
    }
    passage_groups(hits)
        .iter()
        .map(|group| {
            if group.len() == 1 {
                build_citation(&group[0])
            } else {
                build_passage_citation(group)
            }
        })
        .collect()
}

/// Deduplicate, auto-translate, and (in unnumbered mode) filter and
/// reorder citations against the answer text.
///
/// In numbered mode both dedup and reorder are skipped — either would
/// desynchronize the N ↔ citation mapping the LLM relied on.
pub async fn finalize_citations(
    llm: &dyn LlmClient,
    answer: &str,
    mut citations: Vec<Citation>,
    numbered: bool,
    max_batch: usize,
    max_chars: usize,
) -> Vec<Citation> {
    if !numbered {
        citations = deduplicate_citations(citations);
    }
    citations = translate_arabic_citations(llm, citations, max_batch, max_chars).await;
    if !numbered {
        citations = filter_and_order_citations(answer, citations);
    }
    citations
}

fn deduplicate_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let before = citations.len();
    let mut seen: Vec<String> = Vec::new();
    let mut result: Vec<Citation> = Vec::new();
    for cit in citations {
        if !seen.contains(&cit.source) {
            seen.push(cit.source.clone());
            result.push(cit);
        }
    }
    if result.len() < before {
        tracing::info!(before, after = result.len(), "Citation dedup");
    }
    result
}

fn filter_and_order_citations(answer: &str, citations: Vec<Citation>) -> Vec<Citation> {
    let total = citations.len();
    let mut matched: Vec<(usize, Citation)> = citations
        .into_iter()
        .filter_map(|cit| find_citation_in_answer(answer, &cit).map(|pos| (pos, cit)))
        .collect();
    matched.sort_by_key(|(pos, _)| *pos);

    tracing::info!(
        referenced = matched.len(),
        total,
        "Citation filtering against answer text"
    );
    matched.into_iter().map(|(_, cit)| cit).collect()
}

/// Earliest byte position where the citation's locator appears in the
/// answer, or None when the answer never references it.
pub fn find_citation_in_answer(answer: &str, citation: &Citation) -> Option<usize> {
    match citation.chunk_type.as_str() {
        "ayah" => {
            let label = Regex::new(r"^Quran (\d+):(\d+)(?:-(\d+))? ").expect("static pattern");
            let caps = label.captures(&citation.source)?;
            let surah: u32 = caps[1].parse().ok()?;
            let first: u32 = caps[2].parse().ok()?;
            let last: u32 = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(first);
            (first..=last).find_map(|ayah| find_reference(answer, &format!("{surah}:{ayah}")))
        }
        "hadith" => {
            let label = Regex::new(r"Hadith (\d+)").expect("static pattern");
            if let Some(caps) = label.captures(&citation.source) {
                let pattern = format!(r"(?i)hadith\s+{}([^0-9]|$)", &caps[1]);
                if let Some(m) = Regex::new(&pattern).ok().and_then(|re| re.find(answer)) {
                    return Some(m.start());
                }
            }
            find_book_title(answer, &citation.source)
        }
        _ => find_book_title(answer, &citation.source),
    }
}

/// Find "s:a" in the answer with digit boundaries on both sides, so
/// "2:25" never matches inside "2:255" or "12:25".
fn find_reference(answer: &str, reference: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = answer[search_from..].find(reference) {
        let start = search_from + rel;
        let end = start + reference.len();
        let before_ok = answer[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_digit());
        let after_ok = answer[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_digit());
        if before_ok && after_ok {
            return Some(start);
        }
        search_from = end;
    }
    None
}

fn find_book_title(answer: &str, source: &str) -> Option<usize> {
    let title = source.split(',').next()?.trim();
    if title.is_empty() {
        return None;
    }
    answer.to_lowercase().find(&title.to_lowercase())
}

/// Auto-translate Arabic-only citations with one batched LLM call.
/// Malformed responses are recovered by padding/truncation; total
/// failure returns the citations unchanged.
pub async fn translate_arabic_citations(
    llm: &dyn LlmClient,
    mut citations: Vec<Citation>,
    max_batch: usize,
    max_chars: usize,
) -> Vec<Citation> {
    let arabic_indices: Vec<usize> = citations
        .iter()
        .enumerate()
        .filter(|(_, c)| c.text_arabic.is_some() && c.text_english.is_none())
        .map(|(i, _)| i)
        .take(max_batch)
        .collect();

    if arabic_indices.is_empty() {
        return citations;
    }

    let numbered_lines: Vec<String> = arabic_indices
        .iter()
        .enumerate()
        .map(|(seq, &idx)| {
            let text = citations[idx].text_arabic.as_deref().unwrap_or("");
            let truncated: String = text.chars().take(max_chars).collect();
            let suffix = if truncated.len() < text.len() { "..." } else { "" };
            format!("{}. {}{}", seq + 1, truncated, suffix)
        })
        .collect();
    let user_message = numbered_lines.join("\n\n");

    let messages = vec![ChatMessage::user(user_message)];
    let raw = match llm.complete(TRANSLATION_PROMPT, &messages, 800, 0.2).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "Translation failed, returning citations untranslated");
            return citations;
        }
    };

    let translations = match parse_json_array(&raw, arabic_indices.len()) {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Translation response unusable, returning untranslated");
            return citations;
        }
    };

    let mut translated = 0;
    for (&idx, translation) in arabic_indices.iter().zip(translations) {
        if !translation.is_empty() {
            citations[idx].text_english = Some(translation);
            citations[idx].auto_translated = true;
            translated += 1;
        }
    }
    tracing::info!(translated, "Auto-translated Arabic-only citations");
    citations
}

/// Parse the LLM response as a JSON array of strings, tolerating
/// markdown fences and trailing commas. Wrong-length arrays are padded
/// or truncated to the expected size.
fn parse_json_array(raw: &str, expected: usize) -> anyhow::Result<Vec<String>> {
    let mut text = raw.trim().to_string();

    let fence = Regex::new(r"(?s)```(?:json)?\s*\n?(.*?)```").expect("static pattern");
    if let Some(caps) = fence.captures(&text) {
        text = caps[1].trim().to_string();
    }

    let parsed: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(_) => {
            // Trailing comma before the closing bracket is the common
            // failure
            let comma = Regex::new(r",\s*\]").expect("static pattern");
            let fixed = comma.replace_all(&text, "]").to_string();
            serde_json::from_str(&fixed).map_err(|e| {
                // Char-based truncation; the response may be Arabic text
                let preview: String = text.chars().take(200).collect();
                anyhow::anyhow!("not a JSON array: {e}: {preview}")
            })?
        }
    };

    let items = parsed
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("expected JSON array, got {parsed}"))?;

    let mut result: Vec<String> = items
        .iter()
        .map(|item| match item {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        })
        .collect();

    if result.len() != expected {
        tracing::warn!(
            got = result.len(),
            expected,
            "Translation array length mismatch, adjusting"
        );
        result.resize(expected, String::new());
    }
    Ok(result)
}
