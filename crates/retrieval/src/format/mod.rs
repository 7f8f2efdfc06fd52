//! Source formatting and tier selection
//!
//! Renders hits into `[Source N]` blocks for the LLM prompt. Semantic
//! queries group consecutive same-ruku ayahs into one passage block;
//! counting/listing render strictly one hit per block so the presented
//! count equals the retrieved count. Tier selection is a three-level
//! fallback: full bilingual → English-only → chunked synthesis.

use crate::budget::estimate_tokens;
use crate::classifier::{QueryIntent, QueryType};
use bayan_common::config::RetrievalConfig;
use bayan_common::types::{ChunkPayload, SearchHit};

/// Separator between source blocks; chunk splitting for tier 3 happens
/// on exactly this boundary so blocks are never torn
pub const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

/// Selected context-fitting strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTier {
    /// Bilingual rendering fits the budget
    Full,
    /// Translation-only rendering fits
    EnglishOnly,
    /// Even translation-only exceeds budget; split across parallel
    /// analysis calls plus one synthesis call
    Chunked,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RenderMode {
    Bilingual,
    EnglishOnly,
}

/// Split hits into runs of consecutive ayahs sharing a ruku; every other
/// hit forms a singleton group. Formatting and citation building both
/// walk this grouping so `[Source N]` and citation N always describe the
/// same material.
pub fn passage_groups(hits: &[SearchHit]) -> Vec<&[SearchHit]> {
    let mut groups = Vec::new();
    let mut i = 0;
    while i < hits.len() {
        let ruku = match &hits[i].payload {
            ChunkPayload::Ayah(p) => p.ruku,
            _ => None,
        };
        if let Some(ruku) = ruku {
            let mut j = i + 1;
            while j < hits.len() {
                match &hits[j].payload {
                    ChunkPayload::Ayah(p) if p.ruku == Some(ruku) => j += 1,
                    _ => break,
                }
            }
            groups.push(&hits[i..j]);
            i = j;
        } else {
            groups.push(&hits[i..i + 1]);
            i += 1;
        }
    }
    groups
}

/// Build sources text and query context at the full (bilingual) tier
pub fn build_sources_and_context(hits: &[SearchHit], intent: &QueryIntent) -> (String, String) {
    build_with_mode(hits, intent, RenderMode::Bilingual)
}

/// Build sources under the tier fallback ladder. Monotone in budget:
/// shrinking budget only ever moves full → english_only → chunked.
pub fn build_sources_tiered(
    hits: &[SearchHit],
    intent: &QueryIntent,
    budget: usize,
    cfg: &RetrievalConfig,
) -> (String, String, SourceTier) {
    let (full_text, query_context) = build_with_mode(hits, intent, RenderMode::Bilingual);
    if estimate_tokens(&full_text, cfg) <= budget {
        return (full_text, query_context, SourceTier::Full);
    }

    let (english_text, query_context) = build_with_mode(hits, intent, RenderMode::EnglishOnly);
    if estimate_tokens(&english_text, cfg) <= budget {
        tracing::info!("Sources exceed budget, dropped Arabic text");
        return (english_text, query_context, SourceTier::EnglishOnly);
    }

    // Global numbering is preserved; the chunk splitter cuts between
    // blocks only
    tracing::info!("Sources exceed budget even English-only, chunked synthesis");
    (english_text, query_context, SourceTier::Chunked)
}

/// Split a sources text into chunks that each fit the budget, cutting
/// only on source-block boundaries. A single oversized block becomes its
/// own chunk rather than being torn apart.
pub fn split_sources_into_chunks(
    sources_text: &str,
    budget: usize,
    cfg: &RetrievalConfig,
) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for block in sources_text.split(SOURCE_SEPARATOR) {
        let candidate = if current.is_empty() {
            block.to_string()
        } else {
            format!("{current}{SOURCE_SEPARATOR}{block}")
        };
        if !current.is_empty() && estimate_tokens(&candidate, cfg) > budget {
            chunks.push(current);
            current = block.to_string();
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn build_with_mode(
    hits: &[SearchHit],
    intent: &QueryIntent,
    mode: RenderMode,
) -> (String, String) {
    if let Some(fact) = &intent.structural_context {
        let sources_text = format!(
            "[Database Metadata — Structural Fact]\n{fact}\n\
             This information comes from the corpus database structure."
        );
        let query_context = "This is a structural fact about the Quran answered from the \
             database. The factual answer is provided in the sources above — present it \
             confidently as an authoritative fact. Do NOT say the sources are insufficient."
            .to_string();
        return (sources_text, query_context);
    }

    let exhaustive = matches!(intent.query_type, QueryType::Counting | QueryType::Listing);

    let blocks: Vec<String> = if exhaustive {
        hits.iter()
            .enumerate()
            .map(|(i, hit)| format_source(hit, i + 1, mode))
            .collect()
    } else {
        passage_groups(hits)
            .iter()
            .enumerate()
            .map(|(i, group)| {
                if group.len() == 1 {
                    format_source(&group[0], i + 1, mode)
                } else {
                    format_passage(group, i + 1, mode)
                }
            })
            .collect()
    };
    let mut sources_text = blocks.join(SOURCE_SEPARATOR);

    // Metadata lookups get a verification header so the LLM treats the
    // result set as exact
    let query_context;
    if intent.query_type == QueryType::Metadata && intent.metadata_filter.is_some() && !hits.is_empty()
    {
        let mf = intent.metadata_filter.as_ref().unwrap();
        let surah_name = match &hits[0].payload {
            ChunkPayload::Ayah(p) => p.surah_name_english.clone(),
            ChunkPayload::Tafsir(p) => p.surah_name_english.clone().unwrap_or_default(),
            _ => String::new(),
        };

        let mut parts: Vec<String> = Vec::new();
        if let Some(surah) = mf.surah_number {
            if surah_name.is_empty() {
                parts.push(format!("Surah {surah}"));
            } else {
                parts.push(format!("Surah {surah_name} (#{surah})"));
            }
        }
        if let Some(ayah) = mf.ayah_number {
            parts.push(format!("Ayah {ayah}"));
        }
        if let Some(juz) = mf.juz {
            parts.push(format!("Juz {juz}"));
        }
        let metadata_desc = if parts.is_empty() {
            String::new()
        } else {
            format!(" from {}", parts.join(", "))
        };

        let header = match (mf.surah_number, surah_name.is_empty()) {
            (Some(surah), false) => format!(
                "[Database Metadata]\nThe following {} ayah(s) were retrieved{}. \
                 Surah {} is surah number {} out of 114 surahs in the Quran.",
                hits.len(),
                metadata_desc,
                surah_name,
                surah
            ),
            _ => format!(
                "[Database Metadata]\nThe following {} ayah(s) were retrieved{}.",
                hits.len(),
                metadata_desc
            ),
        };
        sources_text = format!("{header}{SOURCE_SEPARATOR}{sources_text}");
        query_context = build_query_context(intent.query_type, hits.len(), &metadata_desc);
    } else {
        query_context = build_query_context(intent.query_type, hits.len(), "");
    }

    (sources_text, query_context)
}

fn build_query_context(query_type: QueryType, total_sources: usize, metadata_desc: &str) -> String {
    match query_type {
        QueryType::Metadata => format!(
            "This is a structural/metadata lookup. The system has directly retrieved \
             {total_sources} ayah(s){metadata_desc} from the database. These are the exact \
             results the user asked for — present them confidently with full citations. \
             Do NOT say the sources are insufficient; the metadata lookup already \
             answered the question."
        ),
        QueryType::Counting => format!(
            "This is a counting query. Exactly {total_sources} relevant sources have been \
             found and provided below. Report this exact number — do NOT recount \
             manually. Present the answer and list the sources."
        ),
        QueryType::Listing => format!(
            "Exactly {total_sources} relevant sources have been found and provided below. \
             List every single one systematically with full citations."
        ),
        QueryType::Semantic => format!(
            "This is a semantic search query. {total_sources} relevant sources have been \
             retrieved from the Quran and Hadith collections. Synthesize a comprehensive \
             answer drawing on ALL provided sources. Focus on what the sources contain. \
             If some aspect of the question is not covered, mention it briefly at the \
             end — do NOT lead with gaps or caveats, and do NOT list out every possible \
             missing detail."
        ),
    }
}

/// Source reference line for a hit, shared by formatting and citations
pub fn source_heading(payload: &ChunkPayload) -> String {
    match payload {
        ChunkPayload::Ayah(p) => format!(
            "Quran, Surah {} ({}:{})",
            p.surah_name_english, p.surah_number, p.ayah_number
        ),
        ChunkPayload::Hadith(p) => {
            format!("{}, Hadith {}", p.book_title, hadith_number(payload))
        }
        ChunkPayload::Tafsir(p) => match (p.surah_number, &p.surah_name_english) {
            (Some(surah), Some(name)) if !name.is_empty() => format!(
                "{}, Surah {} ({}:{})",
                p.book_title,
                name,
                surah,
                p.ayah_number.unwrap_or(0)
            ),
            (Some(surah), _) => {
                format!("{} ({}:{})", p.book_title, surah, p.ayah_number.unwrap_or(0))
            }
            _ => p.book_title.clone(),
        },
        ChunkPayload::Passage(p) => match p.page_number {
            Some(page) => format!("{}, p. {}", p.book_title, page),
            None => p.book_title.clone(),
        },
    }
}

/// Hadith number from the payload field, falling back to free-form
/// metadata
pub fn hadith_number(payload: &ChunkPayload) -> String {
    if let ChunkPayload::Hadith(p) = payload {
        if let Some(num) = &p.hadith_number {
            return num.clone();
        }
        if let Some(meta) = &p.metadata {
            if let Some(num) = meta.get("hadith_number") {
                return match num.as_str() {
                    Some(s) => s.to_string(),
                    None => num.to_string(),
                };
            }
        }
    }
    String::new()
}

fn format_source(hit: &SearchHit, index: usize, mode: RenderMode) -> String {
    let mut parts = vec![format!("[Source {index}]"), source_heading(&hit.payload)];

    let arabic = hit.payload.content_arabic();
    let english = hit.payload.content_english();
    if mode == RenderMode::Bilingual && !arabic.is_empty() {
        parts.push(format!("Arabic: {arabic}"));
    }
    if !english.is_empty() {
        parts.push(format!("English: {english}"));
    }
    parts.join("\n")
}

fn format_passage(group: &[SearchHit], index: usize, mode: RenderMode) -> String {
    let (first_surah, first_ayah) = group[0].payload.canonical_key();
    let (_, last_ayah) = group[group.len() - 1].payload.canonical_key();
    let surah_name = match &group[0].payload {
        ChunkPayload::Ayah(p) => p.surah_name_english.as_str(),
        _ => "",
    };

    let reference = if first_ayah == last_ayah {
        format!("{first_surah}:{first_ayah}")
    } else {
        format!("{first_surah}:{first_ayah}-{last_ayah}")
    };

    let mut parts = vec![
        format!("[Source {index}]"),
        format!("Quran, Surah {surah_name} ({reference})"),
    ];

    for hit in group {
        let (surah, ayah) = hit.payload.canonical_key();
        parts.push(format!("  {surah}:{ayah}"));
        let arabic = hit.payload.content_arabic();
        let english = hit.payload.content_english();
        if mode == RenderMode::Bilingual && !arabic.is_empty() {
            parts.push(format!("  Arabic: {arabic}"));
        }
        if !english.is_empty() {
            parts.push(format!("  English: {english}"));
        }
    }
    parts.join("\n")
}
