//! Core domain types shared across the pipeline
//!
//! The vector store payload is a closed tagged union (`ChunkPayload`) with
//! one variant per chunk category. This replaces stringly-typed payload
//! lookups with compile-time coverage of category-specific logic.

use serde::{Deserialize, Serialize};

/// Payload for a Quran ayah chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AyahPayload {
    pub surah_number: u32,
    pub ayah_number: u32,
    #[serde(default)]
    pub surah_name_english: String,
    #[serde(default)]
    pub juz: Option<u32>,
    /// Ruku (section) number — globally unique across the corpus
    #[serde(default)]
    pub ruku: Option<u32>,
    #[serde(default)]
    pub content_arabic: String,
    #[serde(default)]
    pub content_english: String,
}

/// Payload for a hadith narration chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HadithPayload {
    pub book_title: String,
    #[serde(default)]
    pub hadith_number: Option<String>,
    #[serde(default)]
    pub content_arabic: String,
    #[serde(default)]
    pub content_english: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Payload for a tafsir (commentary) chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TafsirPayload {
    pub book_title: String,
    #[serde(default)]
    pub surah_number: Option<u32>,
    #[serde(default)]
    pub ayah_number: Option<u32>,
    #[serde(default)]
    pub surah_name_english: Option<String>,
    #[serde(default)]
    pub content_arabic: String,
    #[serde(default)]
    pub content_english: String,
}

/// Payload for a generic book passage chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassagePayload {
    pub book_title: String,
    #[serde(default)]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub content_arabic: String,
    #[serde(default)]
    pub content_english: String,
}

/// Tagged-union payload, one variant per chunk category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chunk_type", rename_all = "snake_case")]
pub enum ChunkPayload {
    Ayah(AyahPayload),
    Hadith(HadithPayload),
    Tafsir(TafsirPayload),
    Passage(PassagePayload),
}

impl ChunkPayload {
    /// The wire-level chunk_type string for this variant
    pub fn type_name(&self) -> &'static str {
        match self {
            ChunkPayload::Ayah(_) => "ayah",
            ChunkPayload::Hadith(_) => "hadith",
            ChunkPayload::Tafsir(_) => "tafsir",
            ChunkPayload::Passage(_) => "paragraph",
        }
    }

    /// The corpus category this chunk belongs to (used in store filters)
    pub fn category(&self) -> &'static str {
        match self {
            ChunkPayload::Ayah(_) => "quran",
            ChunkPayload::Hadith(_) => "hadith",
            ChunkPayload::Tafsir(_) => "tafsir",
            ChunkPayload::Passage(_) => "general",
        }
    }

    pub fn content_arabic(&self) -> &str {
        match self {
            ChunkPayload::Ayah(p) => &p.content_arabic,
            ChunkPayload::Hadith(p) => &p.content_arabic,
            ChunkPayload::Tafsir(p) => &p.content_arabic,
            ChunkPayload::Passage(p) => &p.content_arabic,
        }
    }

    pub fn content_english(&self) -> &str {
        match self {
            ChunkPayload::Ayah(p) => &p.content_english,
            ChunkPayload::Hadith(p) => &p.content_english,
            ChunkPayload::Tafsir(p) => &p.content_english,
            ChunkPayload::Passage(p) => &p.content_english,
        }
    }

    /// Ruku number, for ayah chunks that carry one
    pub fn ruku(&self) -> Option<u32> {
        match self {
            ChunkPayload::Ayah(p) => p.ruku,
            _ => None,
        }
    }

    /// Canonical corpus ordering key: (surah, ayah), zero for chunks
    /// without structural locators
    pub fn canonical_key(&self) -> (u32, u32) {
        match self {
            ChunkPayload::Ayah(p) => (p.surah_number, p.ayah_number),
            ChunkPayload::Tafsir(p) => (p.surah_number.unwrap_or(0), p.ayah_number.unwrap_or(0)),
            _ => (0, 0),
        }
    }
}

/// A single search result from the vector store
///
/// Hits are immutable value objects; `id` is stable across the corpus.
/// Scores are comparable within one retrieval pass (higher = more
/// relevant).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Conjunctive filter over structural identifiers and category.
/// All present fields must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub category: Option<String>,
    pub surah_number: Option<u32>,
    pub ayah_number: Option<u32>,
    pub juz: Option<u32>,
    pub ruku: Option<u32>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.surah_number.is_none()
            && self.ayah_number.is_none()
            && self.juz.is_none()
            && self.ruku.is_none()
    }

    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Check a payload against this filter
    pub fn matches(&self, payload: &ChunkPayload) -> bool {
        if let Some(cat) = &self.category {
            if payload.category() != cat {
                return false;
            }
        }
        if let Some(ruku) = self.ruku {
            if payload.ruku() != Some(ruku) {
                return false;
            }
        }
        let (surah, ayah) = payload.canonical_key();
        if let Some(want) = self.surah_number {
            if surah != want {
                return false;
            }
        }
        if let Some(want) = self.ayah_number {
            if ayah != want {
                return false;
            }
        }
        if let Some(want) = self.juz {
            let juz = match payload {
                ChunkPayload::Ayah(p) => p.juz,
                _ => None,
            };
            if juz != Some(want) {
                return false;
            }
        }
        true
    }
}

/// Citation returned to the caller alongside the generated answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub text_arabic: Option<String>,
    #[serde(default)]
    pub text_english: Option<String>,
    pub source: String,
    pub chunk_type: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub auto_translated: bool,
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ayah(surah: u32, ayah_num: u32, ruku: Option<u32>) -> ChunkPayload {
        ChunkPayload::Ayah(AyahPayload {
            surah_number: surah,
            ayah_number: ayah_num,
            surah_name_english: "Al-Baqara".to_string(),
            juz: Some(3),
            ruku,
            content_arabic: "نص".to_string(),
            content_english: "text".to_string(),
        })
    }

    #[test]
    fn test_payload_tag_roundtrip() {
        let payload = ayah(2, 255, Some(40));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["chunk_type"], "ayah");
        assert_eq!(json["surah_number"], 2);

        let back: ChunkPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_filter_matches_conjunctively() {
        let payload = ayah(2, 255, Some(40));
        let filter = SearchFilter {
            surah_number: Some(2),
            ayah_number: Some(255),
            ..Default::default()
        };
        assert!(filter.matches(&payload));

        let wrong_ayah = SearchFilter {
            surah_number: Some(2),
            ayah_number: Some(1),
            ..Default::default()
        };
        assert!(!wrong_ayah.matches(&payload));
    }

    #[test]
    fn test_filter_category() {
        let payload = ayah(2, 255, None);
        assert!(SearchFilter::category("quran").matches(&payload));
        assert!(!SearchFilter::category("hadith").matches(&payload));
    }

    #[test]
    fn test_canonical_key_defaults_zero() {
        let hadith = ChunkPayload::Hadith(HadithPayload {
            book_title: "Sahih Bukhari".to_string(),
            hadith_number: Some("1".to_string()),
            content_arabic: String::new(),
            content_english: String::new(),
            metadata: None,
        });
        assert_eq!(hadith.canonical_key(), (0, 0));
    }
}
