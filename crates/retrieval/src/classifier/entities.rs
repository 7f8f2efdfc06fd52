//! Named-entity keyword extraction
//!
//! Maps question text to canonical search keywords through a multilingual
//! alias table (English, transliteration, Arabic). When any variant of an
//! entry matches, every variant is added so the exhaustive keyword scan
//! catches all spellings.

/// Variant lists per canonical entity; the first variant is the canonical
/// English name.
static NAMED_ENTITIES: &[&[&str]] = &[
    // Prophets
    &["jesus", "isa", "عيسى", "'isa", "eesa"],
    &["moses", "musa", "موسى", "moosa"],
    &["abraham", "ibrahim", "إبراهيم", "ibraheem"],
    &["noah", "nuh", "نوح", "nooh"],
    &["muhammad", "mohammad", "محمد", "ahmed", "أحمد"],
    &["david", "dawud", "داود", "dawood"],
    &["solomon", "sulaiman", "سليمان", "sulayman"],
    &["joseph", "yusuf", "يوسف", "yousuf"],
    &["jacob", "yaqub", "يعقوب", "yaqoob"],
    &["isaac", "ishaq", "إسحاق", "ishaaq"],
    &["ishmael", "ismail", "إسماعيل", "ismael"],
    &["adam", "آدم"],
    &["lot", "lut", "لوط"],
    &["jonah", "yunus", "يونس"],
    &["job", "ayyub", "أيوب", "ayub"],
    &["aaron", "harun", "هارون", "haroon"],
    &["john", "yahya", "يحيى"],
    &["zechariah", "zakariya", "زكريا", "zakariyya"],
    &["elijah", "ilyas", "إلياس"],
    &["elisha", "alyasa", "اليسع"],
    &["hud", "هود"],
    &["salih", "صالح", "saleh"],
    &["shuaib", "شعيب", "shoaib"],
    &["idris", "إدريس"],
    &["dhulkifl", "ذو الكفل", "zulkifl"],
    &["luqman", "لقمان"],
    &["mary", "maryam", "مريم"],
    // Key figures
    &["pharaoh", "firaun", "فرعون", "firawn"],
    &["iblis", "إبليس", "satan", "shaytan", "شيطان"],
    // Concepts
    &["prayer", "salah", "صلاة", "salat", "namaz"],
    &["paradise", "jannah", "جنة", "heaven", "garden", "gardens"],
    &["hellfire", "jahannam", "جهنم", "hell", "fire", "naar", "نار"],
    &["fasting", "sawm", "صوم", "siyam", "صيام"],
    &["charity", "zakat", "زكاة", "sadaqah", "صدقة"],
    &["pilgrimage", "hajj", "حج"],
    &["patience", "sabr", "صبر"],
    &["repentance", "tawbah", "توبة", "tawba"],
    &["mercy", "rahmah", "رحمة", "rahman", "رحمن"],
    &["justice", "adl", "عدل"],
    &["knowledge", "ilm", "علم"],
    &["jihad", "جهاد", "striving"],
    &["angels", "malaikah", "ملائكة", "angel", "malak"],
    &["resurrection", "qiyamah", "قيامة", "day of judgment"],
];

/// Extract search keywords from a question.
///
/// Substring matching, case-insensitive for Latin variants. Output is
/// deduplicated case-insensitively, preserving first-seen order.
pub fn extract_keywords(question: &str) -> Vec<String> {
    let q_lower = question.to_lowercase();
    let mut keywords: Vec<String> = Vec::new();

    for variants in NAMED_ENTITIES {
        let hit = variants
            .iter()
            .any(|v| q_lower.contains(&v.to_lowercase()) || question.contains(v));
        if hit {
            keywords.extend(variants.iter().map(|v| v.to_string()));
        }
    }

    let mut seen: Vec<String> = Vec::new();
    let mut unique: Vec<String> = Vec::new();
    for kw in keywords {
        let lower = kw.to_lowercase();
        if !seen.contains(&lower) {
            seen.push(lower);
            unique.push(kw);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_match_adds_all_variants() {
        let keywords = extract_keywords("How many times is Isa mentioned?");
        assert!(keywords.contains(&"jesus".to_string()));
        assert!(keywords.contains(&"isa".to_string()));
        assert!(keywords.contains(&"عيسى".to_string()));
    }

    #[test]
    fn test_no_entities_yields_empty() {
        assert!(extract_keywords("What is the weather like?").is_empty());
    }

    #[test]
    fn test_dedup_preserves_order() {
        // "rahman" triggers the mercy entry once even though the word
        // appears in two forms
        let keywords = extract_keywords("rahmah and rahman");
        let count = keywords.iter().filter(|k| *k == "rahman").count();
        assert_eq!(count, 1);
        assert_eq!(keywords[0], "mercy");
    }
}
