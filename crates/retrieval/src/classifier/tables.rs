//! Static lookup tables for structural query classification
//!
//! Loaded once as process-wide constants and never mutated. Alias slices
//! are iterated in declared order so matching is deterministic.

/// Surah name variants mapped to surah numbers, covering all 114 surahs.
/// Entries are lowercase; English/transliteration variants are matched
/// with word boundaries, Arabic variants by substring.
pub static SURAH_ALIASES: &[(&str, u32)] = &[
    // 1. Al-Fatiha
    ("fatiha", 1), ("al-fatiha", 1), ("al fatiha", 1), ("الفاتحة", 1),
    // 2. Al-Baqara
    ("baqara", 2), ("baqarah", 2), ("al-baqara", 2), ("al-baqarah", 2), ("al baqara", 2), ("البقرة", 2),
    // 3. Aal-E-Imran
    ("imran", 3), ("aal-e-imran", 3), ("al-imran", 3), ("ali imran", 3), ("آل عمران", 3),
    // 4. An-Nisa
    ("nisa", 4), ("an-nisa", 4), ("al-nisa", 4), ("النساء", 4),
    // 5. Al-Ma'ida
    ("maida", 5), ("maidah", 5), ("al-maida", 5), ("al-maidah", 5), ("المائدة", 5),
    // 6. Al-An'am
    ("anam", 6), ("al-anam", 6), ("الأنعام", 6),
    // 7. Al-A'raf
    ("araf", 7), ("al-araf", 7), ("الأعراف", 7),
    // 8. Al-Anfal
    ("anfal", 8), ("al-anfal", 8), ("الأنفال", 8),
    // 9. At-Tawba
    ("tawba", 9), ("tawbah", 9), ("at-tawba", 9), ("at-tawbah", 9), ("التوبة", 9),
    // 10. Yunus
    ("yunus", 10), ("يونس", 10),
    // 11. Hud
    ("هود", 11),
    // 12. Yusuf
    ("yusuf", 12), ("يوسف", 12),
    // 13. Ar-Ra'd
    ("rad", 13), ("ar-rad", 13), ("الرعد", 13),
    // 14. Ibrahim
    ("ibrahim", 14), ("إبراهيم", 14),
    // 15. Al-Hijr
    ("hijr", 15), ("al-hijr", 15), ("الحجر", 15),
    // 16. An-Nahl
    ("nahl", 16), ("an-nahl", 16), ("النحل", 16),
    // 17. Al-Isra
    ("isra", 17), ("al-isra", 17), ("الإسراء", 17), ("bani israel", 17),
    // 18. Al-Kahf
    ("kahf", 18), ("al-kahf", 18), ("الكهف", 18),
    // 19. Maryam
    ("maryam", 19), ("مريم", 19),
    // 20. Ta-Ha
    ("taha", 20), ("ta-ha", 20), ("طه", 20),
    // 21. Al-Anbiya
    ("anbiya", 21), ("al-anbiya", 21), ("الأنبياء", 21),
    // 22. Al-Hajj
    ("hajj", 22), ("al-hajj", 22), ("الحج", 22),
    // 23. Al-Mu'minun
    ("muminun", 23), ("al-muminun", 23), ("المؤمنون", 23), ("muminoon", 23),
    // 24. An-Nur
    ("nur", 24), ("an-nur", 24), ("noor", 24), ("النور", 24),
    // 25. Al-Furqan
    ("furqan", 25), ("al-furqan", 25), ("الفرقان", 25),
    // 26. Ash-Shu'ara
    ("shuara", 26), ("ash-shuara", 26), ("الشعراء", 26),
    // 27. An-Naml
    ("naml", 27), ("an-naml", 27), ("النمل", 27),
    // 28. Al-Qasas
    ("qasas", 28), ("al-qasas", 28), ("القصص", 28),
    // 29. Al-Ankabut
    ("ankabut", 29), ("al-ankabut", 29), ("العنكبوت", 29),
    // 30. Ar-Rum
    ("rum", 30), ("ar-rum", 30), ("الروم", 30),
    // 31. Luqman
    ("luqman", 31), ("لقمان", 31),
    // 32. As-Sajda
    ("sajda", 32), ("as-sajda", 32), ("sajdah", 32), ("السجدة", 32),
    // 33. Al-Ahzab
    ("ahzab", 33), ("al-ahzab", 33), ("الأحزاب", 33),
    // 34. Saba
    ("saba", 34), ("سبأ", 34),
    // 35. Fatir
    ("fatir", 35), ("فاطر", 35),
    // 36. Ya-Sin
    ("yasin", 36), ("ya-sin", 36), ("يس", 36), ("yaseen", 36),
    // 37. As-Saffat
    ("saffat", 37), ("as-saffat", 37), ("الصافات", 37),
    // 38. Sad
    ("ص", 38),
    // 39. Az-Zumar
    ("zumar", 39), ("az-zumar", 39), ("الزمر", 39),
    // 40. Ghafir
    ("ghafir", 40), ("غافر", 40), ("al-mumin", 40),
    // 41. Fussilat
    ("fussilat", 41), ("فصلت", 41), ("ha-mim sajdah", 41),
    // 42. Ash-Shura
    ("shura", 42), ("ash-shura", 42), ("الشورى", 42),
    // 43. Az-Zukhruf
    ("zukhruf", 43), ("az-zukhruf", 43), ("الزخرف", 43),
    // 44. Ad-Dukhan
    ("dukhan", 44), ("ad-dukhan", 44), ("الدخان", 44),
    // 45. Al-Jathiya
    ("jathiya", 45), ("al-jathiya", 45), ("الجاثية", 45), ("jathiyah", 45),
    // 46. Al-Ahqaf
    ("ahqaf", 46), ("al-ahqaf", 46), ("الأحقاف", 46),
    // 47. Muhammad
    ("محمد", 47),
    // 48. Al-Fath
    ("fath", 48), ("al-fath", 48), ("الفتح", 48),
    // 49. Al-Hujurat
    ("hujurat", 49), ("al-hujurat", 49), ("الحجرات", 49),
    // 50. Qaf
    ("qaf", 50), ("ق", 50),
    // 51. Adh-Dhariyat
    ("dhariyat", 51), ("adh-dhariyat", 51), ("الذاريات", 51),
    // 52. At-Tur
    ("tur", 52), ("at-tur", 52), ("الطور", 52),
    // 53. An-Najm
    ("najm", 53), ("an-najm", 53), ("النجم", 53),
    // 54. Al-Qamar
    ("qamar", 54), ("al-qamar", 54), ("القمر", 54),
    // 55. Ar-Rahman
    ("rahman", 55), ("ar-rahman", 55), ("الرحمن", 55),
    // 56. Al-Waqi'a
    ("waqia", 56), ("al-waqia", 56), ("waqiah", 56), ("الواقعة", 56),
    // 57. Al-Hadid
    ("hadid", 57), ("al-hadid", 57), ("الحديد", 57),
    // 58. Al-Mujadila
    ("mujadila", 58), ("al-mujadila", 58), ("المجادلة", 58), ("mujadilah", 58),
    // 59. Al-Hashr
    ("hashr", 59), ("al-hashr", 59), ("الحشر", 59),
    // 60. Al-Mumtahina
    ("mumtahina", 60), ("al-mumtahina", 60), ("الممتحنة", 60), ("mumtahinah", 60),
    // 61. As-Saff
    ("saff", 61), ("as-saff", 61), ("الصف", 61),
    // 62. Al-Jumu'a
    ("jumua", 62), ("al-jumua", 62), ("jumuah", 62), ("الجمعة", 62),
    // 63. Al-Munafiqun
    ("munafiqun", 63), ("al-munafiqun", 63), ("المنافقون", 63), ("munafiqoon", 63),
    // 64. At-Taghabun
    ("taghabun", 64), ("at-taghabun", 64), ("التغابن", 64),
    // 65. At-Talaq
    ("talaq", 65), ("at-talaq", 65), ("الطلاق", 65),
    // 66. At-Tahrim
    ("tahrim", 66), ("at-tahrim", 66), ("التحريم", 66),
    // 67. Al-Mulk
    ("mulk", 67), ("al-mulk", 67), ("الملك", 67),
    // 68. Al-Qalam
    ("qalam", 68), ("al-qalam", 68), ("القلم", 68),
    // 69. Al-Haaqqa
    ("haaqqa", 69), ("al-haaqqa", 69), ("الحاقة", 69), ("haqqa", 69),
    // 70. Al-Ma'arij
    ("maarij", 70), ("al-maarij", 70), ("المعارج", 70),
    // 71. Nuh
    ("nuh", 71), ("نوح", 71),
    // 72. Al-Jinn
    ("jinn", 72), ("al-jinn", 72), ("الجن", 72),
    // 73. Al-Muzzammil
    ("muzzammil", 73), ("al-muzzammil", 73), ("المزمل", 73),
    // 74. Al-Muddaththir
    ("muddaththir", 74), ("al-muddaththir", 74), ("المدثر", 74), ("muddathir", 74),
    // 75. Al-Qiyama
    ("qiyama", 75), ("al-qiyama", 75), ("القيامة", 75), ("qiyamah", 75),
    // 76. Al-Insan
    ("insan", 76), ("al-insan", 76), ("الإنسان", 76), ("ad-dahr", 76),
    // 77. Al-Mursalat
    ("mursalat", 77), ("al-mursalat", 77), ("المرسلات", 77),
    // 78. An-Naba
    ("naba", 78), ("an-naba", 78), ("النبأ", 78),
    // 79. An-Nazi'at
    ("naziat", 79), ("an-naziat", 79), ("النازعات", 79),
    // 80. Abasa
    ("abasa", 80), ("عبس", 80),
    // 81. At-Takwir
    ("takwir", 81), ("at-takwir", 81), ("التكوير", 81),
    // 82. Al-Infitar
    ("infitar", 82), ("al-infitar", 82), ("الانفطار", 82),
    // 83. Al-Mutaffifin
    ("mutaffifin", 83), ("al-mutaffifin", 83), ("المطففين", 83),
    // 84. Al-Inshiqaq
    ("inshiqaq", 84), ("al-inshiqaq", 84), ("الانشقاق", 84),
    // 85. Al-Buruj
    ("buruj", 85), ("al-buruj", 85), ("البروج", 85),
    // 86. At-Tariq
    ("tariq", 86), ("at-tariq", 86), ("الطارق", 86),
    // 87. Al-A'la
    ("ala", 87), ("al-ala", 87), ("الأعلى", 87),
    // 88. Al-Ghashiya
    ("ghashiya", 88), ("al-ghashiya", 88), ("الغاشية", 88), ("ghashiyah", 88),
    // 89. Al-Fajr
    ("fajr", 89), ("al-fajr", 89), ("الفجر", 89),
    // 90. Al-Balad
    ("balad", 90), ("al-balad", 90), ("البلد", 90),
    // 91. Ash-Shams
    ("shams", 91), ("ash-shams", 91), ("الشمس", 91),
    // 92. Al-Layl
    ("layl", 92), ("al-layl", 92), ("الليل", 92),
    // 93. Ad-Duha
    ("duha", 93), ("ad-duha", 93), ("الضحى", 93),
    // 94. Ash-Sharh
    ("sharh", 94), ("ash-sharh", 94), ("الشرح", 94), ("inshirah", 94), ("al-inshirah", 94),
    // 95. At-Tin
    ("tin", 95), ("at-tin", 95), ("التين", 95),
    // 96. Al-Alaq
    ("alaq", 96), ("al-alaq", 96), ("العلق", 96),
    // 97. Al-Qadr
    ("qadr", 97), ("al-qadr", 97), ("القدر", 97),
    // 98. Al-Bayyina
    ("bayyina", 98), ("al-bayyina", 98), ("البينة", 98), ("bayyinah", 98),
    // 99. Az-Zalzala
    ("zalzala", 99), ("az-zalzala", 99), ("الزلزلة", 99), ("zilzal", 99),
    // 100. Al-Adiyat
    ("adiyat", 100), ("al-adiyat", 100), ("العاديات", 100),
    // 101. Al-Qari'a
    ("qaria", 101), ("al-qaria", 101), ("القارعة", 101), ("qariah", 101),
    // 102. At-Takathur
    ("takathur", 102), ("at-takathur", 102), ("التكاثر", 102),
    // 103. Al-Asr
    ("asr", 103), ("al-asr", 103), ("العصر", 103),
    // 104. Al-Humaza
    ("humaza", 104), ("al-humaza", 104), ("الهمزة", 104), ("humazah", 104),
    // 105. Al-Fil
    ("fil", 105), ("al-fil", 105), ("الفيل", 105),
    // 106. Quraysh
    ("quraysh", 106), ("قريش", 106), ("quraish", 106),
    // 107. Al-Ma'un
    ("maun", 107), ("al-maun", 107), ("الماعون", 107),
    // 108. Al-Kawthar
    ("kawthar", 108), ("al-kawthar", 108), ("الكوثر", 108), ("kausar", 108), ("kauthar", 108),
    // 109. Al-Kafirun
    ("kafirun", 109), ("al-kafirun", 109), ("الكافرون", 109), ("kafiroon", 109),
    // 110. An-Nasr
    ("nasr", 110), ("an-nasr", 110), ("النصر", 110),
    // 111. Al-Masad
    ("masad", 111), ("al-masad", 111), ("المسد", 111), ("lahab", 111), ("al-lahab", 111),
    // 112. Al-Ikhlas
    ("ikhlas", 112), ("al-ikhlas", 112), ("الإخلاص", 112),
    // 113. Al-Falaq
    ("falaq", 113), ("al-falaq", 113), ("الفلق", 113),
    // 114. An-Nas
    ("nas", 114), ("an-nas", 114), ("الناس", 114), ("naas", 114),
];

/// Ayahs per surah, indexed by surah number minus one. Drives exact
/// `max_results` for whole-surah lookups.
pub static SURAH_AYAH_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99,
    128, 111, 110, 98, 135, 112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34,
    30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53, 89, 59, 37, 35, 38, 29,
    18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19,
    36, 25, 22, 17, 19, 26, 30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11,
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// Ayah count for a surah number, if valid
pub fn ayah_count(surah: u32) -> Option<u32> {
    if (1..=114).contains(&surah) {
        Some(SURAH_AYAH_COUNTS[(surah - 1) as usize] as u32)
    } else {
        None
    }
}

/// Factual answers for questions about the corpus's own structure
pub const SURAH_COUNT_FACT: &str = "The Quran contains exactly 114 surahs (chapters). \
The first surah is Al-Fatiha and the last is An-Nas.";

pub const AYAH_COUNT_FACT: &str =
    "The Quran contains exactly 6,236 ayahs (verses) across 114 surahs.";

pub const JUZ_COUNT_FACT: &str = "The Quran is divided into exactly 30 juz (parts).";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ayah_counts_cover_all_surahs() {
        assert_eq!(SURAH_AYAH_COUNTS.len(), 114);
        assert_eq!(ayah_count(1), Some(7));
        assert_eq!(ayah_count(2), Some(286));
        assert_eq!(ayah_count(114), Some(6));
        assert_eq!(ayah_count(0), None);
        assert_eq!(ayah_count(115), None);
    }

    #[test]
    fn test_aliases_resolve_within_range() {
        for (alias, number) in SURAH_ALIASES {
            assert!(
                (1..=114).contains(number),
                "alias {:?} maps outside 1..=114",
                alias
            );
        }
    }
}
