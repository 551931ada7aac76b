//! Unicode-aware tokenization and a lightweight suffix stemmer.
//!
//! The stemmer is intentionally crude: it only needs to let "проектов"
//! match the criterion "проекты" and "scaling" match "scale". Anything
//! smarter belongs in the LLM path.

/// Lowercase and split a transcript into alphanumeric word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Suffixes stripped by [`stem`], longest first within each language.
const SUFFIXES: &[&str] = &[
    // Russian noun/verb endings
    "иями", "ями", "ами", "иях", "ием", "ания", "ение", "ость", "ов", "ев", "ах", "ях", "ми",
    "ой", "ей", "ий", "ый", "ая", "яя", "ое", "ее", "ие", "ть", "ла", "ли", "ом", "ем", "ам",
    "а", "я", "о", "е", "и", "ы", "у", "ю", "ь",
    // English endings
    "ational", "ization", "ing", "ed", "es", "ly", "s",
];

/// Strip the longest matching suffix, keeping at least three characters
/// of stem.
pub fn stem(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    for suffix in SUFFIXES {
        let suffix_len = suffix.chars().count();
        if chars.len() >= suffix_len + 3 && word.ends_with(suffix) {
            return chars[..chars.len() - suffix_len].iter().collect();
        }
    }
    word.to_owned()
}

/// Number of characters in a transcript (not bytes — transcripts are
/// frequently Cyrillic).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_mixed_scripts() {
        let tokens = tokenize("Работал с Python 5 лет, микросервисы!");
        assert_eq!(
            tokens,
            vec!["работал", "с", "python", "5", "лет", "микросервисы"]
        );
    }

    #[test]
    fn stem_russian_plural() {
        assert_eq!(stem("проектов"), stem("проекты"));
        assert_eq!(stem("сервисами"), stem("сервисы"));
    }

    #[test]
    fn stem_english() {
        assert_eq!(stem("scaling"), "scal");
        assert_eq!(stem("deployed"), "deploy");
    }

    #[test]
    fn stem_keeps_short_words() {
        assert_eq!(stem("os"), "os");
        assert_eq!(stem("raid"), "raid");
    }
}
