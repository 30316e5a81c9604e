//! Dictionary - Token tables for SQL payload mutations
//!
//! Holds the zero-width characters, homoglyph substitutions, SQL keywords
//! and filter-confusing junk tokens that the mutation operators draw from.

use rand::Rng;
use std::collections::HashMap;

/// Token tables used by the mutation operators
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    categories: HashMap<TokenCategory, Vec<String>>,
    homoglyphs: HashMap<char, Vec<char>>,
}

/// Category of dictionary tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    /// Invisible formatting characters
    ZeroWidth,
    /// SQL keywords that keyword-splitting targets
    SqlKeyword,
    /// Comment and version-comment fragments that confuse filters
    WafJunk,
}

impl Dictionary {
    /// Create a new empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the default SQL dictionary
    pub fn sql_default() -> Self {
        let mut dict = Self::new();

        dict.add_tokens(
            TokenCategory::ZeroWidth,
            vec![
                "\u{200B}", // Zero-width space
                "\u{200C}", // Zero-width non-joiner
                "\u{200D}", // Zero-width joiner
                "\u{FEFF}", // BOM
                "\u{2060}", // Word joiner
                "\u{180E}", // Mongolian vowel separator
                "\u{2061}", // Function application
                "\u{2062}", // Invisible times
                "\u{2063}", // Invisible separator
                "\u{034F}", // Combining grapheme joiner
                "\u{061C}", // Arabic letter mark
            ],
        );

        dict.add_tokens(
            TokenCategory::SqlKeyword,
            vec![
                "select", "from", "where", "union", "insert", "update", "delete", "sleep", "if",
                "case", "and", "or", "xor", "having", "waitfor", "delay",
            ],
        );

        dict.add_tokens(
            TokenCategory::WafJunk,
            vec![
                "/*!00000SELECT*/",
                "--fake--",
                "#",
                "0x00",
                "XOR",
                "/*!UNION*/",
                "/*!SLEEP*/",
                "--X--",
            ],
        );

        // Cyrillic, Greek and mathematical alphanumeric lookalikes
        dict.add_homoglyphs('a', &['\u{0430}', '\u{03B1}', '\u{1D5EE}', '\u{1D4B6}']);
        dict.add_homoglyphs('e', &['\u{0435}', '\u{04BD}', '\u{1D68E}', '\u{1D6C6}']);
        dict.add_homoglyphs('i', &['\u{0456}', '\u{1D692}', '\u{1D704}']);
        dict.add_homoglyphs('o', &['\u{03BF}', '\u{1D6DA}', '\u{1D698}']);
        dict.add_homoglyphs('s', &['\u{0455}', '\u{1D69C}']);
        dict.add_homoglyphs('c', &['\u{0441}', '\u{1D68C}']);
        dict.add_homoglyphs('t', &['\u{0442}', '\u{1D69D}']);
        dict.add_homoglyphs('d', &['\u{0501}']);
        dict.add_homoglyphs('b', &['\u{042C}']);
        dict.add_homoglyphs('l', &['\u{217C}']);
        dict.add_homoglyphs('m', &['\u{043C}']);
        dict.add_homoglyphs('n', &['\u{043F}']);
        dict.add_homoglyphs('r', &['\u{0433}']);
        dict.add_homoglyphs('u', &['\u{03C5}']);
        dict.add_homoglyphs('y', &['\u{0443}']);
        dict.add_homoglyphs('h', &['\u{04BB}']);

        dict
    }

    /// Add tokens to a category
    pub fn add_tokens(&mut self, category: TokenCategory, tokens: Vec<&str>) {
        let entry = self.categories.entry(category).or_default();
        entry.extend(tokens.into_iter().map(str::to_string));
    }

    /// Register lookalike replacements for a lowercase letter
    pub fn add_homoglyphs(&mut self, letter: char, lookalikes: &[char]) {
        self.homoglyphs
            .entry(letter)
            .or_default()
            .extend_from_slice(lookalikes);
    }

    /// Get random token from a specific category
    pub fn random_from(&self, category: TokenCategory, rng: &mut impl Rng) -> Option<&str> {
        let tokens = self.categories.get(&category)?;
        if tokens.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..tokens.len());
        Some(&tokens[idx])
    }

    /// Get all tokens in a category
    pub fn tokens_in(&self, category: TokenCategory) -> Option<&[String]> {
        self.categories.get(&category).map(|v| v.as_slice())
    }

    /// Lookalikes registered for a character (case-insensitive)
    pub fn homoglyphs_for(&self, c: char) -> Option<&[char]> {
        let lower = c.to_lowercase().next().unwrap_or(c);
        self.homoglyphs
            .get(&lower)
            .map(|v| v.as_slice())
            .filter(|v| !v.is_empty())
    }

    /// Pick a random lookalike for a character
    pub fn random_homoglyph(&self, c: char, rng: &mut impl Rng) -> Option<char> {
        let options = self.homoglyphs_for(c)?;
        Some(options[rng.gen_range(0..options.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn default_dictionary() {
        let dict = Dictionary::sql_default();
        assert_eq!(dict.tokens_in(TokenCategory::ZeroWidth).unwrap().len(), 11);
        assert!(dict
            .tokens_in(TokenCategory::SqlKeyword)
            .unwrap()
            .contains(&"union".to_string()));
    }

    #[test]
    fn homoglyph_lookup_ignores_case() {
        let dict = Dictionary::sql_default();
        assert!(dict.homoglyphs_for('A').is_some());
        assert!(dict.homoglyphs_for('a').is_some());
        assert!(dict.homoglyphs_for('z').is_none());
        assert!(dict.homoglyphs_for('*').is_none());
    }

    #[test]
    fn random_homoglyph_differs_from_source() {
        let dict = Dictionary::sql_default();
        let mut rng = SmallRng::seed_from_u64(7);

        for _ in 0..20 {
            let glyph = dict.random_homoglyph('e', &mut rng).unwrap();
            assert_ne!(glyph, 'e');
        }
    }

    #[test]
    fn empty_category() {
        let dict = Dictionary::new();
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(dict.random_from(TokenCategory::WafJunk, &mut rng).is_none());
    }
}
