//! SQL Mutations - String-level transforms for SQL payloads
//!
//! Provides the primitive transforms behind each mutation operator plus the
//! side-effect transforms (noise, hex obfuscation) used while building chains.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;

use super::dictionary::{Dictionary, TokenCategory};
use super::TransformError;

/// String-level SQL mutation operations
pub struct SqlMutator {
    dictionary: Dictionary,
    /// Word-bounded, case-insensitive keyword matcher
    keyword_pattern: Option<Regex>,
    /// Alphabet for random noise blocks
    noise_alphabet: Vec<char>,
}

impl Default for SqlMutator {
    fn default() -> Self {
        Self::new(Dictionary::sql_default())
    }
}

impl SqlMutator {
    /// Create a mutator over the given dictionary
    pub fn new(dictionary: Dictionary) -> Self {
        let keyword_pattern = dictionary
            .tokens_in(TokenCategory::SqlKeyword)
            .filter(|words| !words.is_empty())
            .and_then(|words| {
                let alternation = words
                    .iter()
                    .map(|w| regex::escape(w))
                    .collect::<Vec<_>>()
                    .join("|");
                Regex::new(&format!(r"(?i)\b({})\b", alternation)).ok()
            });

        Self {
            dictionary,
            keyword_pattern,
            noise_alphabet: noise_alphabet(),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Flip each character to upper or lower case at random
    pub fn random_case(&self, s: &str, rng: &mut impl Rng) -> Result<String, TransformError> {
        if s.is_empty() {
            return Err(TransformError::EmptyInput);
        }

        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if rng.gen_bool(0.5) {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
        }
        Ok(out)
    }

    /// Replace every mappable letter with a lookalike from another script
    pub fn homoglyph(&self, s: &str, rng: &mut impl Rng) -> Result<String, TransformError> {
        if s.is_empty() {
            return Err(TransformError::EmptyInput);
        }
        if !s.chars().any(|c| self.dictionary.homoglyphs_for(c).is_some()) {
            return Err(TransformError::NoCandidates);
        }

        Ok(s.chars()
            .map(|c| self.dictionary.random_homoglyph(c, rng).unwrap_or(c))
            .collect())
    }

    /// Insert invisible characters after roughly half of the letters
    pub fn zero_width(&self, s: &str, rng: &mut impl Rng) -> Result<String, TransformError> {
        if !s.chars().any(char::is_alphabetic) {
            return Err(TransformError::NoCandidates);
        }

        let mut out = String::with_capacity(s.len() * 2);
        for c in s.chars() {
            out.push(c);
            if c.is_alphabetic() && rng.gen_bool(0.5) {
                if let Some(zw) = self.dictionary.random_from(TokenCategory::ZeroWidth, rng) {
                    out.push_str(zw);
                }
            }
        }
        Ok(out)
    }

    pub fn reverse(&self, s: &str) -> Result<String, TransformError> {
        if s.is_empty() {
            return Err(TransformError::EmptyInput);
        }
        Ok(s.chars().rev().collect())
    }

    /// Split SQL keywords with an inline comment at a random interior point
    pub fn keyword_split(&self, s: &str, rng: &mut impl Rng) -> Result<String, TransformError> {
        let pattern = self
            .keyword_pattern
            .as_ref()
            .ok_or(TransformError::NoKeywords)?;
        if !pattern.is_match(s) {
            return Err(TransformError::NoKeywords);
        }

        let result = pattern.replace_all(s, |caps: &regex::Captures<'_>| {
            let word: Vec<char> = caps[0].chars().collect();
            if word.len() < 2 {
                return word.iter().collect::<String>();
            }
            let split = rng.gen_range(1..word.len());
            let head: String = word[..split].iter().collect();
            let tail: String = word[split..].iter().collect();
            format!("{}/**/{}", head, tail)
        });

        Ok(result.into_owned())
    }

    /// Insert one junk token at a random position
    pub fn junk_injection(&self, s: &str, rng: &mut impl Rng) -> Result<String, TransformError> {
        let junk = self
            .dictionary
            .random_from(TokenCategory::WafJunk, rng)
            .unwrap_or("/**/");

        let chars: Vec<char> = s.chars().collect();
        let pos = rng.gen_range(0..=chars.len());
        let mut out: String = chars[..pos].iter().collect();
        out.push_str(junk);
        out.extend(&chars[pos..]);
        Ok(out)
    }

    /// Wrap the payload in a logically transparent SQL expression
    pub fn logic_wrap(&self, s: &str, rng: &mut impl Rng) -> String {
        match rng.gen_range(0..5) {
            0 => format!("IF(1=1,({}),NULL)", s),
            1 => format!("CASE WHEN 1=1 THEN ({}) ELSE NULL END", s),
            2 => format!("IFNULL(NULL,({}))", s),
            3 => format!("COALESCE(NULL,({}))", s),
            _ => format!("CONCAT(CHAR(115,101,108),({}))", s),
        }
    }

    /// Base64 the payload, then percent-escape every base64 character
    pub fn base64_percent(&self, s: &str) -> String {
        BASE64
            .encode(s.as_bytes())
            .bytes()
            .map(|b| format!("%{:02x}", b))
            .collect()
    }

    /// Block of printable and control characters
    pub fn noise(&self, len: usize, rng: &mut impl Rng) -> String {
        (0..len)
            .map(|_| self.noise_alphabet[rng.gen_range(0..self.noise_alphabet.len())])
            .collect()
    }

    /// Hex-encode each code point, then regroup the digits into `CHAR(0x..)`
    /// chunks of 2 to 6 digits joined by `CONCAT`
    pub fn hex_obfuscate(&self, s: &str, rng: &mut impl Rng) -> String {
        let hexed: String = s.chars().map(|c| format!("{:02x}", c as u32)).collect();
        let bytes = hexed.as_bytes();

        let mut parts = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let end = (i + rng.gen_range(2..=6)).min(bytes.len());
            parts.push(format!("CHAR(0x{})", &hexed[i..end]));
            i = end;
        }

        format!("CONCAT({})", parts.join(","))
    }
}

fn noise_alphabet() -> Vec<char> {
    let mut chars: Vec<char> = ('0'..='9').chain('a'..='z').chain('A'..='Z').collect();
    chars.extend("!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~".chars());
    chars.extend([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    chars.extend((0u32..32).filter_map(char::from_u32));
    chars.extend((127u32..160).filter_map(char::from_u32));
    chars
}

/// Shannon entropy of a string in bits per character
pub fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let len = total as f64;
    -counts
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            p * p.log2()
        })
        .sum::<f64>()
}
