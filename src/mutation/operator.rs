//! Mutation Operators - Named transforms in the mutation registry
//!
//! Every operator has a stable snake_case name. Chains store operators,
//! callers see names, and replay resolves names back through `FromStr`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::sql::SqlMutator;
use super::{MutationError, TransformError};

/// Named string transforms available to the chain builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOperator {
    /// Randomise letter case
    RandomCase,
    /// Swap letters for lookalikes from other scripts
    Homoglyph,
    /// Sprinkle zero-width characters between letters
    ZeroWidth,
    /// Reverse the payload
    Reverse,
    /// Break SQL keywords with inline comments
    KeywordSplit,
    /// Insert a filter-confusing junk token
    JunkInjection,
    /// Wrap in a logically transparent expression
    LogicWrap,
    /// Base64 then percent-escape
    Base64Percent,
}

impl MutationOperator {
    /// Registry order
    pub fn all() -> Vec<Self> {
        vec![
            Self::RandomCase,
            Self::Homoglyph,
            Self::ZeroWidth,
            Self::Reverse,
            Self::KeywordSplit,
            Self::JunkInjection,
            Self::LogicWrap,
            Self::Base64Percent,
        ]
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomCase => "random_case",
            Self::Homoglyph => "homoglyph",
            Self::ZeroWidth => "zero_width",
            Self::Reverse => "reverse",
            Self::KeywordSplit => "keyword_split",
            Self::JunkInjection => "junk_injection",
            Self::LogicWrap => "logic_wrap",
            Self::Base64Percent => "base64_percent",
        }
    }

    /// Apply this operator to `input`
    pub fn apply(
        &self,
        mutator: &SqlMutator,
        input: &str,
        rng: &mut impl Rng,
    ) -> Result<String, TransformError> {
        match self {
            Self::RandomCase => mutator.random_case(input, rng),
            Self::Homoglyph => mutator.homoglyph(input, rng),
            Self::ZeroWidth => mutator.zero_width(input, rng),
            Self::Reverse => mutator.reverse(input),
            Self::KeywordSplit => mutator.keyword_split(input, rng),
            Self::JunkInjection => mutator.junk_injection(input, rng),
            Self::LogicWrap => Ok(mutator.logic_wrap(input, rng)),
            Self::Base64Percent => Ok(mutator.base64_percent(input)),
        }
    }
}

impl std::fmt::Display for MutationOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationOperator {
    type Err = MutationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| MutationError::UnknownOperator(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_eight_operators() {
        assert_eq!(MutationOperator::all().len(), 8);
    }

    #[test]
    fn names_resolve_back() {
        for op in MutationOperator::all() {
            assert_eq!(op.as_str().parse::<MutationOperator>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_name() {
        let err = "drop_table".parse::<MutationOperator>().unwrap_err();
        assert!(matches!(err, MutationError::UnknownOperator(name) if name == "drop_table"));
    }

    #[test]
    fn serde_uses_operator_names() {
        let json = serde_json::to_string(&MutationOperator::KeywordSplit).unwrap();
        assert_eq!(json, "\"keyword_split\"");
    }
}
