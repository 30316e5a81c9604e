//! Injection Context - Classify the original payload and wrap the output
//!
//! The context is decided from the payload as the caller supplied it, before
//! any mutation, and only affects the final envelope.

use serde::{Deserialize, Serialize};

use crate::codec::quote_plus;

/// Where the payload is headed, inferred from its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadContext {
    /// GraphQL query or object literal
    Graphql,
    /// `key=value&key=value` form parameters
    Param,
    /// Bare integer
    Int,
    /// Quoted string
    String,
    /// Anything else
    Generic,
}

impl PayloadContext {
    /// First matching bucket wins, checked in declaration order
    pub fn detect(payload: &str) -> Self {
        if payload.contains("query=") || payload.contains('{') {
            Self::Graphql
        } else if payload.contains('=') && payload.contains('&') {
            Self::Param
        } else if !payload.is_empty() && payload.chars().all(|c| c.is_ascii_digit()) {
            Self::Int
        } else if payload.contains('\'') || payload.contains('"') {
            Self::String
        } else {
            Self::Generic
        }
    }

    /// Wrap an encoded payload for this context
    pub fn wrap(&self, encoded: &str) -> String {
        match self {
            Self::Graphql => serde_json::json!({
                "query": format!("{{user(input:\"{}\"){{id}}}}", encoded)
            })
            .to_string(),
            Self::Param => quote_plus(encoded),
            Self::Int | Self::String | Self::Generic => encoded.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Graphql => "graphql",
            Self::Param => "param",
            Self::Int => "int",
            Self::String => "string",
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for PayloadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
