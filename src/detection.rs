//! Response Detection - Classify target responses by signature
//!
//! Case-insensitive substring matching against static word lists, used to
//! spot a filtering proxy and guess the backing database.

use serde::{Deserialize, Serialize};

const WAF_SIGNATURES: &[&str] = &[
    "403",
    "mod_security",
    "access denied",
    "blocked",
    "waf",
    "cloudflare",
    "intrusion prevention",
    "sqlmap detected",
    "forbidden",
    "captcha",
    "challenge",
    "bot detected",
];

const DBMS_SIGNATURES: &[(Dbms, &[&str])] = &[
    (
        Dbms::Mysql,
        &[
            "mysql",
            "syntax error",
            "unknown column",
            "you have an error in your sql syntax",
        ],
    ),
    (
        Dbms::Pgsql,
        &["postgresql", "pg_", "sqlstate", "syntax error at or near"],
    ),
    (
        Dbms::Mssql,
        &[
            "sql server",
            "unclosed quotation mark",
            "microsoft",
            "incorrect syntax near",
        ],
    ),
    (
        Dbms::Oracle,
        &["ora-", "oracle error", "plsql", "error at line"],
    ),
];

/// Database engine guessed from error text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dbms {
    #[default]
    Unknown,
    Mysql,
    Pgsql,
    Mssql,
    Oracle,
}

impl Dbms {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Mysql => "mysql",
            Self::Pgsql => "pgsql",
            Self::Mssql => "mssql",
            Self::Oracle => "oracle",
        }
    }
}

impl std::fmt::Display for Dbms {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a response text revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseSignals {
    pub waf_detected: bool,
    pub dbms: Dbms,
}

/// Signature-based response classifier
pub struct ResponseClassifier;

impl ResponseClassifier {
    /// Classify a response body. When several database lists match, the
    /// last one in declaration order wins.
    pub fn classify(response: &str) -> ResponseSignals {
        let lower = response.to_lowercase();

        let waf_detected = WAF_SIGNATURES.iter().any(|sig| lower.contains(sig));
        let dbms = DBMS_SIGNATURES
            .iter()
            .filter(|(_, sigs)| sigs.iter().any(|sig| lower.contains(sig)))
            .map(|(dbms, _)| *dbms)
            .last()
            .unwrap_or_default();

        ResponseSignals { waf_detected, dbms }
    }
}
